// Constants module - centralized default values for configuration
//
// Every default the proxy ships with lives here so the config layer, the
// CLI help text and the tests agree on one value.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "localhost:8080";

/// Default outbound fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Query parameter defaults
// =============================================================================

/// Default query key carrying the source image URL
pub const DEFAULT_SOURCE_PARAM: &str = "url";

/// Default query key carrying the target width
pub const DEFAULT_WIDTH_PARAM: &str = "w";

/// Default query key carrying the target height
pub const DEFAULT_HEIGHT_PARAM: &str = "h";

// =============================================================================
// Image defaults
// =============================================================================

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default canvas background (opaque white)
pub const DEFAULT_BACKGROUND: &str = "ffffff";

/// Default maximum target width
pub const DEFAULT_MAX_WIDTH: u32 = 4096;

/// Default maximum target height
pub const DEFAULT_MAX_HEIGHT: u32 = 4096;

/// Default maximum size of a fetched source body (50 MB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 50 * 1024 * 1024;

/// Default maximum decoded source pixels (100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;
