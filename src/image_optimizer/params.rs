//! Request parameter parsing and format tags
//!
//! Parses the proxy query string (`?url=https://host/pic.png&w=100&h=50`)
//! into a validated [`RequestParams`] and defines the closed sets of
//! source formats, output formats and output policies.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ParamNames;
use crate::error::ProxyError;

/// Format detected by sniffing the fetched bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    /// Decodable, but not one of the formats the proxy re-encodes
    Unsupported(String),
}

impl SourceFormat {
    pub fn from_image_format(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Jpeg => SourceFormat::Jpeg,
            image::ImageFormat::Png => SourceFormat::Png,
            image::ImageFormat::Gif => SourceFormat::Gif,
            other => SourceFormat::Unsupported(format!("{:?}", other).to_lowercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Png => "png",
            SourceFormat::Gif => "gif",
            SourceFormat::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the output format is chosen
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// Re-encode in the detected source format
    #[default]
    Mirror,
    /// Always re-encode as JPEG
    Jpeg,
}

impl OutputPolicy {
    /// Resolve the output format for a detected source format
    ///
    /// Returns `None` when the policy mirrors and the source format has no
    /// encoder.
    pub fn output_for(&self, source: &SourceFormat) -> Option<OutputFormat> {
        match self {
            OutputPolicy::Jpeg => Some(OutputFormat::Jpeg),
            OutputPolicy::Mirror => match source {
                SourceFormat::Jpeg => Some(OutputFormat::Jpeg),
                SourceFormat::Png => Some(OutputFormat::Png),
                SourceFormat::Gif => Some(OutputFormat::Gif),
                SourceFormat::Unsupported(_) => None,
            },
        }
    }
}

/// Exact canvas size requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTarget {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

/// Validated request parameters
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Absolute source URL
    pub source: Url,
    /// Target width, 0 when absent or non-numeric
    pub width: u32,
    /// Target height, 0 when absent or non-numeric
    pub height: u32,
}

impl RequestParams {
    /// Parse and validate a raw query string
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::InvalidRequest` if the source is missing, does not
    /// parse, or is not absolute, or if a dimension is negative or too large.
    pub fn from_query(query: Option<&str>, names: &ParamNames) -> Result<Self, ProxyError> {
        let params = parse_query_string(query.unwrap_or_default());

        let raw_source = params
            .get(names.source.as_str())
            .map(|s| s.trim())
            .unwrap_or_default();
        let source = parse_source_url(raw_source, &names.source)?;

        let width = parse_dimension(&names.width, params.get(names.width.as_str()))?;
        let height = parse_dimension(&names.height, params.get(names.height.as_str()))?;

        Ok(Self {
            source,
            width,
            height,
        })
    }

    /// The resize target, present only when both dimensions are positive
    pub fn resize_target(&self) -> Option<ResizeTarget> {
        Some(ResizeTarget {
            width: NonZeroU32::new(self.width)?,
            height: NonZeroU32::new(self.height)?,
        })
    }
}

/// Split a query string into decoded key/value pairs
///
/// The first occurrence of a key wins. `+` decodes to a space.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        if params.contains_key(&key) {
            continue;
        }
        params.insert(key, decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn parse_source_url(raw: &str, param: &str) -> Result<Url, ProxyError> {
    if raw.is_empty() {
        return Err(ProxyError::invalid_request(format!(
            "missing source url parameter '{}'",
            param
        )));
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(ProxyError::invalid_request("absolute url is required"));
        }
        Err(e) => {
            return Err(ProxyError::invalid_request(format!(
                "cannot parse url: {}",
                e
            )));
        }
    };

    // Rejects file:, data: and similar schemes that carry no host
    if !url.has_host() {
        return Err(ProxyError::invalid_request("absolute url is required"));
    }

    Ok(url)
}

/// Parse an optional dimension with the lenient policy
///
/// Missing or non-numeric values become 0 (no resize). Negative values and
/// values outside `u32` are rejected.
fn parse_dimension(param: &str, raw: Option<&String>) -> Result<u32, ProxyError> {
    let Some(raw) = raw else {
        return Ok(0);
    };

    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(0);
    }

    // Any magnitude counts, even one that overflows every integer type
    if negative && digits.bytes().any(|b| b != b'0') {
        return Err(ProxyError::invalid_request(format!(
            "invalid {}: must be a non-negative integer, got {}",
            param, raw
        )));
    }

    digits.parse::<u32>().map_err(|_| {
        ProxyError::invalid_request(format!("invalid {}: {} is too large", param, raw))
    })
}

/// Parse a 6-digit hex RGB color, with or without a leading `#`
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
