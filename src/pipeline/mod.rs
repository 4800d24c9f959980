// Request pipeline module - runs one proxied request through every stage
//
// Received → Validating → Fetching → Decoding → [Resizing] → Encoding → Responded
//
// Any stage may fail; the failure is terminal for the request.

use std::sync::Arc;

use crate::config::Config;
use crate::error::ProxyError;
use crate::fetcher::{FetcherConfig, RemoteFetcher};
use crate::image_optimizer::{validate_target, ImageProcessor, ProcessedImage, RequestParams};

/// Request handler shared by every connection task
///
/// Holds the immutable configuration, the pooled outbound client and the
/// image settings. Nothing in it is mutated after construction.
#[derive(Clone)]
pub struct ImageProxy {
    config: Arc<Config>,
    fetcher: RemoteFetcher,
    processor: ImageProcessor,
}

impl ImageProxy {
    /// Build the handler from a validated configuration
    pub fn new(config: Config) -> Result<Self, String> {
        config.validate()?;

        let fetcher = RemoteFetcher::new(FetcherConfig {
            timeout: config.server.fetch_timeout(),
            max_bytes: config.image.max_source_bytes,
        })
        .map_err(|e| e.to_string())?;
        let processor = ImageProcessor::from_config(&config.image)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            processor,
        })
    }

    /// Run the full pipeline for one raw query string
    ///
    /// Decode, resize and encode run on the blocking pool so CPU-heavy
    /// images never stall the connection tasks.
    pub async fn transform(&self, query: Option<&str>) -> Result<ProcessedImage, ProxyError> {
        let params = RequestParams::from_query(query, &self.config.params)?;
        let target = params.resize_target();
        if let Some(target) = &target {
            validate_target(target, self.processor.limits())?;
        }

        tracing::info!(
            source = %params.source,
            width = params.width,
            height = params.height,
            "Fetching source image"
        );
        let payload = self.fetcher.fetch(&params.source).await?;

        let processor = self.processor.clone();
        let processed = tokio::task::spawn_blocking(move || processor.process(&payload, target))
            .await
            .map_err(|e| ProxyError::Internal(format!("image task failed: {}", e)))??;

        Ok(processed)
    }
}
