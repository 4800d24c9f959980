// Server module - HTTP/1.1 listener that feeds every request to the pipeline

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ProxyError;
use crate::image_optimizer::ProcessedImage;
use crate::pipeline::ImageProxy;

/// Bound listener plus the shared request handler
pub struct ProxyServer {
    listener: TcpListener,
    proxy: Arc<ImageProxy>,
}

impl ProxyServer {
    /// Validate the configuration and bind the listen address
    pub async fn bind(config: Config) -> Result<Self, String> {
        let address = config.server.bind_address();
        let proxy = ImageProxy::new(config)?;
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", address, e))?;

        Ok(Self {
            listener,
            proxy: Arc::new(proxy),
        })
    }

    /// The actual bound address (resolves port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process is killed
    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    return;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let proxy = Arc::clone(&self.proxy);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let proxy = Arc::clone(&proxy);
                async move { Ok::<_, Infallible>(handle_request(&proxy, req).await) }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
            }
        });
    }
}

/// Handle one request; every method and path is treated the same
pub async fn handle_request(proxy: &ImageProxy, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    async move {
        let started = Instant::now();
        let result = proxy.transform(req.uri().query()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(processed) => {
                tracing::info!(
                    status = 200,
                    source_format = %processed.source_format,
                    output_format = %processed.format,
                    original = %format!("{}x{}", processed.original_size.0, processed.original_size.1),
                    output = %format!("{}x{}", processed.output_size.0, processed.output_size.1),
                    bytes = processed.data.len(),
                    elapsed_ms,
                    "Image served"
                );
                image_response(processed)
            }
            Err(err) => {
                let status = err.to_http_status();
                if status >= 500 {
                    tracing::error!(status, error = %err, elapsed_ms, "Request failed");
                } else {
                    tracing::warn!(status, error = %err, elapsed_ms, "Request failed");
                }
                error_response(&err)
            }
        }
    }
    .instrument(span)
    .await
}

fn image_response(processed: ProcessedImage) -> Response<Full<Bytes>> {
    let length = processed.data.len();
    let mut response = Response::new(Full::new(Bytes::from(processed.data)));
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static(processed.content_type),
    );
    headers.insert(CONTENT_LENGTH, http::HeaderValue::from(length));
    response
}

/// Plain-text error body with the status mapped from the error
pub fn error_response(err: &ProxyError) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(err.to_http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::new(Full::new(Bytes::from(format!("{}\n", err))));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
