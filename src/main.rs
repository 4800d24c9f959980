use clap::Parser;
use image_proxy::config::{Config, LogFormat};
use image_proxy::image_optimizer::OutputPolicy;
use image_proxy::server::ProxyServer;
use std::path::PathBuf;

/// Image Proxy - fetches a remote image, optionally resizes it, and re-encodes it
///
/// Every flag is optional. Flags override values from the configuration
/// file, which override the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "image-proxy")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening address [default: localhost:8080]
    #[arg(long)]
    listen: Option<String>,

    /// HTTP timeout in seconds, 0 disables it [default: 10]
    #[arg(long)]
    timeout: Option<u64>,

    /// Source URL query string parameter [default: url]
    #[arg(long)]
    source: Option<String>,

    /// Width query string parameter [default: w]
    #[arg(long)]
    width: Option<String>,

    /// Height query string parameter [default: h]
    #[arg(long)]
    height: Option<String>,

    /// Output format policy [default: mirror]
    #[arg(long, value_enum)]
    output: Option<OutputPolicy>,

    /// JPEG quality, 1-100 [default: 85]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Log output format [default: text]
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    /// Layer command-line values over the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(timeout) = self.timeout {
            config.server.timeout = timeout;
        }
        if let Some(source) = &self.source {
            config.params.source = source.clone();
        }
        if let Some(width) = &self.width {
            config.params.width = width.clone();
        }
        if let Some(height) = &self.height {
            config.params.height = height.clone();
        }
        if let Some(output) = self.output {
            config.image.output = output;
        }
        if let Some(quality) = self.quality {
            config.image.jpeg_quality = quality;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }

    fn load_config(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    let config = args.load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Initialize logging subsystem
    image_proxy::logging::init_subscriber(config.logging.format)
        .expect("Failed to initialize logging subsystem");

    tracing::info!(
        config_file = ?args.config,
        listen = %config.server.listen,
        timeout_secs = config.server.timeout,
        source_param = %config.params.source,
        width_param = %config.params.width,
        height_param = %config.params.height,
        output = ?config.image.output,
        "Configuration loaded successfully"
    );

    let server = ProxyServer::bind(config).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to start server");
        std::process::exit(1);
    });

    match server.local_addr() {
        Ok(addr) => tracing::info!(address = %addr, "Starting Image Proxy"),
        Err(e) => tracing::warn!(error = %e, "Starting Image Proxy on unknown address"),
    }

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;
}
