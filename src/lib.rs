// Image proxy library: fetch a remote image, fit it to a canvas, re-encode it

pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod image_optimizer;
pub mod logging;
pub mod pipeline;
pub mod server;
