//! Server configuration types.
//!
//! This module defines the server-level configuration:
//! - Listen address
//! - Outbound fetch timeout
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LISTEN_ADDR};

fn default_listen() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP address to bind, e.g. `localhost:8080` or `:8085`
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Outbound fetch timeout in seconds (0 disables the timeout)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            timeout: default_timeout(),
        }
    }
}

impl ServerConfig {
    /// Address in a form `TcpListener::bind` accepts
    ///
    /// A bare `:port` binds every interface.
    pub fn bind_address(&self) -> String {
        if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.clone()
        }
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}
