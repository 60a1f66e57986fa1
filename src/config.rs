use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub store: Store,
    pub http: Http,
}

#[derive(Deserialize)]
pub struct Store {
    /// Base URL of the hosted database service. Store operations are
    /// disabled when absent.
    pub url: Option<String>,

    /// Public API key of the hosted database service. Store operations are
    /// disabled when absent.
    pub api_key: Option<String>,

    #[serde(
        default = "default_request_timeout",
        with = "humantime_serde"
    )]
    pub request_timeout: time::Duration,
}

fn default_request_timeout() -> time::Duration {
    time::Duration::from_secs(10)
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}
