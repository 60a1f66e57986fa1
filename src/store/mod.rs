pub mod auth;
pub mod stats;
pub mod ticket;

use reqwest::{Method, RequestBuilder, Response};
use thiserror::Error;

use crate::config;

pub use self::{auth::Session, ticket::{Insert, Patch}};

/// Client for the hosted database service.
///
/// Constructed from the `[store]` configuration section. When the service
/// URL or API key is missing the client is explicitly unconfigured: every
/// read operation returns its empty value and every write operation fails
/// with [`Error::Unconfigured`].
pub enum Client {
    Remote(Remote),
    Unconfigured,
}

impl Client {
    fn remote(&self) -> Option<&Remote> {
        match self {
            Self::Remote(remote) => Some(remote),
            Self::Unconfigured => None,
        }
    }
}

pub fn connect(config: config::Store) -> Result<Client, Error> {
    let (Some(url), Some(api_key)) = (config.url, config.api_key) else {
        tracing::warn!(
            "store URL or API key is missing, store operations are disabled",
        );
        return Ok(Client::Unconfigured);
    };

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    Ok(Client::Remote(Remote {
        http,
        base_url: url.trim_end_matches('/').to_owned(),
        api_key,
    }))
}

pub struct Remote {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Remote {
    /// Request authorized with the service API key.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Request authorized with a caller's access token.
    fn request_as(
        &self,
        method: Method,
        path: &str,
        token: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }
}

async fn into_reply(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("store is not configured")]
    Unconfigured,

    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store replied with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("store replied with no rows")]
    NoRows,
}
