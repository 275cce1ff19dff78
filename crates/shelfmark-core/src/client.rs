//! Reusable outbound connections for the search services.
//!
//! Each [`Connection`] is bound to one service base URL and lives for a whole
//! session, shared sequentially across books. On a network failure the
//! underlying client is torn down and rebuilt once (preserving proxy and
//! timeout settings) and the request retried exactly once; a second failure
//! propagates as [`Error::Network`], which resolvers degrade to "no result".

use crate::config::ProxyConfig;
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// A long-lived connection to one external search service.
///
/// Optionally tunneled through an HTTP proxy. The connection stays valid
/// after a failed request: the rebuilt client is kept for the next call.
pub struct Connection {
    base_url: String,
    proxy: Option<ProxyConfig>,
    timeout: Duration,
    client: Client,
}

impl Connection {
    /// Open a connection to `base_url`, optionally through `proxy`.
    pub fn open(base_url: &str, proxy: Option<ProxyConfig>, timeout: Duration) -> Result<Self> {
        let client = Self::build_client(proxy.as_ref(), timeout)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            proxy,
            timeout,
            client,
        })
    }

    fn build_client(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Client> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.url())?);
        }
        builder.build().map_err(Error::Network)
    }

    /// Base URL this connection is bound to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET for `path_and_query` and return the raw response body.
    ///
    /// Non-success statuses are not errors here: the search services encode
    /// "no results" in the page body, so marker checks belong to the caller.
    /// A network failure triggers one reconnect-and-retry before giving up.
    pub async fn get(&mut self, path_and_query: &str, headers: HeaderMap) -> Result<String> {
        match self.try_get(path_and_query, headers.clone()).await {
            Ok(body) => Ok(body),
            Err(first) => {
                warn!(
                    "request to {}{} failed ({}), reconnecting",
                    self.base_url, path_and_query, first
                );
                self.client = Self::build_client(self.proxy.as_ref(), self.timeout)?;
                self.try_get(path_and_query, headers).await
            },
        }
    }

    async fn try_get(&self, path_and_query: &str, headers: HeaderMap) -> Result<String> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self.client.get(&url).headers(headers).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(body)
    }
}
