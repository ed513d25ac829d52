use std::time::Duration;

use reqwest::{Client, Proxy, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid proxy URL {url}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),
}

/// Settings for the transfer client shared by one pull operation.
///
/// Connection setup should fail fast while a live-but-slow transfer
/// should not, so the connect timeout is short and independent of the
/// much longer read timeout.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub proxies: Vec<Url>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(300),
            proxies: Vec::new(),
        }
    }
}

impl ClientSettings {
    pub fn build(&self) -> Result<Client, ClientError> {
        let mut cb = Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout);

        let (secure, insecure): (Vec<&Url>, Vec<&Url>) = self
            .proxies
            .iter()
            .partition(|u| u.scheme() == "https");

        for u in secure {
            cb = cb.proxy(Proxy::https(u.as_str()).map_err(|source| ClientError::Proxy {
                url: u.to_string(),
                source,
            })?);
        }
        for u in insecure {
            cb = cb.proxy(Proxy::http(u.as_str()).map_err(|source| ClientError::Proxy {
                url: u.to_string(),
                source,
            })?);
        }

        cb.build().map_err(ClientError::Build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_build() {
        ClientSettings::default().build().unwrap();
    }

    #[test]
    fn test_timeouts_are_split() {
        let settings = ClientSettings::default();
        assert!(settings.connect_timeout < settings.read_timeout);
    }
}
