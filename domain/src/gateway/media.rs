//! Client for pre-signed media locators.
//!
//! Recording URLs point at the provider's storage, not its API, so this client
//! never carries the API key.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use log::*;
use std::time::Duration;

pub struct MediaClient {
    client: reqwest::Client,
}

impl MediaClient {
    /// Only connection setup is bounded; a long recording may take a while to relay.
    pub fn new(connect_timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Start fetching `url`. The body is left unread for the caller to stream.
    pub async fn open(&self, url: &str) -> Result<reqwest::Response, Error> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Failed to fetch recording media: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Recording media fetch failed with status {status}");
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream {
                    status,
                    body,
                }),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn media_request_carries_no_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rec.webm")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("video")
            .create_async()
            .await;

        let client = MediaClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .open(&format!("{}/rec.webm", server.url()))
            .await
            .unwrap();

        assert_eq!(response.text().await.unwrap(), "video");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_forwarded() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gone.webm")
            .with_status(403)
            .with_body("expired signature")
            .create_async()
            .await;

        let client = MediaClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .open(&format!("{}/gone.webm", server.url()))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream {
                status: 403,
                body: "expired signature".to_string()
            })
        );
    }
}
