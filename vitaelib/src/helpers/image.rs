use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::FutureExt;
use tracing::{instrument, trace};

use super::Deferred;
use crate::error::{HelperError, ImageFetchError};

pub const DATA_URI_PREFIX: &str = "data:image/jpg;base64,";

/// Turns image paths into inline `data:` URIs when image processing is on.
#[derive(Debug, Clone)]
pub struct ImageEmbedder {
    enabled: bool,
    client: reqwest::Client,
}

impl ImageEmbedder {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the path unchanged when disabled, otherwise a pending data URI.
    ///
    /// Paths starting with `http://` or `https://` are downloaded; anything
    /// else is read from the local filesystem.
    #[instrument(skip(self))]
    pub fn embed(&self, path: &str) -> Deferred {
        if !self.enabled {
            return Deferred::ready(path.to_owned());
        }

        if path.is_empty() {
            return Deferred::Ready(Err(HelperError::InvalidInput(
                "no valid path for the profile picture image".to_owned(),
            )));
        }

        let client = self.client.clone();
        let path = path.to_owned();
        Deferred::Pending(
            async move {
                trace!(%path, "embedding image");
                let bytes = fetch(&client, &path)
                    .await
                    .map_err(|source| HelperError::Image {
                        path: path.clone(),
                        source,
                    })?;
                Ok(to_data_uri(&bytes))
            }
            .boxed(),
        )
    }
}

impl Default for ImageEmbedder {
    fn default() -> Self {
        Self::new(false)
    }
}

pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes))
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

async fn fetch(client: &reqwest::Client, path: &str) -> Result<Vec<u8>, ImageFetchError> {
    if is_remote(path) {
        let response = client.get(path).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    } else {
        Ok(tokio::fs::read(path).await?)
    }
}
