//! Transient list sources.
//!
//! A [`TransientSource`] delivers normalized [`CandidateRecord`]s for one run.
//! An empty list is a valid answer; a transport failure is an error the
//! pipeline hands back to the caller untouched.

pub mod html;
pub mod rochester;

use crate::candidate::CandidateRecord;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

pub use rochester::{RochesterCoordinateSource, RochesterTableSource};

/// Rochester list with discovery entries carrying positions
pub const DEFAULT_PRIMARY_URL: &str = "https://www.rochesterastronomy.org/supernova.html";
/// Simpler per-year Rochester page used when the primary list yields nothing
pub const DEFAULT_FALLBACK_URL: &str = "http://www.rochesterastronomy.org/snimages/sn2025.html";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch transient list: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

pub trait TransientSource: Send + Sync {
    /// Short label stored in each record's `source` field
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError>;
}

/// Blocking page fetcher shared by the HTML sources
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("astra/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GET a page body; any non-2xx status is a transport failure
    pub fn fetch(&self, url: &str) -> Result<String, SourceError> {
        tracing::debug!("Fetching {url}");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}
