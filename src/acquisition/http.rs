//! Package feeds over HTTP.
//!
//! Speaks the flat-container resource of the NuGet v3 protocol. A source
//! URL ending in `index.json` is a service index and is resolved to its
//! `PackageBaseAddress/3.0.0` resource on first use; any other URL is taken
//! as the flat-container base itself.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{CheckupError, Result};

use super::fault::{FaultKind, FetchError};
use super::identity::{parse_version, PackageIdentity};
use super::source::{Lookup, PackageRepository};

const BASE_ADDRESS_TYPE: &str = "PackageBaseAddress/3.0.0";

/// A remote package feed.
pub struct HttpRepository {
    url: String,
    client: Client,
    timeout: Duration,
    base: OnceLock<String>,
}

impl HttpRepository {
    /// Create a repository with the default 100-second timeout.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(100))
    }

    /// Create a repository with a custom request timeout.
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("checkup/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CheckupError::Other(anyhow::anyhow!("HTTP client: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
            client,
            timeout,
            base: OnceLock::new(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Flat-container base address, resolved from the service index if needed.
    fn base_address(&self) -> std::result::Result<String, FetchError> {
        if let Some(base) = self.base.get() {
            return Ok(base.clone());
        }

        let resolved = if self.url.to_lowercase().ends_with("index.json") {
            let body = self.get_text(&self.url)?;
            let index: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| FetchError::corrupt(format!("invalid service index: {}", e)))?;
            index["resources"]
                .as_array()
                .and_then(|resources| {
                    resources.iter().find(|r| {
                        r["@type"]
                            .as_str()
                            .is_some_and(|t| t.eq_ignore_ascii_case(BASE_ADDRESS_TYPE))
                    })
                })
                .and_then(|r| r["@id"].as_str())
                .map(|id| id.trim_end_matches('/').to_string())
                .ok_or_else(|| {
                    FetchError::fatal(format!("{} has no {} resource", self.url, BASE_ADDRESS_TYPE))
                })?
        } else {
            self.url.trim_end_matches('/').to_string()
        };

        tracing::debug!("Feed {} uses base address {}", self.url, resolved);
        Ok(self.base.get_or_init(|| resolved).clone())
    }

    fn send(&self, url: &str) -> std::result::Result<Response, FetchError> {
        self.client.get(url).send().map_err(classify)
    }

    fn get_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self.send(url)?;
        check_status(url, response.status())?;
        response.text().map_err(classify)
    }

    fn versions_url(&self, base: &str, identity: &PackageIdentity) -> String {
        format!("{}/{}/index.json", base, identity.id().to_lowercase())
    }

    fn archive_url(&self, base: &str, identity: &PackageIdentity) -> String {
        let id = identity.id().to_lowercase();
        let version = identity.version_string().to_lowercase();
        format!("{}/{}/{}/{}.{}.nupkg", base, id, version, id, version)
    }
}

/// Map a transport error to a fault kind.
fn classify(e: reqwest::Error) -> FetchError {
    let kind = if e.is_timeout() {
        FaultKind::OperationCancelled
    } else if e.is_connect() || e.is_body() || e.is_request() || e.is_decode() {
        FaultKind::Io
    } else {
        FaultKind::Fatal
    };
    FetchError::new(kind, e.to_string())
}

/// Map a non-success status to a fault kind.
fn check_status(url: &str, status: StatusCode) -> std::result::Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    let message = format!("HTTP {} fetching {}", status, url);
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        Err(FetchError::io(message))
    } else {
        Err(FetchError::fatal(message))
    }
}

impl PackageRepository for HttpRepository {
    fn name(&self) -> &str {
        &self.url
    }

    fn lookup(&self, identity: &PackageIdentity, cancel: &CancelToken) -> Lookup {
        if cancel.is_cancelled() {
            return Lookup::TransientError("cancelled".to_string());
        }
        let base = match self.base_address() {
            Ok(base) => base,
            Err(e) => return Lookup::TransientError(e.to_string()),
        };

        let url = self.versions_url(&base, identity);
        let response = match self.send(&url) {
            Ok(response) => response,
            Err(e) => return Lookup::TransientError(e.to_string()),
        };
        if response.status() == StatusCode::NOT_FOUND {
            return Lookup::NotFound;
        }
        if let Err(e) = check_status(&url, response.status()) {
            return Lookup::TransientError(e.to_string());
        }

        let body: serde_json::Value = match response.text().map_err(classify).and_then(|text| {
            serde_json::from_str(&text).map_err(|e| FetchError::corrupt(e.to_string()))
        }) {
            Ok(body) => body,
            Err(e) => return Lookup::TransientError(e.to_string()),
        };

        let found = body["versions"].as_array().is_some_and(|versions| {
            versions
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|v| parse_version(v).ok())
                .any(|v| &v == identity.version())
        });
        if found {
            Lookup::Found
        } else {
            Lookup::NotFound
        }
    }

    fn download(
        &self,
        identity: &PackageIdentity,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> std::result::Result<(), FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }
        let base = self.base_address()?;
        let url = self.archive_url(&base, identity);
        tracing::debug!("Downloading {}", url);

        let mut response = self.send(&url)?;
        check_status(&url, response.status())?;
        response.copy_to(sink).map_err(classify)?;
        Ok(())
    }
}
