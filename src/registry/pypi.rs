use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::LicenseLookup;
use crate::models::ReleaseMetadata;

pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/pypi";

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    info: ReleaseMetadata,
}

/// PyPI JSON API client: `GET {base_url}/{package}/{version}/json`.
pub struct PypiClient {
    client: Client,
    base_url: String,
}

impl PypiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn release_url(&self, package: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/json",
            self.base_url.trim_end_matches('/'),
            package,
            version
        )
    }
}

impl LicenseLookup for PypiClient {
    async fn release_data(&self, package: &str, version: &str) -> Result<Option<ReleaseMetadata>> {
        let url = self.release_url(package, version);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("failed to query PyPI for {package}=={version}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("PyPI lookup failed for {package}=={version}"))?;

        let data: ReleaseResponse = response
            .json()
            .await
            .with_context(|| format!("invalid PyPI response for {package}=={version}"))?;

        Ok(Some(data.info))
    }
}
