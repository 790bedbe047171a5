use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;

use crate::models::CondaEnvironment;

/// Legacy Anaconda 4.3.1 package lists, one page per Python line.
pub const DEFAULT_PY2_URL: &str =
    "https://docs.anaconda.com/anaconda/packages/old-pkg-lists/4.3.1/py27/";
pub const DEFAULT_PY3_URL: &str =
    "https://docs.anaconda.com/anaconda/packages/old-pkg-lists/4.3.1/py35/";

/// Immutable bare package name → license map. Lookups are exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseCatalog {
    entries: HashMap<String, String>,
}

impl LicenseCatalog {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for LicenseCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Download and scrape the package list page for `environment`.
pub async fn fetch_catalog(
    client: &Client,
    url: &str,
    environment: CondaEnvironment,
) -> Result<LicenseCatalog> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to download {environment} license catalog from {url}"))?
        .error_for_status()
        .with_context(|| format!("{environment} license catalog unavailable at {url}"))?;

    let html = response
        .text()
        .await
        .with_context(|| format!("failed to read {environment} license catalog body"))?;

    parse_catalog(&html)
}

/// Extract `name → license` from every 4-column row of the `docutils` tables.
///
/// Column 1 holds the package name as a link, column 3 the license, of which
/// only the part after the last `/` is kept.
pub fn parse_catalog(html: &str) -> Result<LicenseCatalog> {
    let table_re =
        Regex::new(r#"(?is)<table[^>]*\bclass\s*=\s*"[^"]*\bdocutils\b[^"]*"[^>]*>(.*?)</table>"#)?;
    let row_re = Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>")?;
    let cell_re = Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>")?;
    let anchor_re = Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>")?;
    let tag_re = Regex::new(r"(?s)<[^>]+>")?;

    let mut entries = HashMap::new();

    for table in table_re.captures_iter(html) {
        for row in row_re.captures_iter(&table[1]) {
            let cells: Vec<&str> = cell_re
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            if cells.len() != 4 {
                continue;
            }

            let Some(anchor) = anchor_re.captures(cells[0]) else {
                continue;
            };
            let name = html_text(&tag_re, &anchor[1]);
            let license_text = html_text(&tag_re, cells[2]);
            let license = license_text.rsplit('/').next().unwrap_or_default().trim();

            if name.is_empty() || license.is_empty() {
                continue;
            }
            entries.insert(name, license.to_string());
        }
    }

    Ok(LicenseCatalog { entries })
}

/// Cell text with tags removed, entities decoded and whitespace runs
/// (including wrapped lines) collapsed to single spaces.
fn html_text(tag_re: &Regex, fragment: &str) -> String {
    tag_re
        .replace_all(fragment, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"<html><body>
<table class="other"><tr><td><a href="x">ignored</a></td><td>1</td><td>MIT</td><td>x</td></tr></table>
<table border="1" class="docutils">
  <thead><tr><th>Name</th><th>Version</th><th>Summary / License</th><th>In Installer</th></tr></thead>
  <tbody>
    <tr class="row-odd"><td><a class="reference external" href="http://www.numpy.org/">numpy</a></td>
        <td>1.11.3</td><td>array processing for numbers / BSD</td><td>X</td></tr>
    <tr><td><a href="https://www.anaconda.com">mkl</a></td><td>2017.0.1</td><td>Math Kernel Library / Proprietary</td><td>X</td></tr>
    <tr><td><a href="https://pandas.pydata.org">pandas</a></td><td>0.19.2</td><td>data structures &amp; analysis / BSD 3-Clause</td><td></td></tr>
    <tr><td>no-link</td><td>1.0</td><td>thing / MIT</td><td></td></tr>
    <tr><td><a href="#">short-row</a></td><td>1.0</td><td>MIT</td></tr>
  </tbody>
</table>
</body></html>"##;

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(PAGE).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("numpy"), Some("BSD"));
        assert_eq!(catalog.get("mkl"), Some("Proprietary"));
        assert_eq!(catalog.get("pandas"), Some("BSD 3-Clause"));
        assert_eq!(catalog.get("no-link"), None);
        assert_eq!(catalog.get("short-row"), None);
        assert_eq!(catalog.get("ignored"), None);
    }

    #[test]
    fn test_parse_catalog_joins_wrapped_cells() {
        let page = "<table class=\"docutils\"><tr>\
            <td><a href=\"https://software.intel.com\">mkl</a></td><td>2017.0.1</td>\
            <td>Math Kernel\n Library / Intel Simplified\n   Software License</td><td>X</td>\
            </tr></table>";
        let catalog = parse_catalog(page).unwrap();
        assert_eq!(catalog.get("mkl"), Some("Intel Simplified Software License"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let catalog: LicenseCatalog = [("numpy".to_string(), "BSD".to_string())]
            .into_iter()
            .collect();
        assert_eq!(catalog.get("numpy"), Some("BSD"));
        assert_eq!(catalog.get("NumPy"), None);
    }

    #[tokio::test]
    async fn test_fetch_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/py27/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let url = format!("{}/py27/", server.uri());
        let catalog = fetch_catalog(&Client::new(), &url, CondaEnvironment::Py2)
            .await
            .unwrap();
        assert_eq!(catalog.get("numpy"), Some("BSD"));
    }

    #[tokio::test]
    async fn test_fetch_catalog_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/py35/", server.uri());
        let err = fetch_catalog(&Client::new(), &url, CondaEnvironment::Py3)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("py3 license catalog"));
    }
}
