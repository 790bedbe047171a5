use anyhow::Result;

use crate::license::normalize::{license_classifier, normalize};
use crate::manifest::extract::bare_name;
use crate::registry::anaconda::LicenseCatalog;
use crate::registry::LicenseLookup;

/// Resolves licenses from the registry, with the bulk catalog as the conda
/// fallback. Built once per run and read-only afterwards.
pub struct LicenseResolver<L> {
    lookup: L,
    catalog: Option<LicenseCatalog>,
}

impl<L: LicenseLookup> LicenseResolver<L> {
    pub fn new(lookup: L, catalog: Option<LicenseCatalog>) -> Self {
        Self { lookup, catalog }
    }

    /// License for `package==version`: the normalized `license` field, else the
    /// first `License ...` classifier.
    ///
    /// When the registry has nothing for `package`, the title-cased name is tried
    /// once. Transport errors propagate.
    pub async fn resolve(&self, package: &str, version: &str) -> Result<Option<String>> {
        let mut info = self.lookup.release_data(package, version).await?;

        if info.as_ref().map_or(true, |i| i.is_empty()) {
            let titled = title_case(package);
            if titled != package {
                info = self.lookup.release_data(&titled, version).await?;
            }
        }

        let Some(info) = info else {
            return Ok(None);
        };

        if let Some(license) = normalize(info.license.as_deref()) {
            return Ok(Some(license));
        }

        Ok(info.classifiers.as_deref().and_then(license_classifier))
    }

    #[cfg(test)]
    pub(crate) fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Catalog license for the bare conda name in `spec` (text before the first `=`),
    /// normalized like a registry `license` field.
    pub fn resolve_from_catalog(&self, spec: &str) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        normalize(catalog.get(bare_name(spec)))
    }
}

/// Python-style title case: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased (`flask-restful` → `Flask-Restful`).
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}
