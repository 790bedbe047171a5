/// Placeholder PyPI reports when a package declares no license.
pub const UNKNOWN_SENTINEL: &str = "UNKNOWN";

/// Prefix of the trove classifiers that describe a license.
pub const LICENSE_CLASSIFIER_PREFIX: &str = "License";

/// Canonicalize a raw `license` field into something usable as a one-line comment.
///
/// Returns `None` for missing, blank, `UNKNOWN` or multi-line values (full
/// license texts pasted into the metadata field).
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();

    if trimmed.is_empty() || trimmed == UNKNOWN_SENTINEL {
        return None;
    }

    if trimmed.contains('\n') || trimmed.contains('\r') {
        return None;
    }

    Some(trimmed.trim_end().to_string())
}

/// First classifier starting with `License`, right-trimmed.
pub fn license_classifier(classifiers: &[String]) -> Option<String> {
    classifiers
        .iter()
        .find(|c| c.starts_with(LICENSE_CLASSIFIER_PREFIX))
        .map(|c| c.trim_end().to_string())
}
