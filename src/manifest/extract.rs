use crate::models::DependencySpec;

/// Source-control requirements are never looked up.
pub const VCS_PREFIX: &str = "git+https://github.com";

/// pip contract: `package==version`.
pub const PIP_SEPARATOR: &str = "==";
pub const PIP_FIELDS: usize = 2;

/// conda contract: `package=version=build`.
pub const CONDA_SEPARATOR: &str = "=";
pub const CONDA_FIELDS: usize = 3;

/// The part of a line before any `#` comment, trimmed.
pub fn dependency_text(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// Recover `(package, version)` from `line` when its dependency text splits on
/// `separator` into exactly `fields` parts.
///
/// Fields past the second (the conda build string) are discarded. Returns
/// `None` for blank lines, VCS URLs, a field-count mismatch or an empty
/// package/version.
pub fn extract<'a>(line: &'a str, separator: &str, fields: usize) -> Option<DependencySpec<'a>> {
    let text = dependency_text(line);
    if text.is_empty() || text.starts_with(VCS_PREFIX) {
        return None;
    }

    let parts: Vec<&str> = text.split(separator).collect();
    if parts.len() != fields || fields < 2 {
        return None;
    }

    let (package, version) = (parts[0].trim(), parts[1].trim());
    if package.is_empty() || version.is_empty() {
        return None;
    }

    Some(DependencySpec { package, version })
}

/// Bare conda package name: the dependency text before the first `=`.
pub fn bare_name(line: &str) -> &str {
    let text = dependency_text(line);
    text.split(CONDA_SEPARATOR).next().unwrap_or(text).trim()
}
