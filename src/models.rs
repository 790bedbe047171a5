use serde::Deserialize;

/// Release metadata returned by the package registry for one `package==version`.
///
/// Both fields are optional; a record with neither is treated the same as a
/// missing release.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReleaseMetadata {
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub classifiers: Option<Vec<String>>,
}

impl ReleaseMetadata {
    pub fn is_empty(&self) -> bool {
        self.license.is_none() && self.classifiers.is_none()
    }
}

/// A `(package, version)` pair recovered from a manifest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySpec<'a> {
    pub package: &'a str,
    pub version: &'a str,
}

/// Which manifest syntax is being annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestMode {
    /// pip `requirements.txt`: one `package==version` per line.
    Requirements,
    /// conda `environment.yml`: `- package=version=build` entries plus a nested
    /// `- pip:` list.
    Environment,
}

impl std::fmt::Display for ManifestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestMode::Requirements => write!(f, "requirements"),
            ManifestMode::Environment => write!(f, "environment"),
        }
    }
}

/// Python environment tag selecting which bulk license catalog to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CondaEnvironment {
    Py2,
    Py3,
}

impl std::fmt::Display for CondaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CondaEnvironment::Py2 => write!(f, "py2"),
            CondaEnvironment::Py3 => write!(f, "py3"),
        }
    }
}

/// Where a line's license came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseSource {
    Registry,
    Catalog,
    Unknown,
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSource::Registry => write!(f, "registry"),
            LicenseSource::Catalog => write!(f, "catalog"),
            LicenseSource::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationStatus {
    /// A license comment was appended to the line.
    Added,
    /// The line already ended with the resolved license.
    Present,
    /// No license could be resolved; the line is unchanged.
    Unresolved,
}

impl std::fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationStatus::Added => write!(f, "added"),
            AnnotationStatus::Present => write!(f, "present"),
            AnnotationStatus::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// What happened to a dependency line.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub package: String,
    /// `None` for conda entries resolved by bare name only.
    pub version: Option<String>,
    pub license: Option<String>,
    pub source: LicenseSource,
    pub status: AnnotationStatus,
}

/// Output of the line processor for one manifest line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedLine {
    pub text: String,
    /// Present only for lines that were treated as dependencies.
    pub annotation: Option<Annotation>,
}

impl ProcessedLine {
    pub fn passthrough(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotation: None,
        }
    }
}
