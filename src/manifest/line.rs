use anyhow::Result;
use futures::future::join_all;

use super::extract::{
    bare_name, dependency_text, extract, CONDA_FIELDS, CONDA_SEPARATOR, PIP_FIELDS, PIP_SEPARATOR,
    VCS_PREFIX,
};
use crate::license::comment::compose;
use crate::models::{Annotation, AnnotationStatus, LicenseSource, ManifestMode, ProcessedLine};
use crate::registry::LicenseLookup;
use crate::resolver::LicenseResolver;

/// Top-level conda dependency entry in `environment.yml`.
pub const CONDA_PREFIX: &str = "- ";
/// Entry nested under the `- pip:` section.
pub const PIP_PREFIX: &str = "  - ";
/// Opens the nested pip list.
pub const PIP_SECTION: &str = "- pip:";

/// How a right-stripped manifest line is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A `requirements.txt` line.
    PipDependency(&'a str),
    /// `- package=version=build`, carrying the text after the prefix.
    CondaDependency(&'a str),
    /// `  - package==version` under `- pip:`, carrying the text after the prefix.
    PipSubDependency(&'a str),
    PipSection,
    /// `name:`, `channels:`, comments, blank lines.
    Structural,
}

pub fn classify(line: &str, mode: ManifestMode) -> LineKind<'_> {
    match mode {
        ManifestMode::Requirements => LineKind::PipDependency(line),
        ManifestMode::Environment => {
            if line.trim_start() == PIP_SECTION {
                LineKind::PipSection
            } else if let Some(rest) = line.strip_prefix(CONDA_PREFIX) {
                LineKind::CondaDependency(rest)
            } else if let Some(rest) = line.strip_prefix(PIP_PREFIX) {
                LineKind::PipSubDependency(rest)
            } else {
                LineKind::Structural
            }
        }
    }
}

/// Annotates manifest lines one at a time; lines share no state.
pub struct LineProcessor<L> {
    resolver: LicenseResolver<L>,
    mode: ManifestMode,
}

impl<L: LicenseLookup> LineProcessor<L> {
    pub fn new(resolver: LicenseResolver<L>, mode: ManifestMode) -> Self {
        Self { resolver, mode }
    }

    pub async fn process_line(&self, line: &str) -> Result<ProcessedLine> {
        let line = line.trim_end();

        match classify(line, self.mode) {
            LineKind::PipSection | LineKind::Structural => Ok(ProcessedLine::passthrough(line)),
            LineKind::PipDependency(spec) | LineKind::PipSubDependency(spec) => {
                self.annotate_pip(line, spec).await
            }
            LineKind::CondaDependency(spec) => self.annotate_conda(line, spec).await,
        }
    }

    /// Process `lines` concurrently, `batch_size` at a time, keeping input order.
    ///
    /// `on_progress` is called with the number of lines finished in each batch.
    /// The first failing lookup aborts the whole run.
    pub async fn process_lines<F>(
        &self,
        lines: &[&str],
        batch_size: usize,
        mut on_progress: F,
    ) -> Result<Vec<ProcessedLine>>
    where
        F: FnMut(usize),
    {
        let mut processed = Vec::with_capacity(lines.len());

        for batch in lines.chunks(batch_size.max(1)) {
            let results = join_all(batch.iter().map(|line| self.process_line(line))).await;
            for result in results {
                processed.push(result?);
            }
            on_progress(batch.len());
        }

        Ok(processed)
    }

    async fn annotate_pip(&self, line: &str, spec: &str) -> Result<ProcessedLine> {
        let Some(dep) = extract(spec, PIP_SEPARATOR, PIP_FIELDS) else {
            return Ok(ProcessedLine::passthrough(line));
        };

        let license = self.resolver.resolve(dep.package, dep.version).await?;
        Ok(annotate(
            line,
            dep.package,
            Some(dep.version),
            license,
            LicenseSource::Registry,
        ))
    }

    async fn annotate_conda(&self, line: &str, spec: &str) -> Result<ProcessedLine> {
        let dep = extract(spec, CONDA_SEPARATOR, CONDA_FIELDS);

        if let Some(dep) = dep {
            let license = self.resolver.resolve(dep.package, dep.version).await?;
            if license.is_some() {
                return Ok(annotate(
                    line,
                    dep.package,
                    Some(dep.version),
                    license,
                    LicenseSource::Registry,
                ));
            }
        }

        let name = bare_name(spec);
        if name.is_empty() || dependency_text(spec).starts_with(VCS_PREFIX) {
            return Ok(ProcessedLine::passthrough(line));
        }

        let license = self.resolver.resolve_from_catalog(spec);
        let version = dep.map(|d| d.version);
        Ok(annotate(line, name, version, license, LicenseSource::Catalog))
    }
}

fn annotate(
    line: &str,
    package: &str,
    version: Option<&str>,
    license: Option<String>,
    source: LicenseSource,
) -> ProcessedLine {
    let suffix = compose(line, license.as_deref());

    let (status, source) = match (&license, suffix.is_empty()) {
        (None, _) => (AnnotationStatus::Unresolved, LicenseSource::Unknown),
        (Some(_), true) => (AnnotationStatus::Present, source),
        (Some(_), false) => (AnnotationStatus::Added, source),
    };

    ProcessedLine {
        text: format!("{line}{suffix}"),
        annotation: Some(Annotation {
            package: package.to_string(),
            version: version.map(str::to_string),
            license,
            source,
            status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::anaconda::LicenseCatalog;
    use crate::resolver::tests::{classifiers, license, FakeRegistry};

    fn processor(registry: FakeRegistry, mode: ManifestMode) -> LineProcessor<FakeRegistry> {
        LineProcessor::new(LicenseResolver::new(registry, None), mode)
    }

    fn conda_processor(
        registry: FakeRegistry,
        catalog: &[(&str, &str)],
    ) -> LineProcessor<FakeRegistry> {
        let catalog: LicenseCatalog = catalog
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LineProcessor::new(
            LicenseResolver::new(registry, Some(catalog)),
            ManifestMode::Environment,
        )
    }

    fn calls(p: &LineProcessor<FakeRegistry>) -> usize {
        p.resolver.lookup().calls().len()
    }

    #[test]
    fn test_classify_environment_lines() {
        let mode = ManifestMode::Environment;
        assert_eq!(classify("name: datacourse", mode), LineKind::Structural);
        assert_eq!(classify("dependencies:", mode), LineKind::Structural);
        assert_eq!(classify("", mode), LineKind::Structural);
        assert_eq!(classify(" - pip:", mode), LineKind::PipSection);
        assert_eq!(classify("  - pip:", mode), LineKind::PipSection);
        assert_eq!(
            classify("- numpy=1.11.3=py27_0", mode),
            LineKind::CondaDependency("numpy=1.11.3=py27_0")
        );
        assert_eq!(
            classify("  - Flask==1.1.1", mode),
            LineKind::PipSubDependency("Flask==1.1.1")
        );
    }

    #[test]
    fn test_classify_requirements_lines() {
        assert_eq!(
            classify("- not yaml", ManifestMode::Requirements),
            LineKind::PipDependency("- not yaml")
        );
    }

    #[tokio::test]
    async fn test_simple_pip_license() {
        let p = processor(FakeRegistry::always(license("Apache")), ManifestMode::Requirements);
        let out = p.process_line("Flask==1.1.1").await.unwrap();
        assert_eq!(out.text, "Flask==1.1.1  # Apache");

        let annotation = out.annotation.unwrap();
        assert_eq!(annotation.package, "Flask");
        assert_eq!(annotation.version.as_deref(), Some("1.1.1"));
        assert_eq!(annotation.source, LicenseSource::Registry);
        assert_eq!(annotation.status, AnnotationStatus::Added);
    }

    #[tokio::test]
    async fn test_classifier_pip_license() {
        let info = classifiers(&["Some Junk", "License :: OSI Approved :: BSD License"]);
        let p = processor(FakeRegistry::always(info), ManifestMode::Requirements);
        assert_eq!(
            p.process_line("Flask==1.1.1\n").await.unwrap().text,
            "Flask==1.1.1  # License :: OSI Approved :: BSD License"
        );
    }

    #[tokio::test]
    async fn test_pip_line_is_idempotent() {
        let p = processor(FakeRegistry::always(license("Apache")), ManifestMode::Requirements);
        let once = p.process_line("Flask==1.1.1").await.unwrap();
        let twice = p.process_line(&once.text).await.unwrap();
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.annotation.unwrap().status, AnnotationStatus::Present);
    }

    #[tokio::test]
    async fn test_git_pip_line_skips_lookup() {
        let p = processor(FakeRegistry::offline(), ManifestMode::Requirements);
        let out = p
            .process_line("git+https://github.com/thedataincubator/ds30.git")
            .await
            .unwrap();
        assert_eq!(out.text, "git+https://github.com/thedataincubator/ds30.git");
        assert_eq!(out.annotation, None);
        assert_eq!(calls(&p), 0);
    }

    #[tokio::test]
    async fn test_unresolved_pip_line_unchanged() {
        let p = processor(FakeRegistry::default(), ManifestMode::Requirements);
        let out = p.process_line("left-pad==0.0.1   ").await.unwrap();
        assert_eq!(out.text, "left-pad==0.0.1");
        assert_eq!(out.annotation.unwrap().status, AnnotationStatus::Unresolved);
    }

    #[tokio::test]
    async fn test_environment_pip_line() {
        let p = processor(FakeRegistry::always(license("Apache")), ManifestMode::Environment);
        assert_eq!(
            p.process_line("  - Flask==1.1.1").await.unwrap().text,
            "  - Flask==1.1.1  # Apache"
        );
    }

    #[tokio::test]
    async fn test_environment_name_declaration() {
        let p = processor(FakeRegistry::offline(), ManifestMode::Environment);
        assert_eq!(p.process_line("name: datacourse").await.unwrap().text, "name: datacourse");
        assert_eq!(calls(&p), 0);
    }

    #[tokio::test]
    async fn test_environment_pip_declaration() {
        let p = processor(FakeRegistry::offline(), ManifestMode::Environment);
        assert_eq!(p.process_line("  - pip:").await.unwrap().text, "  - pip:");
        assert_eq!(p.process_line(" - pip:").await.unwrap().text, " - pip:");
        assert_eq!(calls(&p), 0);
    }

    #[tokio::test]
    async fn test_environment_conda_line() {
        let p = processor(FakeRegistry::always(license("Apache")), ManifestMode::Environment);
        assert_eq!(
            p.process_line("- Flask=1.1.1=py27").await.unwrap().text,
            "- Flask=1.1.1=py27  # Apache"
        );
    }

    #[tokio::test]
    async fn test_conda_line_falls_back_to_catalog() {
        let p = conda_processor(FakeRegistry::default(), &[("mkl", "Proprietary")]);
        let out = p.process_line("- mkl=2017.0.1=0").await.unwrap();
        assert_eq!(out.text, "- mkl=2017.0.1=0  # Proprietary");

        let annotation = out.annotation.unwrap();
        assert_eq!(annotation.source, LicenseSource::Catalog);
        assert_eq!(annotation.version.as_deref(), Some("2017.0.1"));
    }

    #[tokio::test]
    async fn test_conda_shorthand_uses_catalog_only() {
        let p = conda_processor(FakeRegistry::offline(), &[("python", "PSF")]);
        let out = p.process_line("- python=3.6").await.unwrap();
        assert_eq!(out.text, "- python=3.6  # PSF");
        assert_eq!(out.annotation.unwrap().version, None);
        assert_eq!(calls(&p), 0);

        let again = p.process_line(&out.text).await.unwrap();
        assert_eq!(again.text, out.text);
    }

    #[tokio::test]
    async fn test_conda_lookup_failure_skips_catalog() {
        let p = conda_processor(FakeRegistry::offline(), &[("Flask", "BSD")]);
        assert!(p.process_line("- Flask=1.1.1=py27").await.is_err());
        assert_eq!(calls(&p), 1);
    }

    #[tokio::test]
    async fn test_conda_wrapped_catalog_license_keeps_one_line() {
        let p = conda_processor(
            FakeRegistry::default(),
            &[("mkl", "Intel Simplified\n Software License")],
        );
        let out = p.process_line("- mkl=2017.0.1=0").await.unwrap();
        assert_eq!(out.text, "- mkl=2017.0.1=0");
        assert_eq!(out.text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_conda_line_without_any_license() {
        let p = conda_processor(FakeRegistry::default(), &[]);
        let out = p.process_line("- pip").await.unwrap();
        assert_eq!(out.text, "- pip");
        assert_eq!(out.annotation.unwrap().status, AnnotationStatus::Unresolved);
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts() {
        let p = processor(FakeRegistry::offline(), ManifestMode::Requirements);
        assert!(p.process_line("Flask==1.1.1").await.is_err());

        let lines = ["# pinned", "Flask==1.1.1", "requests==2.28.1"];
        assert!(p.process_lines(&lines, 2, |_| {}).await.is_err());
    }

    #[tokio::test]
    async fn test_process_lines_keeps_order() {
        let registry = FakeRegistry::default()
            .with_release("Flask", "1.1.1", license("BSD"))
            .with_release("requests", "2.28.1", license("Apache 2.0"));
        let p = processor(registry, ManifestMode::Requirements);

        let lines = [
            "# web",
            "Flask==1.1.1",
            "",
            "requests==2.28.1",
            "git+https://github.com/a/b.git",
        ];
        let mut progress = 0;
        let out = p.process_lines(&lines, 2, |n| progress += n).await.unwrap();

        let text: Vec<&str> = out.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            text,
            vec![
                "# web",
                "Flask==1.1.1  # BSD",
                "",
                "requests==2.28.1  # Apache 2.0",
                "git+https://github.com/a/b.git",
            ]
        );
        assert_eq!(progress, lines.len());
    }
}
