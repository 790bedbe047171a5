use std::path::{Path, PathBuf};

use clap::Parser;

use crate::models::{CondaEnvironment, ManifestMode};

#[derive(Parser, Debug)]
#[command(
    name = "license-annotate",
    about = "Add license information to a dependency file (requirements.txt or environment.yml) as comments",
    version
)]
pub struct Cli {
    /// Dependency file to annotate
    pub file: PathBuf,

    /// Treat the file as environment.yml, using the conda license catalog for this Python line
    #[arg(short, long, value_name = "ENV")]
    pub environment: Option<CondaEnvironment>,

    /// Print the annotated file to stdout instead of rewriting it
    #[arg(short, long)]
    pub stdout: bool,

    /// Config file [default: <file dir>/.license-annotate/config.toml, fallback ~/.config/license-annotate/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show a table of every dependency line and its license
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress and summary output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn mode(&self) -> ManifestMode {
        match self.environment {
            Some(_) => ManifestMode::Environment,
            None => ManifestMode::Requirements,
        }
    }

    /// The manifest path with a leading `~` expanded to the home directory.
    pub fn manifest_path(&self) -> PathBuf {
        expand_home(&self.file)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
