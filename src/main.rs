//! `license-annotate` — append a `  # <license>` comment to every pinned
//! dependency in a `requirements.txt` or conda `environment.yml`.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]).
//! 3. In environment mode, download the bulk conda license catalog once
//!    ([`registry::anaconda`]).
//! 4. Resolve and annotate every line ([`manifest::line::LineProcessor`]), in
//!    concurrent batches reassembled in input order.
//! 5. Print to stdout or atomically rewrite the file. Nothing is written if
//!    any lookup failed.
//! 6. Print the summary ([`report`]).

mod cli;
mod config;
mod license;
mod manifest;
mod models;
mod registry;
mod report;
mod resolver;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::NamedTempFile;

use cli::Cli;
use config::load_config;
use manifest::line::LineProcessor;
use models::ProcessedLine;
use registry::anaconda::fetch_catalog;
use registry::pypi::PypiClient;
use registry::LicenseLookup;
use resolver::LicenseResolver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.manifest_path();

    let config = load_config(&path, cli.config.as_deref())?;

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let client = reqwest::Client::builder()
        .timeout(config.registry.timeout())
        .user_agent(config.registry.user_agent.as_str())
        .build()?;

    let mode = cli.mode();
    if !cli.quiet {
        eprintln!("  {} {} ({} mode)", "→".cyan(), path.display(), mode);
    }

    // Catalog is loaded once, before any line is processed
    let catalog = match cli.environment {
        Some(environment) => {
            let url = config.catalog.url_for(environment);
            let catalog = fetch_catalog(&client, url, environment).await?;
            if catalog.is_empty() {
                eprintln!(
                    "  {} {} catalog at {} has no packages; conda entries rely on PyPI only",
                    "!".yellow(),
                    environment,
                    url
                );
            } else if !cli.quiet {
                eprintln!(
                    "  {} {} catalog: {} packages",
                    "→".cyan(),
                    environment,
                    catalog.len()
                );
            }
            Some(catalog)
        }
        None => None,
    };

    let pypi = PypiClient::new(client, config.registry.url.as_str());
    let processor = LineProcessor::new(LicenseResolver::new(pypi, catalog), mode);

    let processed = annotate(
        &processor,
        &content,
        config.registry.batch_size(),
        cli.quiet,
    )
    .await?;
    let output = manifest::render(&processed, content.ends_with('\n'));

    if cli.stdout {
        if processed.is_empty() || output.ends_with('\n') {
            print!("{output}");
        } else {
            println!("{output}");
        }
    } else {
        write_atomic(&path, &output)?;
    }

    report::terminal::render(&processed, &path, cli.verbose, cli.quiet);

    Ok(())
}

async fn annotate<L: LicenseLookup>(
    processor: &LineProcessor<L>,
    content: &str,
    batch_size: usize,
    quiet: bool,
) -> Result<Vec<ProcessedLine>> {
    let lines: Vec<&str> = content.lines().collect();

    let pb = if !quiet {
        let pb = ProgressBar::new(lines.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let result = processor
        .process_lines(&lines, batch_size, |n| {
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        })
        .await;

    if let Some(pb) = pb {
        match &result {
            Ok(_) => pb.finish_with_message("Done"),
            Err(_) => pb.abandon_with_message("Failed"),
        }
    }

    result
}

/// Replace `dest` with `content` via a temp file in the same directory.
fn write_atomic(dest: &Path, content: &str) -> Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    if let Ok(meta) = std::fs::metadata(dest) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .context("failed to copy file permissions")?;
    }
    tmp.write_all(content.as_bytes())
        .context("failed to write temp file")?;
    tmp.as_file().sync_all().context("failed to fsync temp file")?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to rewrite {}", dest.display()))?;

    Ok(())
}
