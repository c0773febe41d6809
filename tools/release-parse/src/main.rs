//! Release Parse Tool
//!
//! Reads release names from stdin, one per line, and prints one JSON object
//! per line with the parsed release and, when a profile is given, its
//! resolved priority.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use senbetsu_core::{ConfigSnapshot, MediaKind, ParsedRelease, ResolveOptions, Settings};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "release-parse")]
#[command(about = "Parse release names and rank them by quality profile")]
#[command(version)]
struct Cli {
    /// Parse as series episodes instead of movies
    #[arg(short, long)]
    series: bool,

    /// Settings file (TOML); the built-in catalog is used without one
    #[arg(short, long, env = "SENBETSU_CONFIG")]
    config: Option<PathBuf>,

    /// Quality profile used to resolve priorities
    #[arg(short, long)]
    profile: Option<String>,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    release: Option<ParsedRelease>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let kind = if cli.series {
        MediaKind::Series
    } else {
        MediaKind::Movie
    };

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let snapshot = ConfigSnapshot::build(settings).context("invalid settings")?;
    let profile = cli
        .profile
        .as_deref()
        .map(|name| snapshot.profile(name))
        .transpose()
        .context("unknown profile")?;

    info!(%kind, profile = ?cli.profile, "reading release names from stdin");

    let parser = snapshot.parser();
    let resolver = snapshot.resolver();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let output = match parser.parse(input, kind) {
            Ok(mut release) => {
                let priority = profile.map(|profile| {
                    resolver
                        .resolve(&mut release, profile, ResolveOptions::search())
                        .priority
                });
                ParseOutput {
                    input,
                    release: Some(release),
                    priority,
                    error: None,
                }
            }
            Err(e) => {
                debug!(%input, error = %e, "parse failed");
                ParseOutput {
                    input,
                    release: None,
                    priority: None,
                    error: Some(e.to_string()),
                }
            }
        };

        serde_json::to_writer(&mut out, &output)?;
        writeln!(out)?;
    }

    Ok(())
}
