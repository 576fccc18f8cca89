use anyhow::{Context, Result};
use clap::Parser;
use modidx::manifest::ModManifest;
use std::path::PathBuf;

/// modidx - mod index package tools
///
/// Run the same ingestion checks locally that the index runs at
/// upload time.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a package archive and print its manifest summary
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Path to the package .zip
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Maximum accepted archive size in megabytes (also via MODIDX_MAX_SIZE_MB)
    #[arg(long, env = "MODIDX_MAX_SIZE_MB", default_value_t = 250, value_name = "MB")]
    max_size_mb: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => check(args),
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let bytes = std::fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive at {:?}", args.archive))?;

    let manifest = ModManifest::from_archive(&bytes, "", false, args.max_size_mb)
        .context("Archive rejected")?;
    manifest.validate().context("Manifest rejected")?;

    println!("{} ({})", manifest.name, manifest.id);
    println!("  version:  {}", manifest.version);
    if let Some(developers) = &manifest.developers {
        println!("  authors:  {}", developers.join(", "));
    } else if let Some(developer) = &manifest.developer {
        println!("  author:   {}", developer);
    }
    println!("  sha256:   {}", manifest.hash);
    println!("  platforms:{}", platform_summary(&manifest));
    if !manifest.dependencies.is_empty() {
        println!("  dependencies:");
        for dep in &manifest.dependencies {
            println!("    {} {}", dep.dependency_id, dep.constraint);
        }
    }
    if !manifest.incompatibilities.is_empty() {
        println!("  incompatibilities:");
        for inc in &manifest.incompatibilities {
            println!("    {} {}", inc.incompatibility_id, inc.constraint);
        }
    }
    println!("OK");
    Ok(())
}

fn platform_summary(manifest: &ModManifest) -> String {
    let flags = [
        (manifest.windows, "windows"),
        (manifest.ios, "ios"),
        (manifest.android32, "android32"),
        (manifest.android64, "android64"),
        (manifest.mac_intel, "mac-intel"),
        (manifest.mac_arm, "mac-arm"),
    ];
    let names: Vec<&str> = flags
        .iter()
        .filter_map(|(set, name)| set.then_some(*name))
        .collect();
    if names.is_empty() {
        " none".to_string()
    } else {
        names.iter().map(|n| format!(" {}", n)).collect()
    }
}
