use std::env;
use std::path::PathBuf;

use anyhow::Context;
use eduai::content::sync_directory;
use tracing_subscriber::EnvFilter;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DEFAULT_SOURCE_DIR: &str = "../admin_engine/chapters";
const DEFAULT_OUTPUT_DIR: &str = "public/chapters";

pub struct Config {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

fn parse_config(mut args: impl Iterator<Item = String>) -> Config {
    let source_dir = args.next().unwrap_or(DEFAULT_SOURCE_DIR.to_string());
    let output_dir = args.next().unwrap_or(DEFAULT_OUTPUT_DIR.to_string());

    Config {
        source_dir: PathBuf::from(source_dir),
        output_dir: PathBuf::from(output_dir),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eduai=info")),
        )
        .init();

    let config = parse_config(env::args().skip(1));

    let manifest = sync_directory(&config.source_dir, &config.output_dir).context(format!(
        "could not sync chapters from {}, usage: cargo run --bin sync_chapters [source_dir] [output_dir]",
        config.source_dir.display()
    ))?;

    for chapter in &manifest {
        let lock = if chapter.locked { " (locked)" } else { "" };
        println!("  {} {}{}", chapter.id, chapter.name, lock);
    }

    println!(
        "synced {BOLD}{}{RESET} chapter(s) into {BOLD}{}{RESET}",
        manifest.len(),
        config.output_dir.join("index.json").display()
    );

    Ok(())
}
