//! dagpush CLI
//!
//! Usage:
//!   dagpush hash <path> [--blocks]
//!   dagpush car <file.car>
//!   dagpush pack <path> -o <out.car>
//!   dagpush missing <path> [--gateway URL]
//!   dagpush plan <path> [--gateway URL]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dagpush_cli::{log_filter, read_input, read_source, Input, LogObserver};
use dagpush_config::Config;
use dagpush_core::{build_tree, decode_directory, read_car, write_car};
use dagpush_upload::{DryRunSender, UploadDriver, UploadOptions};
use tracing::debug;

#[derive(Parser)]
#[command(name = "dagpush")]
#[command(about = "Content-addressed directory trees and batched block upload", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the root CID of a file or directory
    Hash {
        path: PathBuf,
        /// Also list every block
        #[arg(long)]
        blocks: bool,
    },
    /// List the blocks of a CAR archive
    Car {
        file: PathBuf,
    },
    /// Write a file or directory as a CAR archive
    Pack {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List blocks the gateway does not have yet
    Missing {
        /// File, directory or .car archive
        path: PathBuf,
        #[arg(long)]
        gateway: Option<String>,
    },
    /// Run the full upload with a sender that only logs batches
    Plan {
        /// File, directory or .car archive
        path: PathBuf,
        #[arg(long)]
        gateway: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter()?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hash { path, blocks } => {
            let tree = build_tree(read_source(&path)?)?;
            if blocks {
                for block in &tree.blocks {
                    println!("{} {}", block.cid, block.len());
                }
            }
            println!("{}", tree.root);
        }
        Commands::Car { file } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let blocks = read_car(&data)?;
            println!("Blocks ({}):", blocks.len());
            for block in &blocks {
                println!("  {} ({} bytes)", block.cid, block.len());
                if block.cid.is_directory() {
                    for link in decode_directory(&block.data)? {
                        println!("    {} -> {} ({})", link.name, link.cid.short(), link.size);
                    }
                }
            }
        }
        Commands::Pack { path, output } => {
            let tree = build_tree(read_source(&path)?)?;
            let car = write_car(&[tree.root], &tree.blocks)?;
            std::fs::write(&output, &car)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("wrote {} ({} blocks) to {}", tree.root, tree.blocks.len(), output.display());
        }
        Commands::Missing { path, gateway } => {
            let blocks = read_input(&path)?.into_blocks()?;
            let driver = UploadDriver::new(options(gateway), DryRunSender)?;
            let missing = driver.missing_blocks(blocks).await?;
            for block in &missing {
                println!("{} {}", block.cid, block.len());
            }
            debug!("{} blocks missing", missing.len());
        }
        Commands::Plan { path, gateway } => {
            let driver = UploadDriver::new(options(gateway), DryRunSender)?;
            let root = match read_input(&path)? {
                Input::Files(files) => driver.upload_files(files).await?,
                Input::Archive(data) => driver.upload_car(&data).await?,
            };
            println!("Root: {}", root);
        }
    }

    Ok(())
}

fn options(gateway: Option<String>) -> UploadOptions {
    let options = UploadOptions::from_config(&Config::load_or_default())
        .with_observer(Arc::new(LogObserver));
    match gateway {
        Some(url) => options.with_gateway(url),
        None => options,
    }
}
