//! Helpers shared by the `dagpush` binary

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dagpush_core::{build_tree, read_car, Block, SourceFile};
use dagpush_upload::{Progress, UploadObserver};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Upload input: a file tree or an existing CAR archive
#[derive(Debug)]
pub enum Input {
    Files(Vec<SourceFile>),
    Archive(Vec<u8>),
}

impl Input {
    /// Blocks in upload order (root last)
    pub fn into_blocks(self) -> Result<Vec<Block>> {
        Ok(match self {
            Input::Files(files) => build_tree(files)?.blocks,
            Input::Archive(data) => read_car(&data)?,
        })
    }
}

/// `.car` files are read as archives, anything else as a file tree
pub fn read_input(path: &Path) -> Result<Input> {
    if path.is_file() && path.extension().is_some_and(|ext| ext == "car") {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Input::Archive(data));
    }
    Ok(Input::Files(read_source(path)?))
}

/// Read a file or directory into source files
///
/// A single file becomes one entry named after the file. A directory is
/// walked recursively; paths are relative to it and joined with `/`.
pub fn read_source(path: &Path) -> Result<Vec<SourceFile>> {
    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("Path has no file name")?;
        let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(vec![SourceFile::new(name, content)]);
    }
    if !path.is_dir() {
        bail!("Not a file or directory: {}", path.display());
    }

    let mut files = Vec::new();
    walk_dir(path, "", &mut files)?;
    Ok(files)
}

fn walk_dir(dir: &Path, prefix: &str, files: &mut Vec<SourceFile>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };

        if path.is_dir() {
            walk_dir(&path, &relative, files)?;
        } else {
            let content =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            files.push(SourceFile::new(relative, content));
        }
    }
    Ok(())
}

/// Forwards driver progress to the log
pub struct LogObserver;

impl UploadObserver for LogObserver {
    fn on_progress(&self, progress: Progress) {
        info!(
            "Progress: {}/{} blocks",
            progress.current_blocks, progress.total_blocks
        );
    }
}

/// Default levels per crate target, applied on top of `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVES: &[&str] = &[
    "dagpush=info",
    "dagpush_cli=info",
    "dagpush_upload=info",
    "dagpush_gateway=warn",
];

pub fn log_filter() -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}
