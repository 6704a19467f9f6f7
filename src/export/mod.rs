//! Writes one compose file per stack.
//!
//! The I/O boundary of the exporter: rendering is pure, writing overwrites
//! `{stack}.yml` in the target directory without warning, and a failure
//! mid-run leaves earlier files in place.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::compose::ComposeStack;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to encode stack '{stack}': {source}")]
    Yaml {
        stack: String,
        source: serde_yaml::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Render one stack to its YAML document.
pub fn render_stack(stack: &ComposeStack) -> Result<String, ExportError> {
    serde_yaml::to_string(stack).map_err(|source| ExportError::Yaml {
        stack: stack.name.clone(),
        source,
    })
}

/// Write `{stack}.yml` for every stack into `dir`, overwriting existing
/// files. Returns the number of files written.
pub fn export_stacks(stacks: &[ComposeStack], dir: &Path) -> Result<usize, ExportError> {
    for stack in stacks {
        let rendered = render_stack(stack)?;
        let path = dir.join(stack.file_name());
        fs::write(&path, rendered).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote {}", path.display());
    }
    Ok(stacks.len())
}
