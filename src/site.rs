//! The website model: a source tree and its default output location.

use crate::error::{AbortError, Result};
use std::path::{Path, PathBuf};

/// Name of the default output directory inside the site root.
pub const OUTPUT: &str = "output";

/// A source tree rooted at `path`. The pipeline only reads it; all writes
/// go to the output location.
#[derive(Debug, Clone)]
pub struct Site {
    /// Absolute path of the site root.
    pub path: PathBuf,
}

impl Site {
    /// Validate and absolutize the site root.
    pub fn new(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(AbortError::msg(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        let path = std::path::absolute(path).map_err(AbortError::io(path))?;
        Ok(Self { path })
    }

    /// The default output root, used when no override is configured.
    pub fn output_root(&self) -> PathBuf {
        self.path.join(OUTPUT)
    }
}
