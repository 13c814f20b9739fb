//! The failure type that stops a build.
//!
//! Everything in the pipeline aborts the same way: a message meant for
//! the person running the build. I/O failures keep the offending path and
//! source error attached so the message can point at a file.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AbortError>;

#[derive(Debug, Error)]
pub enum AbortError {
    #[error("{0}")]
    Message(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AbortError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Curried constructor for `map_err` on filesystem calls.
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_display() {
        let err = AbortError::msg("the build went sideways");
        assert_eq!(format!("{err}"), "the build went sideways");
    }

    #[test]
    fn test_io_display_names_path() {
        let err = AbortError::io(Path::new("site/index.md"))(io::Error::new(
            io::ErrorKind::NotFound,
            "not found",
        ));
        let message = format!("{err}");
        assert!(message.contains("site/index.md"));
        assert!(message.contains("not found"));
    }
}
