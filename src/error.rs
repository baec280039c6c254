use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading, editing or saving a single project document.
///
/// Errors never cross file boundaries: the batch driver turns each one into
/// a "failed" line for that file and moves on.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO Error: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML Error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A settings block located earlier in the run is no longer present.
    #[error("{selector} block #{index} not found")]
    BlockNotFound { selector: String, index: usize },

    /// An intermediate element expected under a settings block is absent.
    #[error("<{element}> not found under <{parent}>")]
    MissingElement { element: String, parent: String },

    #[error("<{element}> contains nested elements, refusing to overwrite its text")]
    MixedContent { element: String },
}

impl ProjectError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Name of the element the failure originated from, when there is one.
    pub fn element(&self) -> Option<&str> {
        match self {
            Self::MissingElement { element, .. } | Self::MixedContent { element } => {
                Some(element)
            }
            _ => None,
        }
    }
}
