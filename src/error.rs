//! Build pipeline errors.
//!
//! Every fatal error names the file (or generated listing) it came from.
//! `UndefinedReference` is only returned under `[build] undefined = "strict"`;
//! otherwise it is reported as a warning and rendering continues.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed metadata in `{}`: {message}", path.display())]
    MalformedMetadata { path: PathBuf, message: String },

    #[error("no template for layout `{layout}` (required by `{source_name}`)")]
    TemplateNotFound { layout: String, source_name: String },

    #[error("template syntax error")]
    TemplateSyntax(#[source] tera::Error),

    #[error("template rendering failed for `{source_name}`: {message}")]
    Render { source_name: String, message: String },

    #[error("undefined reference `{reference}` while rendering `{source_name}`")]
    UndefinedReference {
        reference: String,
        source_name: String,
    },

    #[error("output conflict: `{}` is produced by both `{first}` and `{second}`", output.display())]
    OutputConflict {
        output: PathBuf,
        first: String,
        second: String,
    },

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::MalformedMetadata {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
