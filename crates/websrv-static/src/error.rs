//! Error types for filesystem loading and file lookup

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or reading a virtual filesystem
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FsError {
	/// Reading a file or its metadata failed
	#[error("IO error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Walking the directory tree failed
	#[error("Directory walk failed: {0}")]
	Walk(#[from] walkdir::Error),

	/// No entry exists for the requested path
	#[error("File not found: {0}")]
	NotFound(String),

	/// The entry is a directory and has no content
	#[error("Is a directory: {0}")]
	IsDirectory(String),

	/// Compressing a file failed
	#[error("Compression of {path} failed: {source}")]
	Compression {
		path: String,
		#[source]
		source: std::io::Error,
	},
}

impl FsError {
	/// Maps an IO error for `path`, turning "not found" into [`FsError::NotFound`]
	pub(crate) fn from_io(path: &str, full_path: PathBuf, source: std::io::Error) -> Self {
		if source.kind() == std::io::ErrorKind::NotFound {
			FsError::NotFound(path.to_string())
		} else {
			FsError::Io {
				path: full_path,
				source,
			}
		}
	}
}

/// Result type for filesystem operations
pub type Result<T> = std::result::Result<T, FsError>;

impl From<FsError> for websrv_http::Error {
	fn from(error: FsError) -> Self {
		match error {
			FsError::NotFound(path) | FsError::IsDirectory(path) => websrv_http::Error::NotFound(path),
			other => websrv_http::Error::Internal(other.to_string()),
		}
	}
}
