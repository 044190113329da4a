use std::path::PathBuf;

/// Errors that prevent websrv from starting or keep it from running
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	Settings(#[from] websrv_conf::SettingsError),

	#[error("Target directory {0} is not a directory")]
	TargetDir(PathBuf),

	#[error("Failed to prepare the filesystem: {0}")]
	Filesystem(#[from] websrv_static::FsError),

	#[error("Invalid static header: {0}")]
	Header(#[source] websrv_http::Error),

	#[error("Invalid angularcsp.filepath: {0}")]
	FilePattern(#[from] regex::Error),

	#[error("Failed to install the log subscriber: {0}")]
	Logging(String),

	#[error(transparent)]
	Server(#[from] websrv_server::ServerError),

	#[error("Server task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AppError>;
