//! Single-page application fallback
//!
//! Client-side routes such as `/dashboard/settings` have no file behind them.
//! This stage rewrites the path of any request for a missing entry or a
//! directory to the fallback path, so the stages after it (nonce injection,
//! the content-hash cache) see the file that is actually served.

use async_trait::async_trait;
use std::sync::Arc;
use websrv_http::{Handler, Middleware, Request, Response, Result};
use websrv_static::{FileSystem, FsError};

use crate::timer::log_enter;

/// Rewrites requests for missing files and directories to the fallback path
pub struct FallbackMiddleware {
	fs: Arc<dyn FileSystem>,
	fallback_path: String,
}

impl FallbackMiddleware {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use websrv_middleware::FallbackMiddleware;
	/// use websrv_static::{FileRecord, MemoryFs};
	///
	/// let fs = MemoryFs::from_records([FileRecord::file("index.html", "<p>app</p>", None)]);
	/// let fallback = FallbackMiddleware::new(Arc::new(fs), "index.html");
	/// assert_eq!(fallback.fallback_path(), "index.html");
	/// ```
	pub fn new(fs: Arc<dyn FileSystem>, fallback_path: impl Into<String>) -> Self {
		Self {
			fs,
			fallback_path: fallback_path.into(),
		}
	}

	pub fn fallback_path(&self) -> &str {
		&self.fallback_path
	}
}

#[async_trait]
impl Middleware for FallbackMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "fallback");
		match self.fs.is_file(request.path()).await {
			Ok(true) => {}
			Ok(false) | Err(FsError::NotFound(_)) => {
				tracing::debug!(path = %request.path(), fallback = %self.fallback_path, "serving fallback");
				request.set_path(self.fallback_path.clone());
			}
			Err(error) => {
				tracing::error!(path = %request.path(), error = %error, "could not read file");
				return Err(error.into());
			}
		}
		next.handle(request).await
	}

	fn should_continue(&self, request: &Request) -> bool {
		request.path() != self.fallback_path
	}
}
