//! File lookup chain
//!
//! A request path is resolved by a chain of small fetchers, each of which either
//! answers or hands the lookup to the next one:
//!
//! ```text
//! select(gzip?) -> compressed fs -> raw fs -> fallback -> select(gzip?) -> compressed fs -> raw fs
//! ```
//!
//! Gzip eligibility is decided separately for the requested path and for the
//! fallback path.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::media_types::GzipEligibility;

/// Outcome of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
	pub content: Bytes,
	/// Path that was actually served (the fallback path after a fallback)
	pub served_path: String,
	/// Whether `content` is gzip encoded
	pub compressed: bool,
}

/// One link of the lookup chain
#[async_trait]
pub trait Fetch: Send + Sync {
	/// Resolve `path`
	///
	/// # Errors
	///
	/// Returns [`FsError::NotFound`] when neither this link nor any link after
	/// it can serve the path, and any other read failure unchanged.
	async fn fetch(&self, path: &str, accepts_gzip: bool) -> Result<Fetched>;
}

/// Reads from one filesystem, handing misses and directories to `next`
pub struct FsFetch {
	name: &'static str,
	fs: Arc<dyn FileSystem>,
	compressed: bool,
	next: Option<Arc<dyn Fetch>>,
}

impl FsFetch {
	pub fn new(
		name: &'static str,
		fs: Arc<dyn FileSystem>,
		compressed: bool,
		next: Option<Arc<dyn Fetch>>,
	) -> Self {
		Self {
			name,
			fs,
			compressed,
			next,
		}
	}

	async fn miss(&self, path: &str, accepts_gzip: bool, error: FsError) -> Result<Fetched> {
		tracing::debug!(fetcher = self.name, path, error = %error, "file miss, trying next");
		match &self.next {
			Some(next) => next.fetch(path, accepts_gzip).await,
			None => Err(FsError::NotFound(path.to_string())),
		}
	}
}

#[async_trait]
impl Fetch for FsFetch {
	async fn fetch(&self, path: &str, accepts_gzip: bool) -> Result<Fetched> {
		let record = match self.fs.open(path).await {
			Ok(record) => record,
			Err(FsError::NotFound(_)) => {
				return self
					.miss(path, accepts_gzip, FsError::NotFound(path.to_string()))
					.await;
			}
			Err(other) => {
				tracing::error!(fetcher = self.name, path, error = %other, "could not read file");
				return Err(other);
			}
		};

		match &record.content {
			Some(content) => Ok(Fetched {
				content: content.clone(),
				served_path: path.to_string(),
				compressed: self.compressed,
			}),
			None => {
				self.miss(path, accepts_gzip, FsError::IsDirectory(path.to_string()))
					.await
			}
		}
	}
}

/// Routes to the compressed branch when the client accepts gzip and the path is eligible
pub struct GzipSelect {
	eligibility: GzipEligibility,
	compressed: Option<Arc<dyn Fetch>>,
	raw: Arc<dyn Fetch>,
}

impl GzipSelect {
	pub fn new(
		eligibility: GzipEligibility,
		compressed: Option<Arc<dyn Fetch>>,
		raw: Arc<dyn Fetch>,
	) -> Self {
		Self {
			eligibility,
			compressed,
			raw,
		}
	}
}

#[async_trait]
impl Fetch for GzipSelect {
	async fn fetch(&self, path: &str, accepts_gzip: bool) -> Result<Fetched> {
		if let Some(compressed) = &self.compressed
			&& accepts_gzip
			&& self.eligibility.is_eligible(path)
		{
			return compressed.fetch(path, accepts_gzip).await;
		}
		self.raw.fetch(path, accepts_gzip).await
	}
}

/// Replaces whatever path was requested with the fallback path
pub struct FallbackFetch {
	fallback_path: String,
	next: Arc<dyn Fetch>,
}

impl FallbackFetch {
	pub fn new(fallback_path: impl Into<String>, next: Arc<dyn Fetch>) -> Self {
		Self {
			fallback_path: fallback_path.into(),
			next,
		}
	}
}

#[async_trait]
impl Fetch for FallbackFetch {
	async fn fetch(&self, path: &str, accepts_gzip: bool) -> Result<Fetched> {
		tracing::debug!(path, fallback = %self.fallback_path, "serving fallback");
		self.next.fetch(&self.fallback_path, accepts_gzip).await
	}
}

/// The assembled lookup chain
pub struct FetchChain {
	head: Arc<dyn Fetch>,
}

impl FetchChain {
	/// Assemble the chain
	///
	/// # Arguments
	///
	/// * `raw` - Filesystem with the original content
	/// * `compressed` - Precompressed variants, if any were built
	/// * `eligibility` - Which paths may be served from `compressed`
	/// * `fallback` - Path served when the requested one is missing or a directory
	pub fn new(
		raw: Arc<dyn FileSystem>,
		compressed: Option<Arc<dyn FileSystem>>,
		eligibility: GzipEligibility,
		fallback: Option<String>,
	) -> Self {
		let fallback = fallback.filter(|path| !path.is_empty()).map(|path| {
			let branch = Self::select(&raw, compressed.as_ref(), &eligibility, None);
			Arc::new(FallbackFetch::new(path, branch)) as Arc<dyn Fetch>
		});
		let head = Self::select(&raw, compressed.as_ref(), &eligibility, fallback);
		Self { head }
	}

	fn select(
		raw: &Arc<dyn FileSystem>,
		compressed: Option<&Arc<dyn FileSystem>>,
		eligibility: &GzipEligibility,
		next: Option<Arc<dyn Fetch>>,
	) -> Arc<dyn Fetch> {
		let raw_fetch: Arc<dyn Fetch> = Arc::new(FsFetch::new("raw", raw.clone(), false, next));
		let compressed_fetch = compressed.map(|fs| {
			Arc::new(FsFetch::new(
				"compressed",
				fs.clone(),
				true,
				Some(raw_fetch.clone()),
			)) as Arc<dyn Fetch>
		});
		Arc::new(GzipSelect::new(
			eligibility.clone(),
			compressed_fetch,
			raw_fetch,
		))
	}

	/// Resolve `path` to content
	///
	/// # Errors
	///
	/// Returns [`FsError::NotFound`] when the path and the fallback both miss.
	/// Read failures other than a missing entry are returned without trying
	/// the fallback.
	pub async fn resolve(&self, path: &str, accepts_gzip: bool) -> Result<Fetched> {
		self.head.fetch(path, accepts_gzip).await
	}
}

#[async_trait]
impl Fetch for FetchChain {
	async fn fetch(&self, path: &str, accepts_gzip: bool) -> Result<Fetched> {
		self.resolve(path, accepts_gzip).await
	}
}
