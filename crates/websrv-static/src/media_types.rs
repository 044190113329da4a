//! Extension based media type lookup and gzip eligibility

use std::collections::{HashMap, HashSet};

/// Media type used when an extension is not in the table
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Returns the extension of the last path element, including the dot
///
/// Empty when the last element has no dot.
///
/// # Examples
///
/// ```
/// use websrv_static::media_types::extension;
///
/// assert_eq!(extension("assets/app.min.js"), ".js");
/// assert_eq!(extension("v1.2/LICENSE"), "");
/// assert_eq!(extension(".hidden"), ".hidden");
/// ```
pub fn extension(path: &str) -> &str {
	let name = path.rsplit('/').next().unwrap_or(path);
	match name.rfind('.') {
		Some(index) => &name[index..],
		None => "",
	}
}

/// Strips parameters from a media type: `text/html; charset=UTF-8` becomes `text/html`
pub fn essence(media_type: &str) -> &str {
	media_type.split(';').next().unwrap_or(media_type).trim()
}

/// Maps file extensions (with leading dot) to media types
#[derive(Debug, Clone, Default)]
pub struct MediaTypeMap {
	by_extension: HashMap<String, String>,
}

impl MediaTypeMap {
	/// Create a table from `(extension, media type)` pairs
	///
	/// # Examples
	///
	/// ```
	/// use websrv_static::media_types::MediaTypeMap;
	///
	/// let map = MediaTypeMap::new([(".css".to_string(), "text/css".to_string())]);
	/// assert_eq!(map.lookup("style/site.css"), "text/css");
	/// assert_eq!(map.lookup("blob.bin"), "application/octet-stream");
	/// ```
	pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
		Self {
			by_extension: entries.into_iter().collect(),
		}
	}

	/// Media type for `path`, or [`DEFAULT_MEDIA_TYPE`]
	pub fn lookup(&self, path: &str) -> &str {
		self.get(extension(path)).unwrap_or(DEFAULT_MEDIA_TYPE)
	}

	/// Media type registered for `extension`, if any
	pub fn get(&self, extension: &str) -> Option<&str> {
		self.by_extension.get(extension).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.by_extension.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_extension.is_empty()
	}
}

/// Decides which paths get gzip variants
///
/// A path is eligible when its extension maps to a media type whose essence is
/// in the eligible set. Unknown extensions are never eligible.
#[derive(Debug, Clone, Default)]
pub struct GzipEligibility {
	media_types: MediaTypeMap,
	eligible: HashSet<String>,
}

impl GzipEligibility {
	/// # Examples
	///
	/// ```
	/// use websrv_static::media_types::{GzipEligibility, MediaTypeMap};
	///
	/// let media_types = MediaTypeMap::new([
	///     (".html".to_string(), "text/html; charset=UTF-8".to_string()),
	///     (".jpg".to_string(), "image/jpeg".to_string()),
	/// ]);
	/// let eligibility = GzipEligibility::new(media_types, ["text/html".to_string()]);
	///
	/// assert!(eligibility.is_eligible("index.html"));
	/// assert!(!eligibility.is_eligible("photo.jpg"));
	/// assert!(!eligibility.is_eligible("README"));
	/// ```
	pub fn new(media_types: MediaTypeMap, eligible: impl IntoIterator<Item = String>) -> Self {
		Self {
			media_types,
			eligible: eligible
				.into_iter()
				.map(|media_type| essence(&media_type).to_ascii_lowercase())
				.collect(),
		}
	}

	pub fn is_eligible(&self, path: &str) -> bool {
		self.media_types
			.get(extension(path))
			.is_some_and(|media_type| {
				self.eligible
					.contains(&essence(media_type).to_ascii_lowercase())
			})
	}

	/// The media type table the eligibility is derived from
	pub fn media_types(&self) -> &MediaTypeMap {
		&self.media_types
	}
}
