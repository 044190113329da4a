//! Gzip variants of the in-memory filesystem

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

use crate::error::{FsError, Result};
use crate::filesystem::{FileRecord, MemoryFs};
use crate::media_types::GzipEligibility;

/// Gzip `data` at `level` (0 to 9)
///
/// # Examples
///
/// ```
/// use websrv_static::compression::gzip_bytes;
///
/// let zipped = gzip_bytes(b"hello hello hello", 9).unwrap();
/// assert_eq!(&zipped[..2], &[0x1f, 0x8b]);
/// ```
pub fn gzip_bytes(data: &[u8], level: u32) -> std::io::Result<Bytes> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
	encoder.write_all(data)?;
	Ok(Bytes::from(encoder.finish()?))
}

/// On-the-fly compression of responses that have no precompressed variant
#[derive(Debug, Clone)]
pub struct DynamicGzip {
	eligibility: GzipEligibility,
	level: u32,
}

impl DynamicGzip {
	pub fn new(eligibility: GzipEligibility, level: u32) -> Self {
		Self { eligibility, level }
	}

	/// Whether a response for `path` should be compressed
	pub fn applies(&self, path: &str, accepts_gzip: bool) -> bool {
		accepts_gzip && self.eligibility.is_eligible(path)
	}

	/// Compress `data` at the configured level
	pub fn compress(&self, data: &[u8]) -> std::io::Result<Bytes> {
		gzip_bytes(data, self.level)
	}
}

/// Build the compressed companion of `base`
///
/// Every regular file whose path is gzip-eligible is compressed at the best
/// level; its `size` becomes the compressed length. Directories and ineligible
/// files are left out.
///
/// # Errors
///
/// Returns [`FsError::Compression`] for the first file that fails to compress.
pub fn compress(base: &MemoryFs, eligibility: &GzipEligibility) -> Result<MemoryFs> {
	let mut records = Vec::new();

	for record in base.records() {
		let Some(content) = record.content.as_ref() else {
			continue;
		};
		if !eligibility.is_eligible(&record.path) {
			continue;
		}

		let zipped = gzip_bytes(content, Compression::best().level()).map_err(|source| {
			FsError::Compression {
				path: record.path.clone(),
				source,
			}
		})?;
		tracing::debug!(
			path = %record.path,
			raw = record.size,
			compressed = zipped.len(),
			"compressed file"
		);
		records.push(FileRecord::file(record.path.clone(), zipped, record.modified));
	}

	Ok(MemoryFs::from_records(records))
}
