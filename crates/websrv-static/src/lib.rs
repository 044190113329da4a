//! # websrv-static
//!
//! Static file serving for websrv:
//!
//! - [`filesystem`] - in-memory and on-disk virtual filesystems
//! - [`compression`] - precompressed gzip variants and on-the-fly compression
//! - [`media_types`] - extension to media type table and gzip eligibility
//! - [`fetch`] - the lookup chain choosing compressed, raw or fallback content
//! - [`handler`] - the terminal [`websrv_http::Handler`] serving the result

pub mod compression;
pub mod error;
pub mod fetch;
pub mod filesystem;
pub mod handler;
pub mod media_types;

pub use compression::{DynamicGzip, compress, gzip_bytes};
pub use error::{FsError, Result};
pub use fetch::{Fetch, FetchChain, Fetched};
pub use filesystem::{DirFs, FileRecord, FileSystem, MemoryFs, ROOT_KEY};
pub use handler::FileServerHandler;
pub use media_types::{DEFAULT_MEDIA_TYPE, GzipEligibility, MediaTypeMap};
