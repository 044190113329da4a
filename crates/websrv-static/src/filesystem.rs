//! Virtual filesystems the fetch chain reads from
//!
//! [`MemoryFs`] loads a whole directory tree at startup and never touches the
//! disk again. [`DirFs`] reads the target directory on every lookup. Both key
//! entries by a slash-separated path relative to the served root, with the root
//! itself stored as `"."`.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{FsError, Result};

/// Key of the served root directory
pub const ROOT_KEY: &str = ".";

/// One file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
	/// Relative, slash-separated path
	pub path: String,
	/// File content; `None` for directories
	pub content: Option<Bytes>,
	/// Length of `content` (the compressed length for gzip variants)
	pub size: u64,
	pub is_dir: bool,
	/// Sorted child names; empty for files
	pub dir_entries: Vec<String>,
	pub modified: Option<SystemTime>,
}

impl FileRecord {
	/// Record for a regular file
	///
	/// # Examples
	///
	/// ```
	/// use websrv_static::FileRecord;
	///
	/// let record = FileRecord::file("app.js", "console.log(1)", None);
	/// assert_eq!(record.size, 14);
	/// assert!(!record.is_dir);
	/// ```
	pub fn file(path: impl Into<String>, content: impl Into<Bytes>, modified: Option<SystemTime>) -> Self {
		let content = content.into();
		Self {
			path: path.into(),
			size: content.len() as u64,
			content: Some(content),
			is_dir: false,
			dir_entries: Vec::new(),
			modified,
		}
	}

	/// Record for a directory listing `entries`
	pub fn directory(path: impl Into<String>, mut entries: Vec<String>, modified: Option<SystemTime>) -> Self {
		entries.sort();
		Self {
			path: path.into(),
			content: None,
			size: 0,
			is_dir: true,
			dir_entries: entries,
			modified,
		}
	}
}

/// Read access to a tree of [`FileRecord`]s
#[async_trait]
pub trait FileSystem: Send + Sync {
	/// Look up the record stored at `path`
	///
	/// # Errors
	///
	/// Returns [`FsError::NotFound`] when no entry exists.
	async fn open(&self, path: &str) -> Result<Arc<FileRecord>>;

	/// Content of the file at `path`
	///
	/// # Errors
	///
	/// Returns [`FsError::NotFound`] when no entry exists and
	/// [`FsError::IsDirectory`] for directories.
	async fn read_file(&self, path: &str) -> Result<Bytes> {
		let record = self.open(path).await?;
		record
			.content
			.clone()
			.ok_or_else(|| FsError::IsDirectory(path.to_string()))
	}

	/// Whether `path` is a file (`true`) or a directory (`false`)
	///
	/// # Errors
	///
	/// Returns [`FsError::NotFound`] when no entry exists.
	async fn is_file(&self, path: &str) -> Result<bool> {
		Ok(!self.open(path).await?.is_dir)
	}
}

/// Immutable in-memory filesystem
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
	files: HashMap<String, Arc<FileRecord>>,
}

impl MemoryFs {
	/// Load every file and directory below `root` into memory
	///
	/// Symbolic links are followed. The first walk or read error aborts the
	/// whole load.
	///
	/// # Errors
	///
	/// Returns [`FsError::Walk`] or [`FsError::Io`] for the first failure.
	pub fn build(root: impl AsRef<Path>) -> Result<Self> {
		let root = root.as_ref();
		let mut files = Vec::new();
		let mut directories = Vec::new();
		let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();

		for entry in WalkDir::new(root).follow_links(true) {
			let entry = entry?;
			let key = relative_key(root, entry.path());
			let modified = entry.metadata()?.modified().ok();

			if key != ROOT_KEY {
				let (parent, name) = split_parent(&key);
				children
					.entry(parent.to_string())
					.or_default()
					.push(name.to_string());
			}

			if entry.file_type().is_dir() {
				directories.push((key, modified));
			} else {
				let content = std::fs::read(entry.path()).map_err(|source| FsError::Io {
					path: entry.path().to_path_buf(),
					source,
				})?;
				tracing::debug!(path = %key, size = content.len(), "read into memory filesystem");
				files.push(FileRecord::file(key, content, modified));
			}
		}

		let directories = directories.into_iter().map(|(key, modified)| {
			let entries = children.remove(&key).unwrap_or_default();
			FileRecord::directory(key, entries, modified)
		});

		let fs = Self::from_records(files.into_iter().chain(directories));
		tracing::info!(root = %root.display(), entries = fs.len(), "loaded memory filesystem");
		Ok(fs)
	}

	/// Build a filesystem from prepared records, keyed by their `path`
	pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
		Self {
			files: records
				.into_iter()
				.map(|record| (record.path.clone(), Arc::new(record)))
				.collect(),
		}
	}

	pub fn get(&self, path: &str) -> Option<&Arc<FileRecord>> {
		self.files.get(path)
	}

	pub fn records(&self) -> impl Iterator<Item = &Arc<FileRecord>> {
		self.files.values()
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

#[async_trait]
impl FileSystem for MemoryFs {
	async fn open(&self, path: &str) -> Result<Arc<FileRecord>> {
		self.files
			.get(path)
			.cloned()
			.ok_or_else(|| FsError::NotFound(path.to_string()))
	}
}

/// Filesystem reading from a directory on every lookup
#[derive(Debug, Clone)]
pub struct DirFs {
	root: PathBuf,
}

impl DirFs {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Resolve `path` below the root, refusing anything that could escape it
	fn resolve(&self, path: &str) -> Option<PathBuf> {
		if path == ROOT_KEY {
			return Some(self.root.clone());
		}
		let relative = Path::new(path);
		relative
			.components()
			.all(|component| matches!(component, Component::Normal(_)))
			.then(|| self.root.join(relative))
	}
}

#[async_trait]
impl FileSystem for DirFs {
	async fn open(&self, path: &str) -> Result<Arc<FileRecord>> {
		let full_path = self
			.resolve(path)
			.ok_or_else(|| FsError::NotFound(path.to_string()))?;

		let metadata = tokio::fs::metadata(&full_path)
			.await
			.map_err(|e| FsError::from_io(path, full_path.clone(), e))?;
		let modified = metadata.modified().ok();

		if metadata.is_dir() {
			let mut reader = tokio::fs::read_dir(&full_path)
				.await
				.map_err(|e| FsError::from_io(path, full_path.clone(), e))?;
			let mut entries = Vec::new();
			while let Some(entry) = reader
				.next_entry()
				.await
				.map_err(|e| FsError::from_io(path, full_path.clone(), e))?
			{
				entries.push(entry.file_name().to_string_lossy().into_owned());
			}
			return Ok(Arc::new(FileRecord::directory(path, entries, modified)));
		}

		let content = tokio::fs::read(&full_path)
			.await
			.map_err(|e| FsError::from_io(path, full_path.clone(), e))?;
		Ok(Arc::new(FileRecord::file(path, content, modified)))
	}

	async fn is_file(&self, path: &str) -> Result<bool> {
		let full_path = self
			.resolve(path)
			.ok_or_else(|| FsError::NotFound(path.to_string()))?;
		let metadata = tokio::fs::metadata(&full_path)
			.await
			.map_err(|e| FsError::from_io(path, full_path.clone(), e))?;
		Ok(!metadata.is_dir())
	}
}

/// Slash-separated key of `path` relative to `root`
fn relative_key(root: &Path, path: &Path) -> String {
	let relative = path.strip_prefix(root).unwrap_or(path);
	let key = relative
		.components()
		.map(|component| component.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/");
	if key.is_empty() { ROOT_KEY.to_string() } else { key }
}

/// Splits `a/b/c` into (`a/b`, `c`) and `c` into (`.`, `c`)
fn split_parent(key: &str) -> (&str, &str) {
	key.rsplit_once('/').unwrap_or((ROOT_KEY, key))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::fs;
	use tempfile::TempDir;

	fn sample_tree() -> TempDir {
		let temp_dir = TempDir::new().unwrap();
		fs::write(temp_dir.path().join("index.html"), "<html></html>").unwrap();
		fs::create_dir_all(temp_dir.path().join("assets/img")).unwrap();
		fs::write(temp_dir.path().join("assets/app.js"), "let a = 1;").unwrap();
		fs::write(temp_dir.path().join("assets/img/logo.svg"), "<svg/>").unwrap();
		temp_dir
	}

	#[rstest]
	#[case("a", (".", "a"))]
	#[case("a/b", ("a", "b"))]
	#[case("a/b/c.js", ("a/b", "c.js"))]
	fn test_split_parent(#[case] key: &str, #[case] expected: (&str, &str)) {
		assert_eq!(split_parent(key), expected);
	}

	#[rstest]
	fn test_build_keys_and_listings() {
		let tree = sample_tree();

		let memory_fs = MemoryFs::build(tree.path()).unwrap();

		let root = memory_fs.get(ROOT_KEY).unwrap();
		assert!(root.is_dir);
		assert_eq!(root.dir_entries, vec!["assets", "index.html"]);

		let assets = memory_fs.get("assets").unwrap();
		assert_eq!(assets.dir_entries, vec!["app.js", "img"]);

		let logo = memory_fs.get("assets/img/logo.svg").unwrap();
		assert_eq!(logo.content.as_deref(), Some(&b"<svg/>"[..]));
		assert_eq!(logo.size, 6);
		assert_eq!(memory_fs.len(), 6);
	}

	#[rstest]
	fn test_build_missing_root_fails() {
		let temp_dir = TempDir::new().unwrap();

		let result = MemoryFs::build(temp_dir.path().join("missing"));

		assert!(matches!(result, Err(FsError::Walk(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_read_file_on_directory() {
		let memory_fs = MemoryFs::from_records([FileRecord::directory("assets", vec![], None)]);

		let result = memory_fs.read_file("assets").await;

		assert!(matches!(result, Err(FsError::IsDirectory(path)) if path == "assets"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_open_missing() {
		let memory_fs = MemoryFs::default();

		let result = memory_fs.open("nope.txt").await;

		assert!(matches!(result, Err(FsError::NotFound(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_dir_fs_reads_from_disk() {
		let tree = sample_tree();
		let dir_fs = DirFs::new(tree.path());

		let content = dir_fs.read_file("assets/app.js").await.unwrap();
		let root = dir_fs.open(ROOT_KEY).await.unwrap();

		assert_eq!(content, Bytes::from("let a = 1;"));
		assert_eq!(root.dir_entries, vec!["assets", "index.html"]);
	}

	#[rstest]
	#[case("../etc/passwd")]
	#[case("/etc/passwd")]
	#[case("assets/../../secret")]
	#[tokio::test]
	async fn test_dir_fs_refuses_escaping_paths(#[case] path: &str) {
		let tree = sample_tree();
		let dir_fs = DirFs::new(tree.path());

		let result = dir_fs.open(path).await;

		assert!(matches!(result, Err(FsError::NotFound(_))));
	}

	#[rstest]
	#[case("index.html", Some(true))]
	#[case("assets/img", Some(false))]
	#[case(".", Some(false))]
	#[case("missing.css", None)]
	#[tokio::test]
	async fn test_is_file_memory_and_disk(#[case] path: &str, #[case] expected: Option<bool>) {
		let tree = sample_tree();
		let memory_fs = MemoryFs::build(tree.path()).unwrap();
		let dir_fs = DirFs::new(tree.path());

		for fs in [&memory_fs as &dyn FileSystem, &dir_fs] {
			match fs.is_file(path).await {
				Ok(is_file) => assert_eq!(Some(is_file), expected, "{}", path),
				Err(error) => {
					assert!(matches!(error, FsError::NotFound(_)));
					assert_eq!(expected, None, "{}", path);
				}
			}
		}
	}
}
