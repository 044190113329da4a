//! A small single-page application build on disk

use rstest::fixture;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use websrv_static::MediaTypeMap;

/// Temporary site directory, removed on drop
pub struct SiteDir {
	inner: TempDir,
}

impl SiteDir {
	pub fn path(&self) -> &Path {
		self.inner.path()
	}

	pub fn read(&self, relative: &str) -> Vec<u8> {
		fs::read(self.inner.path().join(relative)).unwrap()
	}
}

/// index.html, a script bundle, a stylesheet, an image and a nested directory
#[fixture]
pub fn site_dir() -> SiteDir {
	let temp_dir = TempDir::new().unwrap();
	let root = temp_dir.path();

	fs::write(
		root.join("index.html"),
		"<!doctype html><html><body><app-root></app-root></body></html>",
	)
	.unwrap();
	fs::write(
		root.join("main.js"),
		"console.log('bootstrap');\n".repeat(200),
	)
	.unwrap();
	fs::write(root.join("styles.css"), "body { margin: 0; }\n".repeat(100)).unwrap();
	fs::create_dir_all(root.join("assets/icons")).unwrap();
	fs::write(root.join("assets/logo.jpg"), [0xffu8, 0xd8, 0xff, 0xe0, 0x00]).unwrap();
	fs::write(root.join("assets/icons/readme.txt"), "icons").unwrap();

	SiteDir { inner: temp_dir }
}

/// The default extension table
pub fn media_types() -> MediaTypeMap {
	MediaTypeMap::new(
		[
			(".js", "application/javascript"),
			(".css", "text/css"),
			(".html", "text/html; charset=UTF-8"),
			(".jpg", "image/jpeg"),
			(".txt", "text/plain"),
		]
		.map(|(extension, media_type)| (extension.to_string(), media_type.to_string())),
	)
}
