//! A built single-page application on disk

use flate2::read::GzDecoder;
use rstest::fixture;
use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use websrv_conf::Settings;
use websrv_http::{Handler, Method, Request, Response};

pub const NONCE_PLACEHOLDER: &str = "${NONCE}";

pub const INDEX_HTML: &str = concat!(
	"<!doctype html><html><head>",
	"<link rel=\"stylesheet\" href=\"styles.css\">",
	"<script nonce=\"${NONCE}\" src=\"main.js\"></script>",
	"</head><body><app-root></app-root></body></html>\n"
);

pub const MAIN_JS: &str = "window.ngCspNonce = \"${NONCE}\";\nbootstrap();\n";

pub const STYLES_CSS: &str =
	"body { margin: 0; }\nbody { margin: 0; }\nbody { margin: 0; }\nbody { margin: 0; }\n";

/// The site directory, removed on drop
pub struct Site {
	dir: TempDir,
}

impl Site {
	pub fn path(&self) -> &Path {
		self.dir.path()
	}
}

#[fixture]
pub fn site() -> Site {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
	std::fs::write(dir.path().join("main.js"), MAIN_JS).unwrap();
	std::fs::write(dir.path().join("styles.css"), STYLES_CSS).unwrap();
	std::fs::create_dir(dir.path().join("assets")).unwrap();
	std::fs::write(dir.path().join("assets").join("logo.svg"), "<svg/>").unwrap();
	Site { dir }
}

/// Settings exercising every stage, on ephemeral ports with no shutdown delay
pub fn site_settings(memory_fs: bool) -> Settings {
	let mut settings = Settings::default();
	settings.memory_fs = memory_fs;
	settings.fallback = "index.html".to_string();
	settings.health = true;
	settings.port.webserver = 0;
	settings.port.health = 0;
	settings.shutdown_delay = 0;
	settings.timeout.shutdown = 2;

	settings.gzip.enabled = true;
	settings.gzip.compression = 6;
	settings.gzip.media_types = ["text/html", "text/css", "application/javascript"]
		.into_iter()
		.map(String::from)
		.collect();

	settings.headers.insert(
		"content-security-policy".to_string(),
		format!("script-src 'nonce-{}'", NONCE_PLACEHOLDER),
	);
	settings
		.headers
		.insert("x-frame-options".to_string(), "DENY".to_string());

	let csp = &mut settings.angular_csp;
	csp.enabled = true;
	csp.file_path = r"^(index\.html|main\.js)$".to_string();
	csp.variable = NONCE_PLACEHOLDER.to_string();
	csp.session_cookie.name = "Nonce-Id".to_string();
	csp.session_cookie.max_age = 3600;
	settings
}

/// Send a request with `headers` through `handler`
pub async fn get(
	handler: &Arc<dyn Handler>,
	method: Method,
	uri: &str,
	headers: &[(&str, &str)],
) -> Response {
	let mut builder = Request::builder().method(method).uri(uri);
	for (name, value) in headers {
		builder = builder.header(name, value);
	}
	handler.handle(builder.build().unwrap()).await.unwrap()
}

pub fn header_of<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
	response
		.headers
		.get(name)
		.map(|value| value.to_str().unwrap())
}

pub fn gunzip(data: &[u8]) -> String {
	let mut decoded = String::new();
	GzDecoder::new(data).read_to_string(&mut decoded).unwrap();
	decoded
}

/// Write `request` to the loopback address on `addr`'s port and read until
/// the server closes the connection
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
	let loopback = SocketAddr::from(([127, 0, 0, 1], addr.port()));
	let mut stream = TcpStream::connect(loopback).await.unwrap();
	stream.write_all(request.as_bytes()).await.unwrap();

	let mut buffer = Vec::new();
	stream.read_to_end(&mut buffer).await.unwrap();
	String::from_utf8_lossy(&buffer).into_owned()
}
