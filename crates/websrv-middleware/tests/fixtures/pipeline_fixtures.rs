//! The inner request pipeline over an in-memory site

use regex::Regex;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;
use websrv_http::{Handler, Method, MiddlewareChain, Request, Response};
use websrv_middleware::{
	ContentHashCacheMiddleware, CspFileMiddleware, CspHeaderMiddleware, FallbackMiddleware,
	SessionCookieConfig, SessionCookieMiddleware, StaticHeadersMiddleware,
	ValidateCleanMiddleware,
};
use websrv_static::{
	FetchChain, FileRecord, FileServerHandler, FileSystem, GzipEligibility, MediaTypeMap, MemoryFs,
	compress,
};

pub const NONCE_PLACEHOLDER: &str = "${NONCE}";

/// validate, fallback, session-cookie, csp-header, static-headers, csp-file
/// and content-hash-cache in front of the file server
pub struct Pipeline {
	handler: Arc<dyn Handler>,
	pub cache: Arc<ContentHashCacheMiddleware>,
	pub csp_file: Arc<CspFileMiddleware>,
}

async fn send(
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

impl Pipeline {
	pub async fn send(&self, method: Method, uri: &str, headers: &[(&str, &str)]) -> Response {
		send(&self.handler, method, uri, headers).await
	}

	pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
		self.send(Method::GET, uri, headers).await
	}
}

fn media_types() -> MediaTypeMap {
	MediaTypeMap::new(
		[
			(".js", "application/javascript"),
			(".css", "text/css"),
			(".html", "text/html; charset=UTF-8"),
		]
		.map(|(extension, media_type)| (extension.to_string(), media_type.to_string())),
	)
}

fn site() -> MemoryFs {
	MemoryFs::from_records([
		FileRecord::file(
			"index.html",
			"<html><style nonce=\"${NONCE}\"></style><app-root></app-root></html>",
			None,
		),
		FileRecord::file("main.js", "ngCspNonce='${NONCE}';bootstrap();", None),
		FileRecord::file("styles.css", "body { margin: 0; }\n".repeat(50), None),
		FileRecord::directory("assets", vec!["logo.svg".to_string()], None),
		FileRecord::file("assets/logo.svg", "<svg/>", None),
	])
}

fn file_server(raw: Arc<MemoryFs>) -> Arc<FileServerHandler> {
	let eligibility = GzipEligibility::new(
		media_types(),
		["text/css", "text/html", "application/javascript"].map(String::from),
	);
	let compressed = compress(&raw, &eligibility).unwrap();
	let chain = FetchChain::new(
		raw,
		Some(Arc::new(compressed) as Arc<dyn FileSystem>),
		eligibility,
		Some("index.html".to_string()),
	);
	Arc::new(FileServerHandler::new(Arc::new(chain), media_types()))
}

#[fixture]
pub fn pipeline() -> Pipeline {
	let raw = Arc::new(site());

	let cache = Arc::new(ContentHashCacheMiddleware::new());
	let csp_file = Arc::new(CspFileMiddleware::new(
		Regex::new(r"^(index\.html|main\.js)$").unwrap(),
		NONCE_PLACEHOLDER,
		media_types(),
	));
	let handler = MiddlewareChain::new(file_server(raw.clone()))
		.with_middleware(Arc::new(ValidateCleanMiddleware::new()))
		.with_middleware(Arc::new(FallbackMiddleware::new(raw, "index.html")))
		.with_middleware(Arc::new(SessionCookieMiddleware::new(
			SessionCookieConfig::new("Nonce-Id", Duration::from_secs(3600)),
		)))
		.with_middleware(Arc::new(CspHeaderMiddleware::new(NONCE_PLACEHOLDER)))
		.with_middleware(Arc::new(
			StaticHeadersMiddleware::new([
				(
					"Content-Security-Policy",
					"default-src 'self'; style-src 'self' 'nonce-${NONCE}'",
				),
				("X-Frame-Options", "DENY"),
			])
			.unwrap(),
		))
		.with_middleware(csp_file.clone())
		.with_middleware(cache.clone())
		.into_handler();

	Pipeline {
		handler,
		cache,
		csp_file,
	}
}

/// validate, fallback and content-hash-cache only, so every file reaches the cache
pub struct CachedPipeline {
	handler: Arc<dyn Handler>,
	pub cache: Arc<ContentHashCacheMiddleware>,
}

impl CachedPipeline {
	pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
		send(&self.handler, Method::GET, uri, headers).await
	}
}

#[fixture]
pub fn cached_pipeline() -> CachedPipeline {
	let raw = Arc::new(site());
	let cache = Arc::new(ContentHashCacheMiddleware::new());
	let handler = MiddlewareChain::new(file_server(raw.clone()))
		.with_middleware(Arc::new(ValidateCleanMiddleware::new()))
		.with_middleware(Arc::new(FallbackMiddleware::new(raw, "index.html")))
		.with_middleware(cache.clone())
		.into_handler();

	CachedPipeline { handler, cache }
}
