//! Assembling the request pipelines from settings
//!
//! A [`Pipeline`] is an ordered list of named stages in front of a terminal
//! handler. The webserver pipeline uses these stages, outer to inner, leaving
//! out the ones the settings disable:
//!
//! | Stage | Present when |
//! |-------|--------------|
//! | `request-id` | always |
//! | `timer` | always |
//! | `write-timeout` | `timeout.write > 0` |
//! | `access-log` | `log.access.general` |
//! | `validate` | always |
//! | `fallback` | `fallback` is set |
//! | `session-cookie` | `angularcsp.enabled` |
//! | `csp-header` | `angularcsp.enabled` |
//! | `static-headers` | `headers` is not empty |
//! | `csp-file` | `angularcsp.enabled` |
//! | `content-hash-cache` | always |

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use websrv_conf::Settings;
use websrv_http::{Handler, Middleware, MiddlewareChain};
use websrv_middleware::{
	AccessLogMiddleware, ContentHashCacheMiddleware, CspFileMiddleware, CspHeaderMiddleware,
	FallbackMiddleware, RequestIdMiddleware, SessionCookieConfig, SessionCookieMiddleware, StaticHeadersMiddleware,
	TimerMiddleware, ValidateCleanMiddleware, WriteTimeoutMiddleware,
};
use websrv_server::HealthHandler;
use websrv_static::{
	DirFs, DynamicGzip, FetchChain, FileServerHandler, FileSystem, GzipEligibility, MediaTypeMap,
	MemoryFs, compress,
};

use crate::error::{AppError, Result};

pub const REQUEST_ID: &str = "request-id";
pub const TIMER: &str = "timer";
pub const WRITE_TIMEOUT: &str = "write-timeout";
pub const ACCESS_LOG: &str = "access-log";
pub const VALIDATE: &str = "validate";
pub const FALLBACK: &str = "fallback";
pub const SESSION_COOKIE: &str = "session-cookie";
pub const CSP_HEADER: &str = "csp-header";
pub const STATIC_HEADERS: &str = "static-headers";
pub const CSP_FILE: &str = "csp-file";
pub const CONTENT_HASH_CACHE: &str = "content-hash-cache";

/// A middleware with the name it is reported under
#[derive(Clone)]
pub struct Stage {
	name: &'static str,
	middleware: Arc<dyn Middleware>,
}

impl Stage {
	pub fn new(name: &'static str, middleware: Arc<dyn Middleware>) -> Self {
		Self { name, middleware }
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl fmt::Debug for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Stage").field(&self.name).finish()
	}
}

/// Ordered stages in front of a terminal handler
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use websrv::pipeline::{Pipeline, TIMER};
/// use websrv_middleware::TimerMiddleware;
/// use websrv_server::HealthHandler;
///
/// let pipeline = Pipeline::new("health", Arc::new(HealthHandler))
///     .with_stage(TIMER, Arc::new(TimerMiddleware::new()))
///     .with_optional_stage(false, "never", || Arc::new(TimerMiddleware::new()));
///
/// assert_eq!(pipeline.stage_names(), vec!["timer"]);
/// assert_eq!(pipeline.handler_name(), "health");
/// ```
pub struct Pipeline {
	stages: Vec<Stage>,
	handler_name: &'static str,
	handler: Arc<dyn Handler>,
}

impl Pipeline {
	pub fn new(handler_name: &'static str, handler: Arc<dyn Handler>) -> Self {
		Self {
			stages: Vec::new(),
			handler_name,
			handler,
		}
	}

	/// Append a stage inside the ones already added
	pub fn with_stage(mut self, name: &'static str, middleware: Arc<dyn Middleware>) -> Self {
		self.stages.push(Stage::new(name, middleware));
		self
	}

	/// Append the stage built by `build` only when `enabled`
	pub fn with_optional_stage<F>(self, enabled: bool, name: &'static str, build: F) -> Self
	where
		F: FnOnce() -> Arc<dyn Middleware>,
	{
		if enabled {
			self.with_stage(name, build())
		} else {
			self
		}
	}

	pub fn stages(&self) -> &[Stage] {
		&self.stages
	}

	/// Stage names, outermost first
	pub fn stage_names(&self) -> Vec<&'static str> {
		self.stages.iter().map(Stage::name).collect()
	}

	pub fn handler_name(&self) -> &'static str {
		self.handler_name
	}

	/// Compose the stages around the handler
	pub fn into_handler(self) -> Arc<dyn Handler> {
		self.stages
			.into_iter()
			.fold(MiddlewareChain::new(self.handler), |chain, stage| {
				chain.with_middleware(stage.middleware)
			})
			.into_handler()
	}
}

impl fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pipeline")
			.field("stages", &self.stage_names())
			.field("handler", &self.handler_name)
			.finish()
	}
}

/// The file serving pipeline for `target_dir`
///
/// With `memoryfs` the directory is loaded once and, when gzip is enabled,
/// compressed variants are built up front. Otherwise files are read per
/// request and eligible responses are compressed on the fly.
///
/// # Errors
///
/// Returns [`AppError::Filesystem`] when loading or compressing the directory
/// fails, [`AppError::Header`] for an unusable static header and
/// [`AppError::FilePattern`] for an invalid `angularcsp.filepath`.
pub fn webserver_pipeline(settings: &Settings, target_dir: &Path) -> Result<Pipeline> {
	let media_types = MediaTypeMap::new(settings.media_types.clone());
	let gzip_media_types = if settings.gzip.enabled {
		settings.gzip.media_types.clone()
	} else {
		Vec::new()
	};
	let eligibility = GzipEligibility::new(media_types.clone(), gzip_media_types);
	let dynamic_gzip = settings
		.gzip
		.enabled
		.then(|| DynamicGzip::new(eligibility.clone(), settings.gzip.compression));

	let raw: Arc<dyn FileSystem>;
	let file_server = if settings.memory_fs {
		let memory_fs = MemoryFs::build(target_dir)?;
		let compressed = if settings.gzip.enabled {
			let compressed = compress(&memory_fs, &eligibility)?;
			tracing::info!(files = compressed.len(), "built compressed variants");
			Some(Arc::new(compressed) as Arc<dyn FileSystem>)
		} else {
			None
		};
		raw = Arc::new(memory_fs);
		let chain = FetchChain::new(
			raw.clone(),
			compressed,
			eligibility,
			settings.fallback_path().map(str::to_string),
		);
		FileServerHandler::new(Arc::new(chain), media_types.clone())
	} else {
		tracing::info!(root = %target_dir.display(), "serving from the os filesystem");
		raw = Arc::new(DirFs::new(target_dir));
		let chain = FetchChain::new(
			raw.clone(),
			None,
			eligibility,
			settings.fallback_path().map(str::to_string),
		);
		let handler = FileServerHandler::new(Arc::new(chain), media_types.clone());
		match &dynamic_gzip {
			Some(dynamic_gzip) => handler.with_dynamic_gzip(dynamic_gzip.clone()),
			None => handler,
		}
	};

	let csp = &settings.angular_csp;
	let csp_file = if csp.enabled {
		let middleware =
			CspFileMiddleware::new(Regex::new(&csp.file_path)?, csp.variable.clone(), media_types);
		Some(match dynamic_gzip {
			Some(dynamic_gzip) => middleware.with_dynamic_gzip(dynamic_gzip),
			None => middleware,
		})
	} else {
		None
	};
	let static_headers = StaticHeadersMiddleware::new(
		settings
			.headers
			.iter()
			.map(|(name, value)| (name.as_str(), value.as_str())),
	)
	.map_err(AppError::Header)?;

	let pipeline = Pipeline::new("file-server", Arc::new(file_server))
		.with_stage(REQUEST_ID, Arc::new(RequestIdMiddleware::new()))
		.with_stage(TIMER, Arc::new(TimerMiddleware::new()))
		.with_optional_stage(settings.timeout.write > 0, WRITE_TIMEOUT, || {
			Arc::new(WriteTimeoutMiddleware::new(settings.timeout.write()))
		})
		.with_optional_stage(settings.log.access.general, ACCESS_LOG, || {
			Arc::new(AccessLogMiddleware::new())
		})
		.with_stage(VALIDATE, Arc::new(ValidateCleanMiddleware::new()))
		.with_optional_stage(settings.fallback_path().is_some(), FALLBACK, || {
			Arc::new(FallbackMiddleware::new(raw, settings.fallback.clone()))
		})
		.with_optional_stage(csp.enabled, SESSION_COOKIE, || {
			Arc::new(SessionCookieMiddleware::new(SessionCookieConfig::new(
				csp.session_cookie.name.clone(),
				std::time::Duration::from_secs(csp.session_cookie.max_age),
			)))
		})
		.with_optional_stage(csp.enabled, CSP_HEADER, || {
			Arc::new(CspHeaderMiddleware::new(csp.variable.clone()))
		})
		.with_optional_stage(!static_headers.is_empty(), STATIC_HEADERS, || {
			Arc::new(static_headers)
		});
	let pipeline = match csp_file {
		Some(csp_file) => pipeline.with_stage(CSP_FILE, Arc::new(csp_file)),
		None => pipeline,
	};

	Ok(pipeline.with_stage(CONTENT_HASH_CACHE, Arc::new(ContentHashCacheMiddleware::new())))
}

/// The health endpoint, access logged when `log.access.health` is set
pub fn health_pipeline(settings: &Settings) -> Pipeline {
	Pipeline::new("health", Arc::new(HealthHandler)).with_optional_stage(
		settings.log.access.health,
		ACCESS_LOG,
		|| Arc::new(AccessLogMiddleware::new()),
	)
}
