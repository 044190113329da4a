//! Nonce substitution in file bodies
//!
//! For paths matching the configured pattern the file is fetched once from
//! the rest of the pipeline, uncompressed, and compiled into a
//! [`ReplacerPlan`]. Every request then renders the plan with its session
//! nonce without calling the rest of the pipeline again.

use async_trait::async_trait;
use dashmap::DashMap;
use hyper::header::{self, HeaderValue};
use hyper::{Method, StatusCode};
use regex::Regex;
use std::sync::Arc;
use websrv_http::{Handler, Middleware, Request, Response, Result};
use websrv_static::{DynamicGzip, MediaTypeMap};

use crate::csp::session_nonce;
use crate::replacer::{Placeholder, ReplacerPlan};
use crate::timer::log_enter;

/// Body of the response when a templated file cannot be captured
pub const TEMPLATE_ERROR_MESSAGE: &str = "Error serving file.";

/// Serves templated files with the session nonce substituted
pub struct CspFileMiddleware {
	file_pattern: Regex,
	placeholder: Placeholder,
	media_types: MediaTypeMap,
	dynamic_gzip: Option<DynamicGzip>,
	plans: DashMap<String, Arc<ReplacerPlan>>,
}

impl CspFileMiddleware {
	/// # Examples
	///
	/// ```
	/// use regex::Regex;
	/// use websrv_middleware::CspFileMiddleware;
	/// use websrv_static::MediaTypeMap;
	///
	/// let middleware = CspFileMiddleware::new(
	///     Regex::new(r"^main.*\.js$").unwrap(),
	///     "${NONCE}",
	///     MediaTypeMap::default(),
	/// );
	/// assert_eq!(middleware.plan_count(), 0);
	/// ```
	pub fn new(
		file_pattern: Regex,
		placeholder: impl Into<String>,
		media_types: MediaTypeMap,
	) -> Self {
		Self {
			file_pattern,
			placeholder: Placeholder::new(placeholder),
			media_types,
			dynamic_gzip: None,
			plans: DashMap::new(),
		}
	}

	/// Compress rendered bodies for clients accepting gzip
	pub fn with_dynamic_gzip(mut self, dynamic_gzip: DynamicGzip) -> Self {
		self.dynamic_gzip = Some(dynamic_gzip);
		self
	}

	/// The retained plan for `path`, if one was compiled
	pub fn plan(&self, path: &str) -> Option<Arc<ReplacerPlan>> {
		self.plans.get(path).map(|entry| Arc::clone(entry.value()))
	}

	pub fn plan_count(&self) -> usize {
		self.plans.len()
	}

	/// Fetch the file from `next` and compile its plan
	///
	/// Concurrent first requests may each compile a plan; the first one
	/// inserted is kept and returned to all of them.
	async fn load(&self, mut request: Request, next: Arc<dyn Handler>) -> Option<Arc<ReplacerPlan>> {
		let path = request.path().to_string();
		request.method = Method::GET;
		request.headers.remove(header::ACCEPT_ENCODING);
		request.headers.remove(header::IF_NONE_MATCH);

		let response = match next.handle(request).await {
			Ok(response) if response.status == StatusCode::OK => response,
			Ok(response) => {
				tracing::error!(path = %path, status = %response.status, "error serving template file");
				return None;
			}
			Err(error) => {
				tracing::error!(path = %path, error = %error, "error serving template file");
				return None;
			}
		};
		if response.headers.contains_key(header::CONTENT_ENCODING) {
			tracing::error!(path = %path, "template file was served encoded");
			return None;
		}

		let plan = Arc::new(self.placeholder.compile(response.body));
		tracing::debug!(path = %path, markers = plan.nonce_count(), "compiled template plan");
		Some(Arc::clone(self.plans.entry(path).or_insert(plan).value()))
	}
}

#[async_trait]
impl Middleware for CspFileMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "csp-file");
		let nonce = session_nonce(&request);
		let is_head = request.method == Method::HEAD;
		let accepts_gzip = request.accepts_encoding("gzip");
		let path = request.path().to_string();

		let plan = match self.plan(&path) {
			Some(plan) => plan,
			None => match self.load(request, next).await {
				Some(plan) => plan,
				None => {
					return Ok(Response::plain_error(
						StatusCode::INTERNAL_SERVER_ERROR,
						TEMPLATE_ERROR_MESSAGE,
					));
				}
			},
		};

		let mut body = plan.render(&nonce);
		let mut response = Response::ok().with_content_type(self.media_types.lookup(&path));
		if let Some(dynamic_gzip) = &self.dynamic_gzip
			&& dynamic_gzip.applies(&path, accepts_gzip)
		{
			body = dynamic_gzip.compress(&body)?;
			response
				.headers
				.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
		}
		if !is_head {
			response.body = body;
		}
		Ok(response)
	}

	fn should_continue(&self, request: &Request) -> bool {
		self.file_pattern.is_match(request.path())
	}
}
