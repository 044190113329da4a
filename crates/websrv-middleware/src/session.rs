//! Session cookie carrying the CSP nonce
//!
//! The session id doubles as the nonce injected into CSP headers and
//! templated files. The server keeps no session state: an id present in the
//! request cookie is used verbatim, a missing one is generated and handed to
//! the client with `Set-Cookie`.

use async_trait::async_trait;
use hyper::header::{self, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use websrv_http::{Error, Handler, Middleware, Request, Response, Result};
use websrv_utils::BufferedRandomIdGenerator;

use crate::timer::log_enter;

/// Length of generated session ids
pub const SESSION_ID_LENGTH: usize = 32;

/// Number of session ids kept ready by the generator
pub const SESSION_ID_BUFFER: usize = 16;

/// Request extension holding the session id of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Session cookie configuration
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
	/// Cookie name
	pub name: String,
	/// Cookie lifetime, used for both `Max-Age` and `Expires`
	pub max_age: Duration,
}

impl SessionCookieConfig {
	/// # Examples
	///
	/// ```
	/// use std::time::Duration;
	/// use websrv_middleware::session::SessionCookieConfig;
	///
	/// let config = SessionCookieConfig::new("Nonce-Id", Duration::from_secs(3600));
	/// assert_eq!(config.name, "Nonce-Id");
	/// ```
	pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
		Self {
			name: name.into(),
			max_age,
		}
	}
}

/// Reads or creates the session cookie and stores a [`SessionId`] extension
pub struct SessionCookieMiddleware {
	config: SessionCookieConfig,
	generator: Arc<BufferedRandomIdGenerator>,
}

impl SessionCookieMiddleware {
	/// Create the stage with its own id generator
	pub fn new(config: SessionCookieConfig) -> Self {
		Self::with_generator(
			config,
			Arc::new(BufferedRandomIdGenerator::new(
				SESSION_ID_LENGTH,
				SESSION_ID_BUFFER,
			)),
		)
	}

	pub fn with_generator(
		config: SessionCookieConfig,
		generator: Arc<BufferedRandomIdGenerator>,
	) -> Self {
		Self { config, generator }
	}

	/// Value of the configured cookie, the first one if sent several times
	fn get_session_id(&self, request: &Request) -> Option<String> {
		request
			.headers
			.get_all(header::COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.find_map(|cookie| {
				let (name, value) = cookie.trim().split_once('=')?;
				(name == self.config.name).then(|| value.trim_matches('"').to_string())
			})
	}

	/// Build Set-Cookie header
	fn build_cookie_header(&self, session_id: &str) -> String {
		let mut parts = vec![
			format!("{}={}", self.config.name, session_id),
			"Path=/".to_string(),
		];

		let max_age = self.config.max_age.as_secs();
		parts.push(format!(
			"Expires={}",
			httpdate::fmt_http_date(SystemTime::now() + self.config.max_age)
		));
		if max_age > 0 {
			parts.push(format!("Max-Age={}", max_age));
		}
		parts.push("HttpOnly".to_string());
		parts.push("Secure".to_string());
		parts.push("SameSite=Strict".to_string());

		parts.join("; ")
	}
}

#[async_trait]
impl Middleware for SessionCookieMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "session-cookie");

		let (session_id, new_cookie) = match self.get_session_id(&request) {
			Some(id) => (id, None),
			None => {
				tracing::debug!(cookie = %self.config.name, "session cookie not present in request");
				let id =
					self.generator.get().await.ok_or_else(|| {
						Error::Internal("session id generator closed".to_string())
					})?;
				let cookie = HeaderValue::from_str(&self.build_cookie_header(&id))?;
				(id, Some(cookie))
			}
		};
		request.extensions.insert(SessionId(session_id));

		let mut response = next.handle(request).await?;
		if let Some(cookie) = new_cookie {
			response.headers.append(header::SET_COOKIE, cookie);
		}
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	struct SessionEcho;

	#[async_trait]
	impl Handler for SessionEcho {
		async fn handle(&self, request: Request) -> Result<Response> {
			let id = request
				.extensions
				.get::<SessionId>()
				.map(|SessionId(id)| id)
				.unwrap_or_default();
			Ok(Response::ok().with_body(id))
		}
	}

	#[fixture]
	fn config() -> SessionCookieConfig {
		SessionCookieConfig::new("Nonce-Id", Duration::from_secs(3600))
	}

	fn body_of(response: &Response) -> String {
		String::from_utf8(response.body.to_vec()).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_new_session_sets_cookie(config: SessionCookieConfig) {
		let middleware = SessionCookieMiddleware::new(config);

		let response = middleware
			.process(Request::builder().build().unwrap(), Arc::new(SessionEcho))
			.await
			.unwrap();

		let session_id = body_of(&response);
		assert_eq!(session_id.len(), SESSION_ID_LENGTH);
		let cookie = response
			.headers
			.get(header::SET_COOKIE)
			.unwrap()
			.to_str()
			.unwrap();
		assert!(cookie.starts_with(&format!("Nonce-Id={}; Path=/; Expires=", session_id)));
		assert!(cookie.contains("Max-Age=3600"));
		assert!(cookie.contains("HttpOnly"));
		assert!(cookie.contains("Secure"));
		assert!(cookie.contains("SameSite=Strict"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_existing_session_is_reused(config: SessionCookieConfig) {
		let middleware = SessionCookieMiddleware::new(config);
		let request = Request::builder()
			.header("cookie", "theme=dark; Nonce-Id=abc123; other=1")
			.build()
			.unwrap();

		let response = middleware
			.process(request, Arc::new(SessionEcho))
			.await
			.unwrap();

		assert_eq!(body_of(&response), "abc123");
		assert!(response.headers.get(header::SET_COOKIE).is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_other_cookie_names_ignored(config: SessionCookieConfig) {
		let middleware = SessionCookieMiddleware::new(config);
		let request = Request::builder()
			.header("cookie", "Nonce-Id-Old=abc123")
			.build()
			.unwrap();

		let response = middleware
			.process(request, Arc::new(SessionEcho))
			.await
			.unwrap();

		assert_ne!(body_of(&response), "abc123");
		assert!(response.headers.get(header::SET_COOKIE).is_some());
	}

	#[rstest]
	#[tokio::test]
	async fn test_zero_max_age_omits_attribute() {
		let middleware =
			SessionCookieMiddleware::new(SessionCookieConfig::new("Nonce-Id", Duration::ZERO));

		let cookie = middleware.build_cookie_header("id");

		assert!(!cookie.contains("Max-Age"));
		assert!(cookie.contains("Expires="));
	}
}
