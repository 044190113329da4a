use async_trait::async_trait;
use websrv_http::{Handler, Request, Response, Result};

/// Liveness endpoint: every request gets 200 with an empty body
///
/// # Examples
///
/// ```
/// use websrv_http::{Handler, Request, StatusCode};
/// use websrv_server::HealthHandler;
///
/// # tokio_test::block_on(async {
/// let request = Request::builder().uri("/anything").build().unwrap();
/// let response = HealthHandler.handle(request).await.unwrap();
///
/// assert_eq!(response.status, StatusCode::OK);
/// assert!(response.body.is_empty());
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthHandler;

#[async_trait]
impl Handler for HealthHandler {
	async fn handle(&self, _request: Request) -> Result<Response> {
		Ok(Response::ok())
	}
}
