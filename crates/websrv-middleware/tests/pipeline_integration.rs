//! The inner pipeline serving an in-memory single-page application


use fixtures::{CachedPipeline, NONCE_PLACEHOLDER, Pipeline, cached_pipeline, pipeline};
use flate2::read::GzDecoder;
use rstest::rstest;
use std::io::Read;
use std::sync::Arc;
use websrv_http::{Method, Response, StatusCode, header};
use websrv_middleware::cache::content_hash;

fn header_of<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
	response
		.headers
		.get(name)
		.map(|value| value.to_str().unwrap())
}

/// Session id from the `Set-Cookie` header
fn session_of(response: &Response) -> String {
	let cookie = header_of(response, header::SET_COOKIE).unwrap();
	cookie
		.split(';')
		.next()
		.and_then(|pair| pair.strip_prefix("Nonce-Id="))
		.unwrap()
		.to_string()
}

fn body_text(response: &Response) -> String {
	String::from_utf8(response.body.to_vec()).unwrap()
}

#[rstest]
#[tokio::test]
async fn test_nonce_injected_in_body_and_header(pipeline: Pipeline) {
	let first = pipeline.get("/index.html", &[]).await;
	let nonce = session_of(&first);

	assert_eq!(first.status, StatusCode::OK);
	assert_eq!(
		body_text(&first),
		format!(
			"<html><style nonce=\"{}\"></style><app-root></app-root></html>",
			nonce
		)
	);
	assert_eq!(
		header_of(&first, header::CONTENT_SECURITY_POLICY),
		Some(format!("default-src 'self'; style-src 'self' 'nonce-{}'", nonce).as_str())
	);
	assert_eq!(header_of(&first, header::X_FRAME_OPTIONS), Some("DENY"));
	assert_eq!(header_of(&first, header::ETAG), None);

	let cookie = format!("Nonce-Id={}", nonce);
	let second = pipeline.get("/main.js", &[("cookie", &cookie)]).await;

	assert!(second.headers.get(header::SET_COOKIE).is_none());
	assert_eq!(
		body_text(&second),
		format!("ngCspNonce='{}';bootstrap();", nonce)
	);
	assert_eq!(
		header_of(&second, header::CONTENT_TYPE),
		Some("application/javascript")
	);
}

#[rstest]
#[tokio::test]
async fn test_sessions_get_distinct_nonces(pipeline: Pipeline) {
	let first = pipeline.get("/index.html", &[]).await;
	let second = pipeline.get("/index.html", &[]).await;

	assert_ne!(session_of(&first), session_of(&second));
	assert_ne!(first.body, second.body);
	assert_eq!(pipeline.csp_file.plan_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_precompressed_asset_with_etag(pipeline: Pipeline) {
	let gzip = [("accept-encoding", "gzip, deflate, br")];

	let first = pipeline.get("/styles.css", &gzip).await;
	assert_eq!(header_of(&first, header::CONTENT_ENCODING), Some("gzip"));
	assert_eq!(header_of(&first, header::CONTENT_TYPE), Some("text/css"));
	let mut decoded = String::new();
	GzDecoder::new(&first.body[..])
		.read_to_string(&mut decoded)
		.unwrap();
	assert_eq!(decoded, "body { margin: 0; }\n".repeat(50));

	let etag = header_of(&first, header::ETAG).unwrap().to_string();
	let second = pipeline.get("/styles.css", &gzip).await;
	assert_eq!(header_of(&second, header::ETAG), Some(etag.as_str()));

	let conditional = pipeline
		.get("/styles.css", &[("accept-encoding", "gzip"), ("if-none-match", &etag)])
		.await;
	assert_eq!(conditional.status, StatusCode::NOT_MODIFIED);
	assert!(conditional.body.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_path_cleaning_shares_cache_entry(pipeline: Pipeline) {
	pipeline.get("/assets/../assets/logo.svg", &[]).await;

	assert!(pipeline.cache.get("assets/logo.svg", false).is_some());
	assert_eq!(pipeline.cache.len(), 1);
}

#[rstest]
#[case("/missing/route")]
#[case("/assets")]
#[case("/")]
#[tokio::test]
async fn test_unknown_and_directory_paths_fall_back(pipeline: Pipeline, #[case] uri: &str) {
	let response = pipeline.get(uri, &[]).await;
	let nonce = session_of(&response);

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		body_text(&response),
		format!(
			"<html><style nonce=\"{}\"></style><app-root></app-root></html>",
			nonce
		)
	);
	assert!(!body_text(&response).contains(NONCE_PLACEHOLDER));
	assert_eq!(
		header_of(&response, header::CONTENT_TYPE),
		Some("text/html; charset=UTF-8")
	);
	assert!(pipeline.csp_file.plan("index.html").is_some());
	assert_eq!(pipeline.csp_file.plan_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_head_has_headers_only(pipeline: Pipeline) {
	let response = pipeline.send(Method::HEAD, "/index.html", &[]).await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.body.is_empty());
	assert!(response.headers.get(header::SET_COOKIE).is_some());
	assert_eq!(
		header_of(&response, header::CONTENT_TYPE),
		Some("text/html; charset=UTF-8")
	);
}

#[rstest]
#[tokio::test]
async fn test_post_rejected_before_any_other_stage(pipeline: Pipeline) {
	let response = pipeline.send(Method::POST, "/index.html", &[]).await;

	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	assert!(response.headers.get(header::SET_COOKIE).is_none());
	assert_eq!(pipeline.csp_file.plan_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_concurrent_first_requests(pipeline: Pipeline) {
	let pipeline = Arc::new(pipeline);

	let tasks: Vec<_> = (0..24)
		.map(|i| {
			let pipeline = pipeline.clone();
			tokio::spawn(async move {
				let path = if i % 2 == 0 { "/main.js" } else { "/styles.css" };
				(path, pipeline.get(path, &[]).await)
			})
		})
		.collect();

	for task in tasks {
		let (path, response) = task.await.unwrap();
		assert_eq!(response.status, StatusCode::OK, "{}", path);
		if path == "/main.js" {
			assert_eq!(
				body_text(&response),
				format!("ngCspNonce='{}';bootstrap();", session_of(&response))
			);
		}
	}
	assert_eq!(pipeline.csp_file.plan_count(), 1);
	assert!(pipeline.cache.get("styles.css", false).is_some());
}

#[rstest]
#[tokio::test]
async fn test_client_routes_share_one_cache_entry(cached_pipeline: CachedPipeline) {
	for i in 0..200 {
		let response = cached_pipeline.get(&format!("/route/{}", i), &[]).await;
		assert_eq!(response.status, StatusCode::OK);
	}

	assert_eq!(cached_pipeline.cache.len(), 1);
	assert!(cached_pipeline.cache.get("index.html", false).is_some());
}

#[rstest]
#[tokio::test]
async fn test_etag_matches_the_encoding_served(cached_pipeline: CachedPipeline) {
	let zipped = cached_pipeline
		.get("/styles.css", &[("accept-encoding", "gzip")])
		.await;
	let plain = cached_pipeline.get("/styles.css", &[]).await;
	let zipped_etag = header_of(&zipped, header::ETAG).unwrap().to_string();
	let plain_etag = header_of(&plain, header::ETAG).unwrap().to_string();

	assert_eq!(header_of(&zipped, header::CONTENT_ENCODING), Some("gzip"));
	assert_eq!(zipped_etag, content_hash(&zipped.body));
	assert_eq!(plain_etag, content_hash(&plain.body));
	assert_ne!(zipped_etag, plain_etag);

	let revalidated = cached_pipeline
		.get("/styles.css", &[("if-none-match", &zipped_etag)])
		.await;

	assert_eq!(revalidated.status, StatusCode::OK);
	assert_eq!(revalidated.body, plain.body);
	assert_eq!(header_of(&revalidated, header::ETAG), Some(plain_etag.as_str()));
}
