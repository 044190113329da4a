//! websrv bound to ephemeral ports


use fixtures::{Site, raw_request, site, site_settings};
use rstest::rstest;
use std::path::Path;
use std::time::Duration;
use websrv::{AppError, Websrv};

#[rstest]
#[tokio::test]
async fn test_serves_until_signalled(site: Site) {
	let app = Websrv::bind(site_settings(true), site.path()).await.unwrap();
	let webserver = app.webserver_addr();
	let health = app.health_addr().unwrap();
	let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
	let running = tokio::spawn(app.run_until(async move {
		let _ = stopped.await;
	}));

	let page = raw_request(
		webserver,
		"GET /styles.css HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
	)
	.await;
	let health_check = raw_request(
		health,
		"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
	)
	.await;

	assert!(page.starts_with("HTTP/1.1 200 OK\r\n"));
	assert!(page.to_ascii_lowercase().contains("etag: "));
	assert!(page.ends_with("body { margin: 0; }\n"));
	assert!(health_check.starts_with("HTTP/1.1 200 OK\r\n"));

	stop.send(()).unwrap();
	let result = tokio::time::timeout(Duration::from_secs(10), running).await;

	assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[rstest]
#[tokio::test]
async fn test_missing_target_dir() {
	let result = Websrv::bind(site_settings(false), Path::new("/nonexistent/websrv-site")).await;

	assert!(matches!(result, Err(AppError::TargetDir(_))));
}

#[rstest]
#[tokio::test]
async fn test_health_disabled(site: Site) {
	let mut settings = site_settings(false);
	settings.health = false;

	let app = Websrv::bind(settings, site.path()).await.unwrap();

	assert!(app.health_addr().is_none());
}
