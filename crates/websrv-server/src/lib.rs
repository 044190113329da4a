//! # websrv-server
//!
//! The HTTP/1.1 listener behind websrv, the health endpoint and graceful
//! shutdown.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use websrv_server::{
//!     HealthHandler, HttpServer, ShutdownCoordinator, shutdown_after_signal, shutdown_signal,
//! };
//!
//! # async fn example() -> Result<(), websrv_server::ServerError> {
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
//! tokio::spawn(shutdown_after_signal(
//!     shutdown_signal(),
//!     Duration::from_secs(5),
//!     coordinator.clone(),
//! ));
//!
//! HttpServer::new(Arc::new(HealthHandler))
//!     .listen_with_shutdown("0.0.0.0:8081".parse().unwrap(), coordinator)
//!     .await
//! # }
//! ```

pub mod error;
pub mod health;
pub mod http;
pub mod shutdown;

pub use error::{Result, ServerError};
pub use health::HealthHandler;
pub use http::{HttpServer, bind};
pub use shutdown::{ShutdownCoordinator, shutdown_after_signal, shutdown_signal};
