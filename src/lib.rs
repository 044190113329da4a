//! # websrv
//!
//! A static file server for single-page applications.
//!
//! - conditional caching with content-hash `ETag`s and `304 Not Modified`
//! - gzip variants computed once at startup, or on the fly from disk
//! - per-session CSP nonces injected into templated files and the
//!   `Content-Security-Policy` header
//! - a separate health listener and graceful shutdown
//!
//! ## Crates
//!
//! - [`websrv_http`] - request, response and middleware traits
//! - [`websrv_static`] - virtual filesystems, compression and the fetch chain
//! - [`websrv_middleware`] - the request pipeline stages
//! - [`websrv_server`] - the HTTP listener and shutdown handling
//! - [`websrv_conf`] - layered configuration
//! - [`websrv_utils`] - buffered random identifiers
//!
//! ## Running
//!
//! ```bash
//! websrv --conf config.yaml ./dist
//! ```

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use app::Websrv;
pub use cli::Cli;
pub use error::{AppError, Result};
pub use logging::init_logging;
pub use pipeline::{Pipeline, Stage, health_pipeline, webserver_pipeline};

pub use websrv_conf as conf;
pub use websrv_http as http;
pub use websrv_middleware as middleware;
pub use websrv_server as server;
pub use websrv_static as fs;
pub use websrv_utils as utils;
