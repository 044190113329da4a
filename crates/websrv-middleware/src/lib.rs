//! # websrv-middleware
//!
//! The request pipeline stages of websrv. Each stage implements
//! [`websrv_http::Middleware`]; the server composes them in this order, outer
//! to inner:
//!
//! | Stage | Type |
//! |-------|------|
//! | request-id | [`RequestIdMiddleware`] |
//! | timer | [`TimerMiddleware`] |
//! | write-timeout | [`WriteTimeoutMiddleware`] |
//! | access-log | [`AccessLogMiddleware`] |
//! | validate | [`ValidateCleanMiddleware`] |
//! | fallback | [`FallbackMiddleware`] |
//! | session-cookie | [`SessionCookieMiddleware`] |
//! | csp-header | [`CspHeaderMiddleware`] |
//! | static-headers | [`StaticHeadersMiddleware`] |
//! | csp-file | [`CspFileMiddleware`] |
//! | content-hash-cache | [`ContentHashCacheMiddleware`] |
//!
//! Stages after `validate` see the cleaned, root-relative path through
//! [`websrv_http::Request::path`]; stages after `fallback` see the path of the
//! file that is served.

pub mod access_log;
pub mod cache;
pub mod csp;
pub mod csp_file;
pub mod fallback;
pub mod header;
pub mod replacer;
pub mod request_id;
pub mod session;
pub mod timeout;
pub mod timer;
pub mod validate;

pub use access_log::AccessLogMiddleware;
pub use cache::ContentHashCacheMiddleware;
pub use csp::CspHeaderMiddleware;
pub use csp_file::CspFileMiddleware;
pub use fallback::FallbackMiddleware;
pub use header::StaticHeadersMiddleware;
pub use replacer::{Placeholder, ReplacerPlan, Segment};
pub use request_id::{RequestId, RequestIdMiddleware};
pub use session::{SessionCookieConfig, SessionCookieMiddleware, SessionId};
pub use timeout::WriteTimeoutMiddleware;
pub use timer::{RequestStart, TimerMiddleware};
pub use validate::ValidateCleanMiddleware;
