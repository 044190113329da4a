//! Shared utilities for websrv.

pub mod random;

pub use random::BufferedRandomIdGenerator;
