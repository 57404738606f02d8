//! HTTP client used to fetch upstream release archives.

mod client;

pub use client::{CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, HttpClient};
