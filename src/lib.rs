pub mod archive;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod launcher;
pub mod package;
pub mod platform;
pub mod runtime;
