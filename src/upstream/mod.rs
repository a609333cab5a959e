//! Upstream module for the third-party APIs the relay forwards to.

pub mod client;

pub use client::{RawResponse, UpstreamClient};
