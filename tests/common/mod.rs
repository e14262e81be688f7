//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, ALBUM_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_album() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::paired(&server).await;
//!
//!     let response = client.get_album(ALBUM_ID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::{location, TestClient};
pub use constants::*;
pub use server::TestServer;

// Keep fixtures internal - only accessed via TestServer::spawn()
#[allow(unused_imports)]
pub(crate) use fixtures::create_test_library;
