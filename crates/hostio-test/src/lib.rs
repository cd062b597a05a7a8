//! hostio test - shared test utilities for the hostio crates.
//!
//! This crate provides an event-loop driver, temporary directory fixtures
//! and a local HTTP server. It is meant to be used as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! hostio-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use hostio_test::{TempWorkspace, TestLoop};
//!
//! #[test]
//! fn test_write_then_read() {
//!     let mut test_loop = TestLoop::new();
//!     let workspace = TempWorkspace::new();
//!     let path = workspace.path_str("a.txt");
//!     // ... call a bridged async method and await its promise:
//!     // let value = test_loop.await_ok(&promise_value);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod server;

pub use fixtures::*;
pub use harness::*;
pub use server::*;
