//! hostio core - the asynchronous host-object bridge.
//!
//! This crate provides:
//! - A single-threaded host interpreter model (values, promises, realms)
//! - Typed results that cross from worker threads back to the interpreter
//! - Worker pools and the main-thread invoker
//! - The bridge that dispatches sync, async and property members
//! - Handle tables for native resources addressed by integer id

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod args;
pub mod bridge;
pub mod error;
pub mod executor;
pub mod handle_table;
pub mod host;
pub mod invoker;
pub mod value;

pub use args::{ArgValue, AsyncArgs};
pub use bridge::{Bridge, BridgeBuilder};
pub use error::{BridgeError, BridgeResult};
pub use executor::{Task, TaskExecutor, ThreadPool};
pub use handle_table::HandleTable;
pub use host::{HostError, HostObject, HostValue, Promise, PromiseState, Realm};
pub use invoker::{EventLoop, LoopInvoker, MainThreadInvoker, MainThreadTask};
pub use value::TypedValue;
