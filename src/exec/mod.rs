// src/exec/mod.rs

//! External tool execution layer.
//!
//! The dispatcher talks to a [`ToolRunner`] instead of spawning processes
//! itself, so tests can swap in a fake that records invocations and returns
//! scripted results.
//!
//! - [`command`] builds the command line ([`ToolInvocation`]) and holds the
//!   captured result ([`ToolOutput`]).
//! - [`backend`] provides the `ToolRunner` trait and the production
//!   [`CommandToolRunner`] built on `tokio::process`.

pub mod backend;
pub mod command;

pub use backend::{CommandToolRunner, ToolRunner};
pub use command::{ToolInvocation, ToolOutput};
