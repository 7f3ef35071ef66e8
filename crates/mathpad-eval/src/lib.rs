#![warn(missing_docs)]
//! Stdio JSON-RPC client for the external math evaluator service.
//!
//! # Overview
//!
//! `mathpad-core` only ever talks to its evaluator through the [`Evaluator`] seam; this
//! crate provides the production implementation. The evaluator runs as a separate
//! process (in deployment, a service wrapping the numeric engine); this client spawns
//! it, exchanges Content-Length framed JSON-RPC messages over its stdio, and maps every
//! response or failure onto [`EvalOutcome`].
//!
//! The API intentionally uses `serde_json::Value` instead of typed protocol structs to
//! keep the dependency surface small and allow the service to evolve its payloads.
//!
//! # Failure model
//!
//! Per the engine's contract, no failure propagates upward: spawn errors surface at
//! construction, but once connected, timeouts, broken pipes, malformed responses, and
//! evaluator error objects all collapse into [`EvalOutcome::Error`], the one opaque
//! sentinel the engine stores as the `"Error"` result.
//!
//! # Example
//!
//! ```rust,no_run
//! use mathpad_eval::EvalClient;
//! use mathpad_core::Evaluator;
//! use std::process::Command;
//!
//! let mut client = EvalClient::spawn(Command::new("mathpad-evald"))?;
//! let outcome = client.evaluate("2+2");
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod client;
pub mod transport;

pub use client::{ClientError, EvalClient};
pub use mathpad_core::{EvalOutcome, Evaluator};
