//! Minimal JSON-RPC client for an evaluator process over stdio.
//!
//! The client stays runtime-agnostic: a background thread reads framed messages from the
//! child's stdout, another writes outgoing requests to its stdin, and the caller blocks on
//! a channel with a deadline. Payloads are plain `serde_json::Value`s so the protocol
//! surface stays small.
//!
//! Every failure mode (broken pipes, timeouts, evaluator error responses) is absorbed
//! by the [`Evaluator`] impl into [`EvalOutcome::Error`]: the engine treats all of them
//! as one opaque sentinel and never sees an `Err`.

use crate::transport::{read_message, write_message};
use mathpad_core::{EvalOutcome, Evaluator};
use serde_json::{Value, json};
use std::io::{self, BufReader, BufWriter};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Inbound messages produced by the background reader thread.
#[derive(Debug)]
enum Inbound {
    Message(Value),
    IoError(String),
}

/// Errors produced while talking to the evaluator process.
///
/// These stay internal to the client: the [`Evaluator`] impl flattens them all into
/// [`EvalOutcome::Error`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An I/O error from the process pipes.
    #[error("evaluator I/O error: {0}")]
    Io(#[from] io::Error),
    /// No response arrived within the deadline.
    #[error("timed out waiting for evaluator response id={0}")]
    Timeout(u64),
    /// The evaluator answered with an error object.
    #[error("evaluator error response: {0}")]
    Server(String),
    /// The response carried neither a usable result nor an error.
    #[error("malformed evaluator response")]
    MalformedResponse,
}

/// Default deadline for one evaluation round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A JSON-RPC evaluator client connected to a spawned service process.
pub struct EvalClient {
    _child: Child,
    tx: mpsc::Sender<Value>,
    rx: mpsc::Receiver<Inbound>,
    next_id: u64,
    timeout: Duration,
}

impl EvalClient {
    /// Spawn an evaluator process and connect via its stdio.
    ///
    /// `stdin` / `stdout` are overridden to be piped; callers may configure `stderr`
    /// on `cmd` beforehand.
    pub fn spawn(mut cmd: Command) -> io::Result<Self> {
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped());
        let child = cmd.spawn()?;
        Self::from_child(child)
    }

    /// Create a client from an already-spawned process child.
    pub fn from_child(mut child: Child) -> io::Result<Self> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("Failed to open evaluator stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("Failed to open evaluator stdout"))?;

        let (tx_out, rx_out) = mpsc::channel::<Value>();
        let (tx_in, rx_in) = mpsc::channel::<Inbound>();

        {
            let tx_in = tx_in.clone();
            thread::spawn(move || write_loop(stdin, rx_out, tx_in));
        }
        thread::spawn(move || read_loop(stdout, tx_in));

        Ok(Self {
            _child: child,
            tx: tx_out,
            rx: rx_in,
            next_id: 1,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send an `evaluate` request and return the allocated request id.
    pub fn request(&mut self, expression: &str) -> Result<u64, ClientError> {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        self.tx
            .send(evaluate_request(id, expression))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "writer thread stopped"))?;
        Ok(id)
    }

    /// Wait for the response matching `request_id`, discarding unrelated messages.
    pub fn wait_for_response(&mut self, request_id: u64) -> Result<Value, ClientError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::Timeout(request_id));
            }

            let inbound = self
                .rx
                .recv_timeout(deadline - now)
                .map_err(|_| ClientError::Timeout(request_id))?;

            match inbound {
                Inbound::IoError(err) => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, err).into());
                }
                Inbound::Message(msg) => {
                    if msg.get("id").and_then(Value::as_u64) != Some(request_id) {
                        // Stale or unrelated message (e.g. an earlier abandoned preview).
                        continue;
                    }
                    if let Some(error) = msg.get("error") {
                        return Err(ClientError::Server(error.to_string()));
                    }
                    return msg
                        .get("result")
                        .cloned()
                        .ok_or(ClientError::MalformedResponse);
                }
            }
        }
    }

    fn evaluate_inner(&mut self, expression: &str) -> Result<Value, ClientError> {
        let id = self.request(expression)?;
        self.wait_for_response(id)
    }
}

impl Evaluator for EvalClient {
    fn evaluate(&mut self, expression: &str) -> EvalOutcome {
        match self.evaluate_inner(expression) {
            Ok(result) => outcome_from_result(&result),
            // All failures are one opaque sentinel to the engine.
            Err(_) => EvalOutcome::Error,
        }
    }
}

/// Shape an `evaluate` request message.
pub fn evaluate_request(id: u64, expression: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "evaluate",
        "params": { "expression": expression },
    })
}

/// Interpret a response `result` as an evaluation outcome.
///
/// Accepts a bare number or string, or an object wrapping one under `"value"`.
/// Anything else is the failure sentinel.
pub fn outcome_from_result(result: &Value) -> EvalOutcome {
    let value = result.get("value").unwrap_or(result);
    if let Some(n) = value.as_f64() {
        EvalOutcome::Number(n)
    } else if let Some(s) = value.as_str() {
        EvalOutcome::Text(s.to_string())
    } else {
        EvalOutcome::Error
    }
}

fn write_loop(
    stdin: std::process::ChildStdin,
    rx: mpsc::Receiver<Value>,
    tx_in: mpsc::Sender<Inbound>,
) {
    let mut writer = BufWriter::new(stdin);
    for value in rx {
        if let Err(err) = write_message(&mut writer, &value) {
            let _ = tx_in.send(Inbound::IoError(err.to_string()));
            break;
        }
    }
}

fn read_loop(stdout: std::process::ChildStdout, tx: mpsc::Sender<Inbound>) {
    let mut reader = BufReader::new(stdout);
    loop {
        match read_message(&mut reader) {
            Ok(Some(value)) => {
                if tx.send(Inbound::Message(value)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send(Inbound::IoError(err.to_string()));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_evaluate_request_shape() {
        let request = evaluate_request(7, "3+4");
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["id"], 7);
        assert_eq!(request["method"], "evaluate");
        assert_eq!(request["params"]["expression"], "3+4");
    }

    #[test]
    fn test_outcome_from_bare_values() {
        assert_eq!(outcome_from_result(&json!(7.0)), EvalOutcome::Number(7.0));
        assert_eq!(
            outcome_from_result(&json!("Inf")),
            EvalOutcome::Text("Inf".to_string())
        );
        assert_eq!(outcome_from_result(&json!(null)), EvalOutcome::Error);
        assert_eq!(outcome_from_result(&json!([1, 2])), EvalOutcome::Error);
    }

    #[test]
    fn test_outcome_from_wrapped_value() {
        assert_eq!(
            outcome_from_result(&json!({ "value": 2.5 })),
            EvalOutcome::Number(2.5)
        );
        assert_eq!(
            outcome_from_result(&json!({ "value": "3" })),
            EvalOutcome::Text("3".to_string())
        );
    }
}
