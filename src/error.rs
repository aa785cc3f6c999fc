//! Crate-wide error types, one enum per failure domain (spec §7).
//!
//! Only [`EngineError`] ever aborts the process. [`TransportError`],
//! [`DecodeError`] and [`WriteError`] are handled at the nearest boundary
//! and logged; they never unwind across a thread join.

use thiserror::Error;

/// Init-fatal failures. `main` maps these to exit code 1.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {thread} thread: {source}")]
    ThreadSpawn {
        thread: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Transport-transient failures (spec §7(b)). Reconnect with backoff;
/// exhausting the retry budget triggers shutdown.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("websocket connect failed: {0}")]
    Connect(String),

    #[error("websocket protocol error: {0}")]
    Protocol(String),

    #[error("reconnect retries exhausted ({attempts} attempts)")]
    RetriesExhausted { attempts: u32 },
}

/// Decode-reject failures (spec §7(c)). The trade processor drops the
/// message and continues; never propagated further.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    MalformedJson(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("non-positive price: {0}")]
    NonPositivePrice(f64),

    #[error("non-positive size: {0}")]
    NonPositiveSize(f64),
}

/// Append-only write failures (spec §7(d)). Logged to stderr/tracing;
/// the pipeline always continues.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write to {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
