//! Real-time trade-stream processor: subscribes to a public exchange feed
//! for a fixed list of spot symbols, derives a sliding-window VWAP and a
//! best-lag cross-symbol Pearson correlation for each tracked symbol once
//! per minute, and persists both the raw feed and the derived metrics to
//! disk.
//!
//! ## Architecture
//!
//! A fixed set of five threads, wired together by a single [`engine::Engine`]
//! value:
//!
//! - `okx-transport` pushes raw exchange frames onto the bounded
//!   [`ring::IngressRing`] (drop-oldest on overflow).
//! - `trade-processor` drains the ring, decodes each frame
//!   ([`decode::okx::OkxDecoder`]), appends it to the per-symbol trade
//!   log, and folds it into that symbol's [`window::SlidingWindow`].
//! - `scheduler` wakes once per minute boundary (drift-compensated via an
//!   EMA of recent work duration) and drives `vwap-worker` and
//!   `correlation-worker` through a pair of [`barrier::TwoPhaseBarrier`]s.
//! - `vwap-worker` snapshots each symbol's VWAP into its
//!   [`history::VwapHistory`] and the VWAP CSV log.
//! - `correlation-worker` runs the lagged Pearson search
//!   ([`correlation::best_lagged`]) across every symbol pair and logs the
//!   best match per source symbol.
//!
//! ## Basic usage
//!
//! ```no_run
//! use okx_trade_processor::config::Settings;
//! use okx_trade_processor::engine::Engine;
//!
//! let settings = Settings::default();
//! let engine = Engine::new(settings).expect("engine init");
//! let handles = engine.spawn_threads().expect("thread spawn");
//! for handle in handles {
//!     handle.join().expect("worker thread panicked");
//! }
//! ```

pub mod barrier;
pub mod config;
pub mod correlation;
pub mod decode;
pub mod engine;
pub mod error;
pub mod history;
pub mod logs;
pub mod monitor;
pub mod processor;
pub mod ring;
pub mod scheduler;
pub mod shutdown;
pub mod symbol;
pub mod time;
pub mod transport;
pub mod vwap_worker;
pub mod window;
