//! Process-wide wiring (spec §9): owns every shared resource and spawns
//! the fixed set of threads that make up one running instance.
//!
//! Grounded in `original_source/src/main.c`'s `main()`: thread creation
//! order is transport, then trade processor, then (after both barriers
//! exist) the VWAP worker, correlation worker, and finally the
//! scheduler that drives the latter two.

use crate::barrier::TwoPhaseBarrier;
use crate::config::{Settings, CORRELATION_POINTS, MAX_LAG_MINUTES};
use crate::decode::okx::OkxDecoder;
use crate::error::EngineError;
use crate::logs::Logs;
use crate::ring::IngressRing;
use crate::scheduler::Scheduler;
use crate::symbol::{build_symbol_table, Symbol};
use crate::transport::{okx as transport_okx, TransportHandle};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Number of rendezvous participants per barrier: the scheduler plus
/// the two compute workers.
const BARRIER_WIDTH: usize = 3;

/// Everything a running instance needs, built once at startup and torn
/// down once at shutdown.
pub struct Engine {
    settings: Settings,
    symbols: Arc<Vec<Symbol>>,
    ring: Arc<IngressRing>,
    logs: Arc<Logs>,
    shutdown: Arc<AtomicBool>,
    transport_handle: Arc<TransportHandle>,
    start_barrier: Arc<TwoPhaseBarrier>,
    done_barrier: Arc<TwoPhaseBarrier>,
    current_minute_ms: Arc<AtomicI64>,
}

impl Engine {
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        crate::logs::ensure_data_dirs(&settings).map_err(|source| EngineError::OutputDir {
            path: settings.data_dir.display().to_string(),
            source,
        })?;
        let logs = Logs::new(&settings).map_err(|err| EngineError::OutputDir {
            path: settings.data_dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
        })?;

        Ok(Self {
            symbols: Arc::new(build_symbol_table(&settings)),
            ring: Arc::new(IngressRing::new(settings.ring_capacity)),
            logs: Arc::new(logs),
            shutdown: Arc::new(AtomicBool::new(false)),
            transport_handle: Arc::new(TransportHandle::new()),
            start_barrier: Arc::new(TwoPhaseBarrier::new(BARRIER_WIDTH)),
            done_barrier: Arc::new(TwoPhaseBarrier::new(BARRIER_WIDTH)),
            current_minute_ms: Arc::new(AtomicI64::new(0)),
            settings,
        })
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn ring(&self) -> Arc<IngressRing> {
        Arc::clone(&self.ring)
    }

    pub fn transport_handle(&self) -> Arc<TransportHandle> {
        Arc::clone(&self.transport_handle)
    }

    /// Spawns the full fixed thread set and returns their join handles
    /// in the order the original starts them: transport, trade
    /// processor, VWAP worker, correlation worker, scheduler.
    pub fn spawn_threads(&self) -> Result<Vec<JoinHandle<()>>, EngineError> {
        let mut handles = Vec::with_capacity(5);

        handles.push(
            transport_okx::spawn(
                self.settings.clone(),
                Arc::clone(&self.ring),
                Arc::clone(&self.transport_handle),
            )
            .map_err(|source| EngineError::ThreadSpawn {
                thread: "transport",
                source,
            })?,
        );

        handles.push(self.spawn_processor()?);
        handles.push(self.spawn_vwap_worker()?);
        handles.push(self.spawn_correlation_worker()?);
        handles.push(self.spawn_scheduler()?);

        Ok(handles)
    }

    fn spawn_processor(&self) -> Result<JoinHandle<()>, EngineError> {
        let ring = Arc::clone(&self.ring);
        let shutdown = Arc::clone(&self.shutdown);
        let symbols = Arc::clone(&self.symbols);
        let symbol_names = self.settings.symbols.clone();
        let logs = Arc::clone(&self.logs);

        std::thread::Builder::new()
            .name("trade-processor".to_string())
            .spawn(move || {
                crate::processor::run(
                    &ring,
                    &shutdown,
                    &OkxDecoder,
                    &symbols,
                    &symbol_names,
                    &logs.trades,
                    &logs.latency,
                );
            })
            .map_err(|source| EngineError::ThreadSpawn {
                thread: "trade-processor",
                source,
            })
    }

    fn spawn_vwap_worker(&self) -> Result<JoinHandle<()>, EngineError> {
        let symbols = Arc::clone(&self.symbols);
        let shutdown = Arc::clone(&self.shutdown);
        let start_barrier = Arc::clone(&self.start_barrier);
        let done_barrier = Arc::clone(&self.done_barrier);
        let current_minute_ms = Arc::clone(&self.current_minute_ms);
        let logs = Arc::clone(&self.logs);

        std::thread::Builder::new()
            .name("vwap-worker".to_string())
            .spawn(move || loop {
                if !start_barrier.wait() || shutdown.load(Ordering::SeqCst) {
                    done_barrier.wait();
                    return;
                }
                let minute_ms = current_minute_ms.load(Ordering::SeqCst);
                crate::vwap_worker::tick(&symbols, minute_ms, &logs.vwap);
                if !done_barrier.wait() {
                    return;
                }
            })
            .map_err(|source| EngineError::ThreadSpawn {
                thread: "vwap-worker",
                source,
            })
    }

    fn spawn_correlation_worker(&self) -> Result<JoinHandle<()>, EngineError> {
        let symbols = Arc::clone(&self.symbols);
        let shutdown = Arc::clone(&self.shutdown);
        let start_barrier = Arc::clone(&self.start_barrier);
        let done_barrier = Arc::clone(&self.done_barrier);
        let current_minute_ms = Arc::clone(&self.current_minute_ms);
        let logs = Arc::clone(&self.logs);

        std::thread::Builder::new()
            .name("correlation-worker".to_string())
            .spawn(move || loop {
                if !start_barrier.wait() || shutdown.load(Ordering::SeqCst) {
                    done_barrier.wait();
                    return;
                }
                let minute_ms = current_minute_ms.load(Ordering::SeqCst);
                crate::correlation::tick(
                    &symbols,
                    minute_ms,
                    CORRELATION_POINTS,
                    MAX_LAG_MINUTES,
                    &logs.correlations,
                );
                if !done_barrier.wait() {
                    return;
                }
            })
            .map_err(|source| EngineError::ThreadSpawn {
                thread: "correlation-worker",
                source,
            })
    }

    fn spawn_scheduler(&self) -> Result<JoinHandle<()>, EngineError> {
        let shutdown = Arc::clone(&self.shutdown);
        let start_barrier = Arc::clone(&self.start_barrier);
        let done_barrier = Arc::clone(&self.done_barrier);
        let current_minute_ms = Arc::clone(&self.current_minute_ms);
        let logs = Arc::clone(&self.logs);

        std::thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || {
                let mut scheduler = Scheduler::new(
                    &start_barrier,
                    &done_barrier,
                    &shutdown,
                    &current_minute_ms,
                    &logs.scheduler,
                    &logs.system,
                );
                scheduler.run();
            })
            .map_err(|source| EngineError::ThreadSpawn {
                thread: "scheduler",
                source,
            })
    }
}
