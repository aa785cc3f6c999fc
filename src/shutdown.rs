//! Signal handling (A6): SIGINT/SIGTERM set a shared flag and wake every
//! thread that might be blocked waiting on it.
//!
//! Grounded in `original_source/src/main.c`'s `on_termination_signal`.
//! `ctrlc` is the pack's standard way to install a portable handler
//! (see `other_examples/manifests`); `lws_cancel_service`'s role is
//! played here by [`TransportHandle::cancel`](crate::transport::TransportHandle::cancel).

use crate::ring::IngressRing;
use crate::transport::TransportHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs a combined SIGINT/SIGTERM handler that sets `shutdown`,
/// wakes the ingress ring's consumer, and cancels the transport.
///
/// Safe to call once per process; a second call returns an error from
/// the underlying `ctrlc` crate, which callers should treat as fatal
/// during startup.
pub fn install(
    shutdown: Arc<AtomicBool>,
    ring: Arc<IngressRing>,
    transport: Arc<TransportHandle>,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
        ring.notify_shutdown();
        transport.cancel();
    })
}
