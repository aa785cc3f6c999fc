//! OKX public WebSocket client.
//!
//! Subscribes to the `trades` channel for every tracked symbol and
//! copies each incoming frame into the ingress ring untouched; decoding
//! happens downstream in [`crate::decode::okx`]. Reconnects with
//! exponential backoff (bounded by `Settings::transport_max_retries`),
//! mirroring the retry posture `original_source` applies around
//! `libwebsockets`' own reconnect loop.

use super::TransportHandle;
use crate::config::Settings;
use crate::error::TransportError;
use crate::ring::{IngressRing, RawTradeMessage};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

const OKX_PUBLIC_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";
const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Spawns the transport on its own OS thread and returns immediately.
pub fn spawn(
    settings: Settings,
    ring: Arc<IngressRing>,
    handle: Arc<TransportHandle>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("okx-transport".to_string())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build transport runtime");
            runtime.block_on(run(settings, ring, handle));
        })
}

async fn run(settings: Settings, ring: Arc<IngressRing>, handle: Arc<TransportHandle>) {
    let mut attempt: u32 = 0;
    while !handle.is_cancelled() {
        match connect_and_stream(&settings, &ring, &handle).await {
            Ok(()) => attempt = 0,
            Err(err) => {
                attempt += 1;
                tracing::warn!(%err, attempt, "okx transport connection lost");
                if attempt >= settings.transport_max_retries {
                    tracing::error!(
                        attempts = attempt,
                        "okx transport retries exhausted, giving up"
                    );
                    return;
                }
                tokio::time::sleep(backoff_for(attempt)).await;
            }
        }
    }
}

async fn connect_and_stream(
    settings: &Settings,
    ring: &IngressRing,
    handle: &TransportHandle,
) -> Result<(), TransportError> {
    let (mut ws_stream, _response) = tokio_tungstenite::connect_async(OKX_PUBLIC_WS_URL)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    let subscribe = crate::decode::okx::subscribe_payload(&settings.symbols);
    ws_stream
        .send(Message::Text(subscribe))
        .await
        .map_err(|e| TransportError::Protocol(e.to_string()))?;

    while !handle.is_cancelled() {
        let next = tokio::time::timeout(RECV_POLL_INTERVAL, ws_stream.next()).await;
        let message = match next {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => return Err(TransportError::Protocol(e.to_string())),
            Ok(None) => return Err(TransportError::Protocol("stream closed by peer".to_string())),
            Err(_elapsed) => continue,
        };

        if let Message::Text(text) = message {
            let receive_ts_ms = crate::time::now_ms();
            let (raw, truncated) = RawTradeMessage::from_payload(text.as_bytes(), receive_ts_ms);
            if truncated {
                handle.record_truncation();
            }
            ring.push(raw);
        }
    }
    Ok(())
}

/// `base * 2^attempt`, capped at `MAX_BACKOFF`, plus a deterministic
/// jitter proportional to the attempt count (no RNG dependency needed
/// for this bounded, low-stakes spread).
fn backoff_for(attempt: u32) -> Duration {
    let scaled = BASE_BACKOFF.saturating_mul(1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX));
    let capped = scaled.min(MAX_BACKOFF);
    let jitter = Duration::from_millis((u64::from(attempt) * 37) % 250);
    capped + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_is_capped() {
        let first = backoff_for(1);
        let later = backoff_for(10);
        assert!(first < later);
        assert!(later <= MAX_BACKOFF + Duration::from_millis(250));
    }
}
