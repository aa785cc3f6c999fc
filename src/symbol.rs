//! Per-symbol state (spec §3): a sliding window, a VWAP history, and a
//! stable name. Created once at startup, destroyed at shutdown; each
//! symbol exclusively owns its windows and history. Workers only ever
//! take short-lived locks on them.

use crate::config::{Settings, VWAP_HISTORY_CAPACITY};
use crate::history::VwapHistory;
use crate::window::SlidingWindow;

pub struct Symbol {
    pub name: String,
    pub window: SlidingWindow,
    pub history: VwapHistory,
}

impl Symbol {
    pub fn new(name: impl Into<String>, window_capacity: usize) -> Self {
        Self {
            name: name.into(),
            window: SlidingWindow::new(window_capacity),
            history: VwapHistory::new(VWAP_HISTORY_CAPACITY),
        }
    }
}

/// Builds the fixed, process-lifetime array of tracked symbols.
pub fn build_symbol_table(settings: &Settings) -> Vec<Symbol> {
    settings
        .symbols
        .iter()
        .map(|name| Symbol::new(name.clone(), settings.window_capacity))
        .collect()
}

/// Resolves a symbol name (OKX `instId`) to its stable index.
pub fn symbol_index(symbols: &[Symbol], name: &str) -> Option<usize> {
    symbols.iter().position(|s| s.name == name)
}
