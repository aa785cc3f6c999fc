//! Append-only CSV/JSONL writers (C9).
//!
//! Every writer creates its parent directory tree lazily, writes a
//! header only on first creation (mirrors `original_source`'s
//! `fstat`-then-maybe-header pattern), and never panics: a failed write
//! is logged via `tracing::error!` and the pipeline continues (spec
//! §7(d)). fsync-per-write is controlled by `Settings::fsync_per_write`.

use crate::config::Settings;
use crate::error::WriteError;
use crate::time::format_minute_iso;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One open append-only file, with a remembered header so it's written
/// exactly once per file.
struct AppendFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl AppendFile {
    fn open(path: PathBuf, header: &str) -> Result<Self, WriteError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let is_new = !path.exists() || std::fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| WriteError::Io {
                path: path.display().to_string(),
                source,
            })?;
        if is_new && !header.is_empty() {
            file.write_all(header.as_bytes())
                .map_err(|source| WriteError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
        }
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn append_line(&self, line: &str, fsync: bool) {
        let mut file = self.file.lock().expect("append file mutex poisoned");
        if let Err(source) = file.write_all(line.as_bytes()) {
            tracing::error!(path = %self.path.display(), %source, "failed to write log line");
            return;
        }
        if fsync {
            if let Err(source) = file.sync_all() {
                tracing::warn!(path = %self.path.display(), %source, "failed to fsync log file");
            }
        }
    }

    /// Appends one CSV row through `csv::Writer`, so field quoting/escaping
    /// follows RFC 4180 instead of a hand-rolled `format!` join. Headers
    /// are still handled by `open` as a plain line, since they're written
    /// at most once and never need escaping (the header columns are fixed
    /// identifiers, never free-form symbol names).
    fn append_record(&self, fields: &[&str], fsync: bool) {
        let mut file = self.file.lock().expect("append file mutex poisoned");
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut *file);
        if let Err(source) = writer.write_record(fields) {
            tracing::error!(path = %self.path.display(), %source, "failed to write log row");
            return;
        }
        if let Err(source) = writer.flush() {
            tracing::error!(path = %self.path.display(), %source, "failed to flush log row");
            return;
        }
        drop(writer);
        if fsync {
            if let Err(source) = file.sync_all() {
                tracing::warn!(path = %self.path.display(), %source, "failed to fsync log file");
            }
        }
    }
}

/// Per-symbol trade log (`trades/<SYMBOL>.jsonl`): one raw payload per line.
pub struct TradeLog {
    files: Vec<AppendFile>,
    fsync: bool,
}

impl TradeLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let mut files = Vec::with_capacity(settings.symbols.len());
        for name in &settings.symbols {
            let path = settings.trades_dir().join(format!("{name}.jsonl"));
            files.push(AppendFile::open(path, "")?);
        }
        Ok(Self {
            files,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(&self, symbol_index: usize, raw_payload: &[u8]) {
        let Some(file) = self.files.get(symbol_index) else {
            tracing::error!(symbol_index, "trade log file not opened for symbol index");
            return;
        };
        let mut line = String::with_capacity(raw_payload.len() + 1);
        line.push_str(&String::from_utf8_lossy(raw_payload));
        line.push('\n');
        file.append_line(&line, self.fsync);
    }
}

/// Per-symbol VWAP log (`metrics/vwap/<SYMBOL>.csv`).
pub struct VwapLog {
    files: Vec<AppendFile>,
    fsync: bool,
}

impl VwapLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let mut files = Vec::with_capacity(settings.symbols.len());
        for name in &settings.symbols {
            let path = settings.vwap_dir().join(format!("{name}.csv"));
            files.push(AppendFile::open(path, "timestamp_iso,vwap\n")?);
        }
        Ok(Self {
            files,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(&self, symbol_index: usize, minute_ts_ms: i64, vwap: f64) {
        let Some(file) = self.files.get(symbol_index) else {
            tracing::error!(symbol_index, "vwap log file not opened for symbol index");
            return;
        };
        let iso = format_minute_iso(minute_ts_ms);
        let vwap_field = format!("{vwap:.12}");
        file.append_record(&[iso.as_str(), vwap_field.as_str()], self.fsync);
    }
}

/// Per-symbol correlation log (`metrics/correlations/<SYMBOL>.csv`).
pub struct CorrelationLog {
    files: Vec<AppendFile>,
    fsync: bool,
}

impl CorrelationLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let mut files = Vec::with_capacity(settings.symbols.len());
        for name in &settings.symbols {
            let path = settings.correlation_dir().join(format!("{name}.csv"));
            files.push(AppendFile::open(
                path,
                "timestamp_iso,correlated_with,correlation,lag_timestamp_iso\n",
            )?);
        }
        Ok(Self {
            files,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(
        &self,
        symbol_index: usize,
        minute_ts_ms: i64,
        correlated_with: &str,
        correlation: f64,
        lag_minute_ts_ms: i64,
    ) {
        let Some(file) = self.files.get(symbol_index) else {
            tracing::error!(symbol_index, "correlation log file not opened for symbol index");
            return;
        };
        let iso = format_minute_iso(minute_ts_ms);
        let lag_iso = if lag_minute_ts_ms != 0 {
            format_minute_iso(lag_minute_ts_ms)
        } else {
            String::new()
        };
        let correlation_field = format!("{correlation:.6}");
        file.append_record(
            &[
                iso.as_str(),
                correlated_with,
                correlation_field.as_str(),
                lag_iso.as_str(),
            ],
            self.fsync,
        );
    }
}

/// Latency log (`performance/latency.csv`): one row per ingested trade.
pub struct LatencyLog {
    file: AppendFile,
    fsync: bool,
}

impl LatencyLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let path = settings.performance_dir().join("latency.csv");
        let header = "symbol_index,exchange_ts_ms,recv_ts_ms,process_ts_ms,\
                       network_latency_ms,processing_latency_ms,total_latency_ms\n";
        Ok(Self {
            file: AppendFile::open(path, header)?,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(
        &self,
        symbol_index: usize,
        exchange_ts_ms: i64,
        recv_ts_ms: i64,
        process_ts_ms: i64,
    ) {
        let network_latency_ms = recv_ts_ms - exchange_ts_ms;
        let processing_latency_ms = process_ts_ms - recv_ts_ms;
        let total_latency_ms = process_ts_ms - exchange_ts_ms;
        self.file.append_record(
            &[
                symbol_index.to_string().as_str(),
                exchange_ts_ms.to_string().as_str(),
                recv_ts_ms.to_string().as_str(),
                process_ts_ms.to_string().as_str(),
                network_latency_ms.to_string().as_str(),
                processing_latency_ms.to_string().as_str(),
                total_latency_ms.to_string().as_str(),
            ],
            self.fsync,
        );
    }
}

/// System resource log (`performance/system.csv`): one row per minute.
pub struct SystemLog {
    file: AppendFile,
    fsync: bool,
}

impl SystemLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let path = settings.performance_dir().join("system.csv");
        Ok(Self {
            file: AppendFile::open(path, "timestamp_ms,cpu_percent,memory_mb\n")?,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(&self, timestamp_ms: i64, cpu_percent: f64, memory_mb: f64) {
        self.file.append_record(
            &[
                timestamp_ms.to_string().as_str(),
                format!("{cpu_percent:.2}").as_str(),
                format!("{memory_mb:.2}").as_str(),
            ],
            self.fsync,
        );
    }
}

/// Scheduler timing log (`performance/scheduler.csv`): one row per tick.
pub struct SchedulerLog {
    file: AppendFile,
    fsync: bool,
}

impl SchedulerLog {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let path = settings.performance_dir().join("scheduler.csv");
        Ok(Self {
            file: AppendFile::open(path, "scheduled_ms,actual_ms,drift_ms\n")?,
            fsync: settings.fsync_per_write,
        })
    }

    pub fn append(&self, scheduled_ms: i64, actual_ms: i64, drift_ms: f64) {
        self.file.append_record(
            &[
                scheduled_ms.to_string().as_str(),
                actual_ms.to_string().as_str(),
                format!("{drift_ms:.2}").as_str(),
            ],
            self.fsync,
        );
    }
}

/// All output sinks, bundled for convenient construction/ownership by
/// [`crate::engine::Engine`].
pub struct Logs {
    pub trades: TradeLog,
    pub vwap: VwapLog,
    pub correlations: CorrelationLog,
    pub latency: LatencyLog,
    pub system: SystemLog,
    pub scheduler: SchedulerLog,
}

impl Logs {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        Ok(Self {
            trades: TradeLog::new(settings)?,
            vwap: VwapLog::new(settings)?,
            correlations: CorrelationLog::new(settings)?,
            latency: LatencyLog::new(settings)?,
            system: SystemLog::new(settings)?,
            scheduler: SchedulerLog::new(settings)?,
        })
    }
}

/// Ensures the full output directory tree exists (spec §7(a): directory
/// creation failure is init-fatal).
pub fn ensure_data_dirs(settings: &Settings) -> std::io::Result<()> {
    for dir in [
        settings.trades_dir(),
        settings.vwap_dir(),
        settings.correlation_dir(),
        settings.performance_dir(),
    ] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings_in(dir: &Path) -> Settings {
        let mut s = Settings::default();
        s.symbols = vec!["BTC-USDT".into(), "ETH-USDT".into()];
        s.data_dir = dir.to_path_buf();
        s
    }

    #[test]
    fn vwap_log_writes_header_once() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        ensure_data_dirs(&settings).unwrap();
        let log = VwapLog::new(&settings).unwrap();
        log.append(0, 60_000, 100.5);
        log.append(0, 120_000, 101.25);

        let path = settings.vwap_dir().join("BTC-USDT.csv");
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().next().unwrap(), "timestamp_iso,vwap");
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn correlation_log_header_and_row_shape() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        ensure_data_dirs(&settings).unwrap();
        let log = CorrelationLog::new(&settings).unwrap();
        log.append(1, 60_000, "BTC-USDT", 0.8234, 120_000);

        let path = settings.correlation_dir().join("ETH-USDT.csv");
        let contents = std::fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp_iso,correlated_with,correlation,lag_timestamp_iso"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("BTC-USDT"));
        assert!(row.contains("0.8234") || row.contains("0.823400"));
    }

    #[test]
    fn latency_log_computes_derived_columns() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        ensure_data_dirs(&settings).unwrap();
        let log = LatencyLog::new(&settings).unwrap();
        log.append(0, 1_000, 1_050, 1_080);

        let path = settings.performance_dir().join("latency.csv");
        let contents = std::fs::read_to_string(path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "0,1000,1050,1080,50,30,80");
    }
}
