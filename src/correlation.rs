//! Lagged Pearson correlation search (C7).
//!
//! Grounded in `original_source/src/compute/correlation.c`: both the
//! `pearson_correlation` formula and `find_best_lagged_correlation`'s
//! index arithmetic are carried over unchanged.

use crate::history::{VwapHistory, VwapPoint};

/// Pearson correlation coefficient of two equal-length vectors. `NaN` if
/// either vector has zero variance (the denominator is zero).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    if n == 0.0 {
        return f64::NAN;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for i in 0..x.len() {
        sum_x += x[i];
        sum_y += y[i];
        sum_xy += x[i] * y[i];
        sum_x2 += x[i] * x[i];
        sum_y2 += y[i] * y[i];
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Best-matching lagged correlation between `src` (the source symbol's
/// most recent `window_len` VWAP points) and `target`'s own history.
///
/// Searches offsets `min_offset..=max_offset`, where `max_offset` is
/// capped at both `max_lag_minutes` and how much history `target`
/// actually holds. Ties are broken by first occurrence (smallest
/// offset), matching `find_best_lagged_correlation`'s `>` comparison.
/// Returns `None` if `target` doesn't yet hold enough history for even
/// the smallest offset.
pub fn best_lagged(
    src: &[f64],
    target: &VwapHistory,
    window_len: usize,
    min_offset: usize,
    max_lag_minutes: usize,
) -> Option<(f64, i64)> {
    target.with_locked(|view| {
        if view.size < window_len + min_offset {
            return None;
        }
        let max_offset = (view.size - window_len).min(max_lag_minutes);
        if min_offset > max_offset {
            return None;
        }

        let mut best_corr = f64::NAN;
        let mut best_end_ts_ms = 0i64;
        let mut found = false;

        for offset in min_offset..=max_offset {
            let window_start_idx = (view.head + view.size - window_len - offset) % view.capacity;
            let mut target_vec = Vec::with_capacity(window_len);
            for k in 0..window_len {
                target_vec.push(view.at(window_start_idx + k).vwap);
            }
            let corr = pearson_correlation(src, &target_vec);
            if corr.is_nan() {
                continue;
            }
            if !found || corr.abs() > best_corr.abs() {
                found = true;
                best_corr = corr;
                let end_idx = (window_start_idx + window_len - 1) % view.capacity;
                best_end_ts_ms = view.at(end_idx).minute_ts_ms;
            }
        }

        if found {
            Some((best_corr, best_end_ts_ms))
        } else {
            None
        }
    })
}

/// Extracts the `vwap` field from a slice of [`VwapPoint`]s, for
/// building a plain correlation input vector from `get_recent`'s output.
pub fn vwap_values(points: &[VwapPoint]) -> Vec<f64> {
    points.iter().map(|p| p.vwap).collect()
}

/// Runs one tick of the correlation worker across every source symbol.
///
/// For each source symbol `i`, takes its own most recent
/// `CORRELATION_POINTS` VWAP values and finds the single best-matching
/// lagged window among every target symbol `j` (including itself, with
/// `min_offset = CORRELATION_POINTS` so the comparison never overlaps
/// the source window — spec §9's self-correlation rule). Only the
/// single best match across all targets is logged per source symbol;
/// ties are broken by first occurrence in symbol order, same as
/// `best_lagged`'s offset tie-break.
pub fn tick(
    symbols: &[crate::symbol::Symbol],
    current_minute_ms: i64,
    window_len: usize,
    max_lag_minutes: usize,
    correlation_log: &crate::logs::CorrelationLog,
) {
    let mut recent_buf = vec![VwapPoint { minute_ts_ms: 0, vwap: 0.0 }; window_len];

    for (i, source) in symbols.iter().enumerate() {
        if !source.history.get_recent(window_len, &mut recent_buf) {
            continue;
        }
        let src_vec = vwap_values(&recent_buf);

        let mut best: Option<(f64, i64, usize)> = None;
        for (j, target) in symbols.iter().enumerate() {
            let min_offset = if i == j { window_len } else { 0 };
            let Some((corr, lag_ts_ms)) =
                best_lagged(&src_vec, &target.history, window_len, min_offset, max_lag_minutes)
            else {
                continue;
            };
            let better = match best {
                Some((best_corr, _, _)) => corr.abs() > best_corr.abs(),
                None => true,
            };
            if better {
                best = Some((corr, lag_ts_ms, j));
            }
        }

        if let Some((corr, lag_ts_ms, j)) = best {
            correlation_log.append(i, current_minute_ms, &symbols[j].name, corr, lag_ts_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CORRELATION_POINTS, MAX_LAG_MINUTES};

    #[test]
    fn perfectly_correlated_vectors_give_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson_correlation(&x, &y) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perfectly_anticorrelated_vectors_give_minus_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((pearson_correlation(&x, &y) - (-1.0)).abs() < 1e-9);
    }

    /// S6 — a constant vector has zero variance; correlation is NaN
    /// regardless of the other side, so no row should ever be emitted
    /// for it.
    #[test]
    fn constant_vector_correlation_is_nan_s6() {
        let x = [5.0, 5.0, 5.0, 5.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!(pearson_correlation(&x, &y).is_nan());
    }

    #[test]
    fn symmetry_law() {
        let x = [1.0, 3.0, 2.0, 5.0, 4.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        assert_eq!(pearson_correlation(&x, &y), pearson_correlation(&y, &x));
    }

    #[test]
    fn best_lagged_picks_matching_offset() {
        let hist = VwapHistory::new(crate::config::VWAP_HISTORY_CAPACITY);
        // Build a ramp so a specific lag produces a perfect match.
        for i in 0..20i64 {
            hist.append(i * 60_000, i as f64);
        }
        let src = vec![12.0, 13.0, 14.0, 15.0];
        let (corr, _end_ts) = best_lagged(&src, &hist, 4, 0, MAX_LAG_MINUTES).unwrap();
        assert!((corr - 1.0).abs() < 1e-6);
    }

    #[test]
    fn best_lagged_none_when_insufficient_history() {
        let hist = VwapHistory::new(crate::config::VWAP_HISTORY_CAPACITY);
        hist.append(0, 1.0);
        let src = vec![1.0; CORRELATION_POINTS];
        assert!(best_lagged(&src, &hist, CORRELATION_POINTS, 0, MAX_LAG_MINUTES).is_none());
    }

    /// S4 — self-correlation must skip lags below `min_offset = P`: a
    /// symbol's own most-recent window never gets compared against
    /// itself or any overlapping window.
    #[test]
    fn self_correlation_respects_min_offset_s4() {
        let hist = VwapHistory::new(crate::config::VWAP_HISTORY_CAPACITY);
        for i in 0..16i64 {
            hist.append(i * 60_000, i as f64);
        }
        // The "source" vector is this symbol's own latest P points: v8..v15.
        let mut recent = vec![VwapPoint { minute_ts_ms: 0, vwap: 0.0 }; CORRELATION_POINTS];
        assert!(hist.get_recent(CORRELATION_POINTS, &mut recent));
        let src = vwap_values(&recent);

        let result = best_lagged(&src, &hist, CORRELATION_POINTS, CORRELATION_POINTS, MAX_LAG_MINUTES);
        // Only one non-overlapping window exists (v0..v7); it's a
        // perfect match offset by exactly P points along the same ramp.
        let (corr, _) = result.unwrap();
        assert!((corr - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tick_logs_best_match_per_source_symbol() {
        use crate::config::Settings;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.symbols = vec!["BTC-USDT".to_string(), "ETH-USDT".to_string()];
        settings.data_dir = dir.path().to_path_buf();
        crate::logs::ensure_data_dirs(&settings).unwrap();

        let symbols = crate::symbol::build_symbol_table(&settings);
        for i in 0..16i64 {
            symbols[0].history.append(i * 60_000, i as f64);
            symbols[1].history.append(i * 60_000, (i * 2) as f64);
        }

        let log = crate::logs::CorrelationLog::new(&settings).unwrap();
        tick(&symbols, 16 * 60_000, CORRELATION_POINTS, MAX_LAG_MINUTES, &log);

        let contents =
            std::fs::read_to_string(settings.correlation_dir().join("BTC-USDT.csv")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
