// 2025 Thomas Bicanic – MIT License

use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Instant,
};

/* ───────────── Raw latencies ───────────────────────────── */

static TIMES: Lazy<Mutex<Vec<(&'static str, u128)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Call from the wrappers: `record("enqueue_write", t)` with `t` taken before the call.
pub fn record(name: &'static str, start: Instant) {
    let dur = start.elapsed().as_micros();
    if let Ok(mut times) = TIMES.lock() {
        times.push((name, dur));
    }
}

/* ───────────── Live buffer allocations ─────────────────── */

pub static ALLOCS: AtomicUsize = AtomicUsize::new(0);
pub static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Mean and p95 of a latency sample set, in µs.
pub(crate) fn stats(samples: &mut [u128]) -> Option<(u128, u128)> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    let mean = samples.iter().sum::<u128>() / samples.len() as u128;
    let p95 = samples[((samples.len() * 95) / 100).saturating_sub(1)];
    Some((mean, p95))
}

/* ───────────── Summary ─────────────────────────────────── */

/// Logs the grouped latencies; call once at the end of `main`.
pub fn summary() {
    let mut map: BTreeMap<&str, Vec<u128>> = BTreeMap::new();
    if let Ok(mut times) = TIMES.lock() {
        for (name, us) in times.drain(..) {
            map.entry(name).or_default().push(us);
        }
    }

    log::info!("── metrics summary ──");
    for (name, mut v) in map {
        if let Some((mean, p95)) = stats(&mut v) {
            log::info!("{:<18} n={:<4} mean={:>7} µs   p95={:>7} µs", name, v.len(), mean, p95);
        }
    }

    let allocs = ALLOCS.load(Ordering::Relaxed);
    let bytes = ALLOC_BYTES.load(Ordering::Relaxed);
    log::info!("live GPU allocations: {}   ({} KiB)", allocs, bytes / 1024);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_empty_set_is_none() {
        assert_eq!(stats(&mut []), None);
    }

    #[test]
    fn stats_sorts_before_taking_p95() {
        let mut v: Vec<u128> = (1..=100).rev().collect();
        assert_eq!(stats(&mut v), Some((50, 95)));
    }
}
