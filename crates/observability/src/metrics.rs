//! Dispatcher metrics exported through the `metrics` facade
//!
//! Every function is a no-op until a recorder is installed (see `init_with_config`).

use metrics::{counter, gauge, histogram};

/// Record the end of one dispatch cycle
pub fn record_cycle(aborted: bool, keys_seen: usize, keys_failed: usize, duration_ms: f64) {
    let status = if aborted { "aborted" } else { "completed" };
    counter!("shuffler_dispatch_cycles_total", "status" => status).increment(1);

    gauge!("shuffler_dispatch_keys").set(keys_seen as f64);
    if keys_failed > 0 {
        counter!("shuffler_dispatch_key_failures_total").increment(keys_failed as u64);
    }
    histogram!("shuffler_dispatch_cycle_duration_ms").record(duration_ms);
}

/// Record one batch handed to the analyzer transport
pub fn record_batch_sent(success: bool, size: usize) {
    let status = if success { "success" } else { "failure" };
    counter!("shuffler_batches_sent_total", "status" => status).increment(1);
    if success {
        counter!("shuffler_observations_sent_total").increment(size as u64);
    }
    histogram!("shuffler_batch_size").record(size as f64);
}

/// Record items removed from the buffer
///
/// `reason` is `dispatched` or `expired`.
pub fn record_items_deleted(reason: &'static str, count: usize) {
    counter!("shuffler_items_deleted_total", "reason" => reason).increment(count as u64);
}

/// Record a transport lifecycle event (`close`, `reconnect`)
pub fn record_transport_event(event: &'static str) {
    counter!("shuffler_transport_events_total", "event" => event).increment(1);
}

/// Record current buffer size
pub fn record_buffer_depth(keys: usize, items: usize) {
    gauge!("shuffler_buffer_keys").set(keys as f64);
    gauge!("shuffler_buffer_items").set(items as f64);
}
