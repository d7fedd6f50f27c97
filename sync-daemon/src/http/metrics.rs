//! Prometheus metrics endpoint.

use super::AppState;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::fmt::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let m = &state.metrics;

    // Counters: monotonic since startup
    let cycles = m.cycles_total.load(Ordering::Relaxed);
    let inserted = m.inserted_total.load(Ordering::Relaxed);
    let duplicates = m.duplicates_total.load(Ordering::Relaxed);
    let deferred = m.deferred_total.load(Ordering::Relaxed);
    let dropped = m.dropped_total.load(Ordering::Relaxed);
    let fetch_errors = m.fetch_errors_total.load(Ordering::Relaxed);
    let store_errors = m.store_errors_total.load(Ordering::Relaxed);
    let actions_failed = m.actions_failed_total.load(Ordering::Relaxed);

    // Gauges: current state
    let active = m.active_records.load(Ordering::Relaxed);

    let mut body = format!(
        r#"# HELP twiliodb_sync_info Daemon information
# TYPE twiliodb_sync_info gauge
twiliodb_sync_info{{version="{version}"}} 1

# HELP twiliodb_sync_cycles_total Completed sync cycles
# TYPE twiliodb_sync_cycles_total counter
twiliodb_sync_cycles_total {cycles}

# HELP twiliodb_sync_inserted_total Records inserted into the store
# TYPE twiliodb_sync_inserted_total counter
twiliodb_sync_inserted_total {inserted}

# HELP twiliodb_sync_duplicates_total Records skipped because they were already stored
# TYPE twiliodb_sync_duplicates_total counter
twiliodb_sync_duplicates_total {duplicates}

# HELP twiliodb_sync_deferred_total Records deferred to a later cycle
# TYPE twiliodb_sync_deferred_total counter
twiliodb_sync_deferred_total {deferred}

# HELP twiliodb_sync_dropped_total In-flight records dropped after vanishing remotely
# TYPE twiliodb_sync_dropped_total counter
twiliodb_sync_dropped_total {dropped}

# HELP twiliodb_sync_fetch_errors_total Remote fetch failures
# TYPE twiliodb_sync_fetch_errors_total counter
twiliodb_sync_fetch_errors_total {fetch_errors}

# HELP twiliodb_sync_store_errors_total Store failures
# TYPE twiliodb_sync_store_errors_total counter
twiliodb_sync_store_errors_total {store_errors}

# HELP twiliodb_sync_actions_failed_total Failed dependent actions
# TYPE twiliodb_sync_actions_failed_total counter
twiliodb_sync_actions_failed_total {actions_failed}

# HELP twiliodb_sync_active_records Records awaiting a terminal status
# TYPE twiliodb_sync_active_records gauge
twiliodb_sync_active_records {active}

# HELP twiliodb_sync_rows Rows currently stored per resource table
# TYPE twiliodb_sync_rows gauge
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    // Row counts, best effort
    for resource_type in &state.resources {
        let rows = state.store.count(*resource_type).await.unwrap_or(0);
        let _ = writeln!(
            body,
            "twiliodb_sync_rows{{resource=\"{}\"}} {rows}",
            resource_type.descriptor().table
        );
    }

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
