//! Diagnostic endpoint - HTTP listener serving process profiles
//!
//! Routes (all GET):
//! - `/debug/pprof/` - index
//! - `/debug/pprof/goroutine` - live detached workers per site
//! - `/debug/pprof/heap`, `/debug/pprof/allocs` - allocator counters and RSS
//! - `/debug/pprof/block` - blocking events and held locks
//! - `/debug/pprof/mutex` - lock contention events and held locks
//! - `/debug/pprof/threadcreate` - workers spawned per site
//! - `/debug/pprof/profile?seconds=N` - CPU usage over a window
//! - `/debug/pprof/cmdline` - process command line
//!
//! `?debug=1` returns text, anything else returns JSON. No auth, no TLS.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tokio::net::TcpListener;

use super::{profile, Diagnostics};
use crate::config::{DEFAULT_CPU_PROFILE_SECONDS, MAX_CPU_PROFILE_SECONDS};
use crate::errors::{HarnessError, Result};

const PROFILES: [(&str, &str); 7] = [
    ("goroutine", "Live detached workers grouped by spawn site"),
    ("heap", "Allocator counters, resident and virtual size"),
    ("allocs", "Same as heap"),
    ("block", "Blocking events and locks currently held"),
    ("mutex", "Lock contention events and locks currently held"),
    ("threadcreate", "Workers spawned per site since start"),
    ("profile", "CPU usage over ?seconds=N (default 30)"),
];

#[derive(Debug, Default, Deserialize)]
pub struct ProfileParams {
    pub debug: Option<u8>,
    pub seconds: Option<u64>,
}

/// Build the router serving `diagnostics`
pub fn router(diagnostics: Diagnostics) -> Router {
    Router::new()
        .route("/debug/pprof", get(index))
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/goroutine", get(goroutine))
        .route("/debug/pprof/heap", get(heap))
        .route("/debug/pprof/allocs", get(heap))
        .route("/debug/pprof/block", get(block))
        .route("/debug/pprof/mutex", get(mutex))
        .route("/debug/pprof/threadcreate", get(threadcreate))
        .route("/debug/pprof/profile", get(cpu))
        .route("/debug/pprof/cmdline", get(cmdline))
        .fallback(not_found)
        .with_state(diagnostics)
}

/// Bind the diagnostic listener. Failure here is fatal to the harness.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| HarnessError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve profiles on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, diagnostics: Diagnostics) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "diagnostic endpoint listening");

    axum::serve(listener, router(diagnostics)).await?;
    Ok(())
}

fn render<T: Serialize + Display>(params: &ProfileParams, profile: T) -> Response {
    if params.debug.unwrap_or(0) > 0 {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            profile.to_string(),
        )
            .into_response()
    } else {
        Json(profile).into_response()
    }
}

async fn index(State(diagnostics): State<Diagnostics>) -> String {
    let goroutines = diagnostics.total_live_workers();
    let spawned = diagnostics.spawned_total();

    let mut body = String::from("/debug/pprof/\n\nProfiles:\n");
    for (name, description) in PROFILES {
        let count = match name {
            "goroutine" => goroutines.to_string(),
            "threadcreate" => spawned.to_string(),
            _ => "-".to_string(),
        };
        body.push_str(&format!("{:>8}  {:<13} {}\n", count, name, description));
    }
    body.push_str("\nAppend ?debug=1 for text output.\n");
    body
}

async fn goroutine(
    State(diagnostics): State<Diagnostics>,
    Query(params): Query<ProfileParams>,
) -> Response {
    render(&params, diagnostics.goroutine_profile())
}

async fn heap(Query(params): Query<ProfileParams>) -> Response {
    render(&params, profile::heap_profile())
}

async fn block(
    State(diagnostics): State<Diagnostics>,
    Query(params): Query<ProfileParams>,
) -> Response {
    render(&params, diagnostics.block_profile())
}

async fn mutex(
    State(diagnostics): State<Diagnostics>,
    Query(params): Query<ProfileParams>,
) -> Response {
    render(&params, diagnostics.mutex_profile())
}

async fn threadcreate(
    State(diagnostics): State<Diagnostics>,
    Query(params): Query<ProfileParams>,
) -> Response {
    render(&params, diagnostics.threadcreate_profile())
}

async fn cpu(Query(params): Query<ProfileParams>) -> Response {
    let seconds = params
        .seconds
        .unwrap_or(DEFAULT_CPU_PROFILE_SECONDS)
        .min(MAX_CPU_PROFILE_SECONDS);
    render(&params, profile::cpu_profile(Duration::from_secs(seconds)).await)
}

async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "unknown profile\n")
}
