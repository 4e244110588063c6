//! busy-poll - four workers spinning on an empty channel
//!
//! Serves profiles on 0.0.0.0:6061 in the foreground.

use anyhow::Context;
use clap::Parser;
use pathos_core::config::{BUSY_POLL_DIAGNOSTIC_ADDR, BUSY_POLL_WORKERS};
use pathos_core::diagnostics::server;
use pathos_core::{logging, spin_poll, CountingAllocator, Diagnostics, RuntimeTuning};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "busy-poll")]
#[command(version)]
#[command(about = "Workers burning CPU on a receive that never succeeds", long_about = None)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();
    CountingAllocator::mark_installed();
    logging::init().context("failed to initialize logging")?;

    let diagnostics = Diagnostics::global().clone();
    // no CPU restriction here: each poller gets its own core
    let tuning = RuntimeTuning {
        max_procs: None,
        ..RuntimeTuning::default()
    };
    tuning.apply(&diagnostics);

    let _senders = spin_poll::spawn_pollers(&diagnostics, BUSY_POLL_WORKERS);
    tracing::info!(workers = BUSY_POLL_WORKERS, "busy pollers started");

    let runtime = tuning.build_runtime().context("failed to start diagnostic runtime")?;
    runtime.block_on(async {
        let listener = server::bind(BUSY_POLL_DIAGNOSTIC_ADDR)
            .await
            .context("diagnostic listener failed to start")?;
        server::serve(listener, diagnostics)
            .await
            .context("diagnostic endpoint failed")
    })
}
