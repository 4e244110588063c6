//! Pathos - pathology harness
//!
//! Pins itself to one CPU, turns on contention sampling, serves profiles on
//! 0.0.0.0:6060 and cycles the actors until killed.

use anyhow::Context;
use clap::Parser;
use pathos_core::config::DIAGNOSTIC_ADDR;
use pathos_core::diagnostics::server;
use pathos_core::{logging, CountingAllocator, Diagnostics, Registry, RuntimeTuning, Scheduler};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "pathos")]
#[command(version)]
#[command(
    about = "Reproducible thread leaks, lock starvation, busy loops and memory retention",
    long_about = None
)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();
    CountingAllocator::mark_installed();
    logging::init().context("failed to initialize logging")?;

    let diagnostics = Diagnostics::global().clone();
    let tuning = RuntimeTuning::default();
    tuning.apply(&diagnostics);

    let runtime = tuning.build_runtime().context("failed to start diagnostic runtime")?;
    let listener = runtime
        .block_on(server::bind(DIAGNOSTIC_ADDR))
        .context("diagnostic listener failed to start")?;

    let served = diagnostics.clone();
    runtime.spawn(async move {
        match server::serve(listener, served).await {
            Ok(()) => {
                tracing::info!("diagnostic endpoint stopped");
                std::process::exit(0);
            }
            Err(e) => {
                tracing::error!(error = %e, "diagnostic endpoint failed");
                std::process::exit(1);
            }
        }
    });

    Scheduler::new(Registry::standard(&diagnostics)).run_forever()
}
