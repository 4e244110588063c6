// Registry Contract Tests
//
// These tests pin down what every run of the harness must look like.
// Monitoring pipelines are validated against these exact pathologies, in
// this exact order, at this exact strength.

use pathos_core::actor::Actor;
use pathos_core::config::{
    BLOCK_PROFILE_RATE, CYCLE_INTERVAL, DIAGNOSTIC_ADDR, MAX_PROCS, MUTEX_PROFILE_FRACTION,
};
use pathos_core::registry::ACTOR_NAMES;
use pathos_core::{
    Diagnostics, Registry, ShaHeShang, TangSeng, WuKong, ZhuBaJie, GI, KI, MI, PI, TI,
};
use std::time::Duration;

/// WHY: Byte multipliers size every memory pathology
/// REASON: 16 MiB churn and 1 GiB retention are expressed in these units
/// BREAKS: Alert thresholds tuned to the documented footprint
#[test]
fn unit_constants_are_powers_of_1024() {
    assert_eq!(KI, 1024);
    assert_eq!(MI, 1024 * KI);
    assert_eq!(GI, 1024 * MI);
    assert_eq!(TI, 1024 * GI as u64);
    assert_eq!(PI, 1024 * TI);
}

/// WHY: Invocation order is part of the observable behavior
/// REASON: Head-of-line blocking depends on who runs before whom
/// BREAKS: Log-based checks expecting WuKong first, ShaHeShang last
#[test]
fn registry_order_is_fixed() {
    let registry = Registry::standard(&Diagnostics::new());
    assert_eq!(registry.names(), vec!["WuKong", "TangSeng", "ZhuBaJie", "ShaHeShang"]);
    assert_eq!(ACTOR_NAMES, ["WuKong", "TangSeng", "ZhuBaJie", "ShaHeShang"]);
}

/// WHY: Two registries built independently must be identical
/// REASON: Every process start reproduces the same run
/// BREAKS: Run-to-run comparison of profiles
#[test]
fn registry_is_identical_across_starts() {
    let first = Registry::standard(&Diagnostics::new());
    let second = Registry::standard(&Diagnostics::new());
    assert_eq!(first.names(), second.names());
    assert_eq!(first.len(), 4);
}

/// WHY: Exactly one actor per pathology
/// REASON: Each name appears once so log lines attribute to one actor
#[test]
fn registry_has_one_actor_per_variant() {
    let registry = Registry::standard(&Diagnostics::new());
    let mut names = registry.names();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 4);
}

/// WHY: Actor names are constants, not derived from instances
#[test]
fn actor_names_are_constant() {
    let diag = Diagnostics::new();
    assert_eq!(WuKong::new().name(), WuKong::NAME);
    assert_eq!(TangSeng::new(&diag).name(), TangSeng::NAME);
    assert_eq!(ZhuBaJie::new(&diag).name(), ZhuBaJie::NAME);
    assert_eq!(ShaHeShang::new().name(), ShaHeShang::NAME);
}

/// WHY: Production strength is fixed
/// REASON: No severity tuning; the registry always uses these values
/// BREAKS: CPU and memory alerts calibrated against them
#[test]
fn production_strength_is_fixed() {
    let diag = Diagnostics::new();
    assert_eq!(ZhuBaJie::new(&diag).iterations(), 10_000_000_000);
    assert_eq!(ShaHeShang::new().ceiling(), GI);
    assert_eq!(pathos_core::actor::WuKong::NAME, "WuKong");
}

/// WHY: Runtime tuning constants
/// REASON: One CPU, every contention and blocking event sampled
/// BREAKS: Visibility of contention in the mutex and block profiles
#[test]
fn runtime_tuning_constants() {
    assert_eq!(MAX_PROCS, 1);
    assert_eq!(MUTEX_PROFILE_FRACTION, 1);
    assert_eq!(BLOCK_PROFILE_RATE, 1);
    assert_eq!(CYCLE_INTERVAL, Duration::from_secs(1));
    assert_eq!(DIAGNOSTIC_ADDR, "0.0.0.0:6060");
}
