// Lock Contract Tests
//
// TangSeng's `shit` reacquires its lock and never releases it. That missing
// release is the pathology. These tests fail if someone "fixes" it.

use pathos_core::actor::Actor;
use pathos_core::{Diagnostics, ProfiledLock, TangSeng};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// WHY: The lock must stay held after the phase returns
/// REASON: A lock held forever is what the block profile has to show
/// BREAKS: The held-lock signal in /debug/pprof/block and /debug/pprof/mutex
#[test]
fn lock_is_never_released_after_shit() {
    let diag = Diagnostics::new();
    let mut actor = TangSeng::new(&diag);

    actor.shit();
    let lock = actor.last_lock().expect("shit must leave its lock behind");

    assert!(!lock.try_lock());

    // still held well after the helper worker is gone
    thread::sleep(Duration::from_millis(200));
    assert!(!lock.try_lock());
    assert!(lock.is_locked());
}

/// WHY: Every cycle leaks one more held lock
/// REASON: A fresh lock per phase; none of them is ever released
#[test]
fn held_locks_accumulate_per_shit() {
    let diag = Diagnostics::new();
    let mut actor = TangSeng::new(&diag);

    actor.shit();
    actor.shit();

    assert_eq!(diag.held_locks(TangSeng::LOCK_SITE), 2);
}

/// WHY: The lock is released by a different thread than the one that took it
/// REASON: Thread-owned guards cannot express this handoff
#[test]
fn lock_can_be_released_by_another_thread() {
    let diag = Diagnostics::new();
    let lock = Arc::new(ProfiledLock::new(&diag, "contract.handoff"));
    lock.lock();

    let other = lock.clone();
    thread::spawn(move || other.unlock()).join().unwrap();

    assert!(lock.try_lock());
}

/// WHY: The second acquisition waits for the helper worker
/// REASON: The wait is what the mutex profile records
#[test]
fn reacquisition_is_recorded_as_contention() {
    let diag = Diagnostics::new();
    diag.set_mutex_profile_fraction(1);
    diag.set_block_profile_rate(1);
    let mut actor = TangSeng::new(&diag);

    actor.shit();

    let mutex = diag.mutex_profile();
    let event = mutex
        .events
        .iter()
        .find(|e| e.site == TangSeng::LOCK_SITE)
        .expect("contention on TangSeng's lock");
    assert_eq!(event.count, 1);
    assert!(event.total_delay_ns >= 900_000_000);
}
