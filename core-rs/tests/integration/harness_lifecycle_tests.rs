// Harness lifecycle tests
//
// Observable behavior of the actors and the scheduler: what blocks, what
// leaks, what plateaus, and what the log stream looks like for one cycle.

use pathos_core::actor::tang_seng::{LOCK_RELEASE_DELAY, SLEEPER_COUNT, SLEEPER_LIFETIME};
use pathos_core::actor::{Actor, Phase};
use pathos_core::registry::ACTOR_NAMES;
use pathos_core::{Diagnostics, Registry, Scheduler, ShaHeShang, TangSeng, WuKong, ZhuBaJie, MI};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn small_registry(diag: &Diagnostics) -> Registry {
    Registry::from_actors(
        WuKong::new(),
        TangSeng::new(diag),
        ZhuBaJie::with_iterations(diag, 10_000),
        ShaHeShang::with_ceiling(4 * MI),
    )
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// (actor, phase) of every phase-start line, in emission order
fn phase_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let actor = line.split("actor=\"").nth(1)?.split('"').next()?;
            let phase = line.split("phase=").nth(1)?.split_whitespace().next()?;
            Some((actor.to_string(), phase.to_string()))
        })
        .collect()
}

#[test]
fn every_actor_lifecycle_returns() {
    let diag = Diagnostics::new();
    let mut actors: Vec<Box<dyn Actor>> = vec![
        Box::new(WuKong::new()),
        Box::new(TangSeng::new(&diag)),
        Box::new(ZhuBaJie::with_iterations(&diag, 1_000)),
        Box::new(ShaHeShang::with_ceiling(2 * MI)),
    ];

    for actor in actors.iter_mut() {
        actor.live();
    }
}

#[test]
fn tang_seng_shit_blocks_for_release_delay() {
    let diag = Diagnostics::new();
    let mut actor = TangSeng::new(&diag);

    let start = Instant::now();
    actor.run_phase(Phase::Shit);
    let elapsed = start.elapsed();

    assert!(elapsed >= LOCK_RELEASE_DELAY);
    assert!(elapsed < Duration::from_secs(10));
}

#[test]
fn zhu_ba_jie_drink_time_is_proportional_to_iterations() {
    let diag = Diagnostics::new();
    let mut quick = ZhuBaJie::with_iterations(&diag, 0);
    let mut base = ZhuBaJie::with_iterations(&diag, 75_000_000);
    let mut quadruple = ZhuBaJie::with_iterations(&diag, 300_000_000);

    let timed = |actor: &mut ZhuBaJie| {
        let start = Instant::now();
        actor.drink();
        start.elapsed()
    };
    let quick_elapsed = timed(&mut quick);
    let base_elapsed = timed(&mut base);
    let quadruple_elapsed = timed(&mut quadruple);

    assert!(base_elapsed > quick_elapsed);
    assert!(
        quadruple_elapsed > base_elapsed * 2,
        "4x iterations took {:?}, 1x took {:?}",
        quadruple_elapsed,
        base_elapsed
    );
}

#[test]
fn sleeper_population_grows_ten_per_cycle() {
    let diag = Diagnostics::new();
    let mut actor = TangSeng::new(&diag);

    let start = Instant::now();
    for cycle in 1..=3 {
        actor.live();
        assert_eq!(diag.live_workers(TangSeng::SLEEPER_SITE), SLEEPER_COUNT * cycle);
    }
    assert!(start.elapsed() < SLEEPER_LIFETIME);

    let profile = diag.goroutine_profile();
    let sleepers = profile
        .sites
        .iter()
        .find(|s| s.site == TangSeng::SLEEPER_SITE)
        .unwrap();
    assert_eq!(sleepers.live, 30);
    assert!(sleepers.oldest_age_ms < SLEEPER_LIFETIME.as_millis() as u64);
}

#[test]
fn retained_buffer_plateaus_at_ceiling() {
    let mut actor = ShaHeShang::with_ceiling(16 * MI);

    actor.live();
    let after_first = actor.buffer_bytes();

    for _ in 0..4 {
        actor.live();
    }
    let after_fifth = actor.buffer_bytes();

    assert_eq!(after_first, 16 * MI);
    assert_eq!(after_first, after_fifth);
}

#[test]
fn lock_cannot_be_taken_after_shit() {
    let diag = Diagnostics::new();
    let mut actor = TangSeng::new(&diag);
    actor.shit();

    let lock = actor.last_lock().unwrap();
    assert!(!lock.try_lock());
}

#[test]
fn single_cycle_logs_in_registry_and_phase_order() {
    let diag = Diagnostics::new();
    let mut scheduler =
        Scheduler::with_interval(small_registry(&diag), Duration::from_millis(10));

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || scheduler.run_cycle());

    let lines = phase_lines(&capture.text());
    assert_eq!(lines.len(), 16, "expected 4 phase lines per actor, got {:?}", lines);

    let expected: Vec<(String, String)> = ACTOR_NAMES
        .iter()
        .flat_map(|name| Phase::ALL.iter().map(move |phase| (name.to_string(), phase.to_string())))
        .collect();
    assert_eq!(lines, expected);

    for phase in Phase::ALL {
        let count = lines.iter().filter(|(_, p)| p == phase.as_str()).count();
        assert_eq!(count, 4, "phase {}", phase);
    }
}

#[test]
fn effect_lines_accompany_lock_wait_and_spin() {
    let diag = Diagnostics::new();
    let mut registry = small_registry(&diag);

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || registry.live_all());

    let text = capture.text();
    assert!(text.contains("TangSeng waiting on its own lock"));
    assert!(text.contains("ZhuBaJie spinning"));
}

#[test]
fn cycle_completes_when_no_worker_can_be_spawned() {
    let diag = Diagnostics::new();
    diag.set_worker_limit(Some(0));
    let mut scheduler =
        Scheduler::with_interval(small_registry(&diag), Duration::from_millis(10));

    let start = Instant::now();
    scheduler.run_cycles(2);

    assert_eq!(scheduler.cycles(), 2);
    assert!(start.elapsed() < Duration::from_secs(15));
    assert_eq!(diag.total_live_workers(), 0);
    assert_eq!(diag.held_locks(TangSeng::LOCK_SITE), 2);
}
