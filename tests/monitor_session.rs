use mixmeter::{
    engine::{PropertyEngine, Sequence, Target, Track},
    render::{ColorZone, RenderPlan},
    MeterSettings, MonitorSession,
};
use std::{sync::Arc, thread};

fn editor_sequence() -> Sequence {
    Sequence::new(
        "edit",
        vec![Track::new("V1", true), Track::new("A1", true)],
    )
}

#[test]
fn master_and_two_tracks() {
    let engine = Arc::new(PropertyEngine::new());
    let mut session = MonitorSession::new(engine.clone(), MeterSettings::default());
    session.open(&editor_sequence());

    let names: Vec<_> = session.strips().iter().map(|s| s.name().to_owned()).collect();
    assert_eq!(names, vec!["Master", "V1", "A1"]);

    engine.set_levels(Target::Master, 0.5, 0.5);
    engine.set_levels(Target::Track(0), 0.9, 0.0);
    engine.set_levels(Target::Track(1), 0.0, 0.0);
    session.tick();

    let master = session.strip(0);
    assert_eq!((master.left.current(), master.right.current()), (0.5, 0.5));
    let v1 = session.strip(1);
    assert_eq!((v1.left.current(), v1.right.current()), (0.9, 0.0));
    let a1 = session.strip(2);
    assert_eq!((a1.left.current(), a1.right.current()), (0.0, 0.0));
    assert_eq!(a1.left.peak(), 0.0);
}

#[test]
fn reopen_reattaches_same_meters() {
    let engine = Arc::new(PropertyEngine::new());
    let mut session = MonitorSession::new(engine.clone(), MeterSettings::default());
    let seq = editor_sequence();

    session.open(&seq);
    session.open(&seq);
    let attached = engine.attached();
    assert_eq!(attached, 3);

    assert_eq!(session.close(), attached);
    assert_eq!(engine.attached(), 0);

    session.open(&seq);
    assert_eq!(engine.attached(), attached);
}

#[test]
fn peak_hold_survives_quiet_ticks() {
    let engine = Arc::new(PropertyEngine::new());
    let mut session = MonitorSession::new(engine.clone(), MeterSettings::default());
    session.open(&editor_sequence());

    let levels = [0.2, 0.8, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];
    let mut peaks = vec![];
    for &level in levels.iter() {
        engine.set_levels(Target::Track(0), level, 0.0);
        session.tick();
        peaks.push(session.strip(1).left.peak());
    }
    assert_eq!(peaks, vec![0.2, 0.8, 0.8, 0.8, 0.8, 0.8, 0.0, 0.1]);
}

#[test]
fn renderer_reads_published_snapshots() {
    let engine = Arc::new(PropertyEngine::new());
    let mut session = MonitorSession::new(engine.clone(), MeterSettings::default());
    let snapshots = session.snapshots();
    session.open(&editor_sequence());

    engine.set_levels(Target::Master, 1.0, 0.8);
    session.tick();

    let plan = thread::spawn(move || RenderPlan::new(&snapshots.latest()))
        .join()
        .unwrap();
    assert_eq!(plan.tick, 1);
    assert_eq!(plan.strips.len(), 3);
    assert_eq!(plan.strips[0].left.zone, ColorZone::Red);
    assert_eq!(plan.strips[0].right.zone, ColorZone::Yellow);
    assert_eq!(plan.strips[1].left.zone, ColorZone::Off);
}
