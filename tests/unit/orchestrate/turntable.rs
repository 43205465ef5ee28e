use super::*;
use crate::foundation::clock::ManualClock;
use crate::foundation::core::Rgba8;
use crate::foundation::error::FailureKind;
use crate::history::log::HistoryLog;
use crate::remote::generator::{Reply, ScriptedGenerator};

fn base() -> RasterImage {
    RasterImage::solid(6, 6, Rgba8::new(10, 20, 30, 255)).unwrap()
}

fn shade(n: u8) -> Reply {
    Reply::Fill(Rgba8::new(n, n, n, 255))
}

fn finished_session() -> TurntableSession {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::default();
    generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap();
    s
}

#[test]
fn angles_are_in_fixed_order() {
    let ids: Vec<&str> = TURNTABLE_ANGLES.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "front",
            "front_right",
            "right",
            "back_right",
            "back",
            "back_left",
            "left",
            "front_left"
        ]
    );
}

#[test]
fn new_session_holds_only_the_base() {
    let s = TurntableSession::new(base(), &StudioConfig::default());
    assert_eq!(s.frames().len(), FRAME_COUNT);
    assert_eq!(s.ready_count(), 1);
    assert_eq!(s.frames()[0].angle.id, AngleId::Front);
    assert_eq!(s.frames()[0].image.as_ref(), Some(&base()));
    assert_eq!(s.state(), &TurntableState::Idle);
    assert!(!s.is_playing());
}

#[test]
fn full_run_generates_seven_frames_and_starts_playback() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::new(shade(1));

    generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap();

    assert_eq!(s.state(), &TurntableState::Done);
    assert_eq!(s.ready_count(), FRAME_COUNT);
    assert_eq!(s.cursor(), 0);
    assert!(s.is_playing());

    let calls = g.calls();
    assert_eq!(calls.len(), FRAME_COUNT - 1);
    for (call, angle) in calls.iter().zip(TURNTABLE_ANGLES.iter().skip(1)) {
        assert_eq!(call.image, base());
        assert!(call.mask.is_none());
        assert!(call.instruction.contains(angle.direction_prompt));
    }
}

#[test]
fn failure_keeps_frames_generated_so_far() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::new(shade(9))
        .then_n(3, shade(5))
        .then(Reply::Fail("RESOURCE_EXHAUSTED: quota".into()));

    let err = {
        let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
        generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap_err()
    };

    assert_eq!(err.kind(), FailureKind::RateLimited);
    assert_eq!(s.state(), &TurntableState::Failed(err));
    assert_eq!(s.ready_count(), 4);
    for i in 0..4 {
        assert!(s.frames()[i].image.is_some(), "frame {i}");
    }
    for i in 4..FRAME_COUNT {
        assert!(s.frames()[i].image.is_none(), "frame {i}");
    }
    assert!(!s.is_playing());
    assert_eq!(g.calls().len(), 4);
    assert_eq!(history.len(), 3);
}

#[test]
fn progress_reports_every_completed_angle() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::default();

    let mut seen = Vec::new();
    generate_turntable(&mut ctx, &mut g, &mut s, &mut |sess| {
        seen.push((sess.state().clone(), sess.ready_count()))
    })
    .unwrap();

    let mut expected: Vec<_> = (1..=FRAME_COUNT)
        .map(|n| {
            (
                TurntableState::Running {
                    current: n,
                    total: FRAME_COUNT,
                },
                n,
            )
        })
        .collect();
    expected.push((TurntableState::Done, FRAME_COUNT));
    assert_eq!(seen, expected);
}

#[test]
fn each_angle_is_recorded_in_history() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(500);
    let mut history = HistoryLog::default();
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::default();
    {
        let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
        generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap();
    }

    assert_eq!(history.len(), FRAME_COUNT - 1);
    let mut details: Vec<&str> = history
        .records()
        .iter()
        .filter_map(|r| r.details.as_deref())
        .collect();
    details.sort_unstable();
    let mut expected: Vec<&str> = TURNTABLE_ANGLES[1..].iter().map(|a| a.id.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(details, expected);
    assert!(
        history
            .records()
            .iter()
            .all(|r| r.input_keys == vec![base().fingerprint()])
    );
}

#[test]
fn regenerating_clears_previous_frames_first() {
    let mut s = finished_session();
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::new(Reply::Fail("boom".into()));

    let err = generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Generic);
    assert_eq!(s.ready_count(), 1);
}

#[test]
fn drag_wraps_negative_offsets() {
    assert_eq!(drag_index(0, -260.0, 50.0), 3);
    assert_eq!(drag_index(0, 0.0, 50.0), 0);
    assert_eq!(drag_index(7, 50.0, 50.0), 0);
    assert_eq!(drag_index(2, 24.9, 50.0), 2);
    assert_eq!(drag_index(2, 25.0, 50.0), 3);
    assert_eq!(drag_index(2, -25.0, 50.0), 2);
    assert_eq!(drag_index(1, 400.0 * 3.0, 50.0), 1);
    assert_eq!(drag_index(5, 10.0, 0.0), 5);
    // Step counts that saturate i64 still wrap instead of overflowing.
    assert_eq!(drag_index(1, 1000.0, 1e-20), 0);
    assert_eq!(drag_index(1, -1000.0, 1e-20), 1);
    assert_eq!(drag_index(FRAME_COUNT * 3 + 2, 0.0, 50.0), 2);
}

#[test]
fn tiny_sensitivity_drag_stays_in_range() {
    let cfg = StudioConfig {
        drag_sensitivity_px: 1e-20,
        ..StudioConfig::default()
    };
    cfg.validate().unwrap();
    let mut s = TurntableSession::new(base(), &cfg);
    s.select(2).unwrap();
    s.begin_drag(0.0);
    assert_eq!(s.drag_to(5.0), 1);
}

#[test]
fn drag_gesture_pauses_and_scrubs() {
    let mut s = finished_session();
    assert!(s.is_playing());

    s.begin_drag(300.0);
    assert!(!s.is_playing());
    assert!(s.is_dragging());
    assert_eq!(s.drag_to(40.0), 3);
    assert_eq!(s.drag_to(400.0), 2);
    s.end_drag();
    assert!(!s.is_dragging());
    assert_eq!(s.drag_to(0.0), 2);
    assert_eq!(s.cursor(), 2);
}

#[test]
fn tick_advances_every_interval_and_wraps() {
    let mut s = finished_session();
    assert_eq!(s.tick(Duration::from_millis(100)), 0);
    assert_eq!(s.tick(Duration::from_millis(150)), 1);
    assert_eq!(s.cursor(), 1);
    assert_eq!(s.tick(Duration::from_millis(250 * 7)), 7);
    assert_eq!(s.cursor(), 0);

    s.pause();
    assert_eq!(s.tick(Duration::from_secs(5)), 0);
    assert_eq!(s.cursor(), 0);
}

#[test]
fn tick_saturates_on_huge_elapsed_time() {
    let mut s = finished_session();
    assert_eq!(s.tick(Duration::from_millis(100)), 0);
    assert!(s.tick(Duration::MAX) > 0);
    assert!(s.cursor() < FRAME_COUNT);
    assert_eq!(s.tick(Duration::from_millis(250)), 1);
    assert!(s.cursor() < FRAME_COUNT);
}

#[test]
fn reduce_motion_leaves_finished_turntable_paused() {
    let cfg = StudioConfig {
        reduce_motion: true,
        ..StudioConfig::default()
    };
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut s = TurntableSession::new(base(), &cfg);
    let mut g = ScriptedGenerator::default();

    generate_turntable(&mut ctx, &mut g, &mut s, &mut |_| {}).unwrap();

    assert_eq!(s.state(), &TurntableState::Done);
    assert_eq!(s.cursor(), 0);
    assert!(!s.is_playing());
    assert_eq!(s.tick(Duration::from_secs(1)), 0);
}

#[test]
fn select_jumps_and_stops_playback() {
    let mut s = finished_session();
    s.select(6).unwrap();
    assert_eq!(s.cursor(), 6);
    assert!(!s.is_playing());
    assert_eq!(s.current_image(), s.frames()[6].image.as_ref());
    assert!(s.select(FRAME_COUNT).is_err());
    assert_eq!(s.cursor(), 6);
}

#[test]
fn editing_front_rebases_the_session() {
    let mut s = finished_session();
    let edited = RasterImage::solid(6, 6, Rgba8::WHITE).unwrap();
    assert_eq!(s.apply_edit(edited.clone()), EditOutcome::Rebased);
    assert_eq!(s.base(), &edited);
    assert_eq!(s.ready_count(), 1);
    assert_eq!(s.state(), &TurntableState::Idle);
    assert!(!s.is_playing());
}

#[test]
fn editing_other_frame_replaces_only_that_frame() {
    let mut s = finished_session();
    s.select(3).unwrap();
    let before = s.frames()[2].image.clone();
    let edited = RasterImage::solid(6, 6, Rgba8::BLACK).unwrap();

    assert_eq!(s.apply_edit(edited.clone()), EditOutcome::FrameReplaced(3));
    assert_eq!(s.frames()[3].image.as_ref(), Some(&edited));
    assert_eq!(s.frames()[2].image, before);
    assert_eq!(s.base(), &base());
    assert_eq!(s.ready_count(), FRAME_COUNT);
}
