use super::*;
use crate::config::StudioConfig;
use crate::foundation::clock::ManualClock;
use crate::foundation::core::{Dims, Rgba8};
use crate::foundation::error::FailureKind;
use crate::history::log::HistoryLog;
use crate::remote::generator::{Reply, ScriptedGenerator};

const GREEN: Rgba8 = Rgba8::new(0, 200, 0, 255);

fn source(w: u32, h: u32) -> RasterImage {
    RasterImage::solid(w, h, Rgba8::new(200, 10, 10, 255)).unwrap()
}

#[test]
fn single_direction_is_one_phase() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::new(Reply::Fill(GREEN));
    let mut o = OutpaintOrchestrator::new();

    let src = source(400, 400);
    let out = o
        .outpaint(&mut ctx, &mut g, &src, "", Direction::Right)
        .unwrap();

    assert_eq!(out.dims(), Dims::new(600, 400));
    assert_eq!(out.pixel(399, 0), src.pixel(0, 0));
    assert_eq!(out.pixel(400, 0), Some(GREEN));
    assert_eq!(
        o.transitions(),
        &[OutpaintState::Phase1Running, OutpaintState::Done]
    );
    assert_eq!(g.calls().len(), 1);
    assert_eq!(g.calls()[0].mask.as_ref().unwrap().white_area(), 200 * 400);
}

#[test]
fn panoramic_feeds_phase_one_output_into_phase_two() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::new(Reply::Fill(GREEN));
    let mut o = OutpaintOrchestrator::new();

    let src = source(100, 40);
    let out = o
        .outpaint(&mut ctx, &mut g, &src, "forest", Direction::Panoramic)
        .unwrap();

    assert_eq!(out.dims(), Dims::new(250, 40));
    assert_eq!(
        o.transitions(),
        &[
            OutpaintState::Phase1Running,
            OutpaintState::Phase1Done,
            OutpaintState::Phase2Running,
            OutpaintState::Done,
        ]
    );

    let calls = g.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].image.dims(), Dims::new(175, 40));
    assert!(calls[0].instruction.contains("right edge"));
    assert!(calls[0].instruction.contains("forest"));
    // Phase two canvas contains the phase one result shifted right by the new band.
    assert_eq!(calls[1].image.dims(), Dims::new(250, 40));
    assert_eq!(calls[1].image.pixel(75 + 174, 0), Some(GREEN));
    assert_eq!(calls[1].image.pixel(75, 0), src.pixel(0, 0));
    assert!(calls[1].instruction.contains("left edge"));
    let m = calls[1].mask.as_ref().unwrap();
    assert_eq!(m.white_area(), 75 * 40);
    assert!(m.is_white(74, 0));
    assert!(!m.is_white(75, 0));
}

#[test]
fn panoramic_phase_two_failure_discards_everything() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut g = ScriptedGenerator::new(Reply::Fill(GREEN))
        .then(Reply::Fill(GREEN))
        .then(Reply::Fail("429 Too Many Requests".into()));
    let mut o = OutpaintOrchestrator::new();

    let err = {
        let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
        o.outpaint(&mut ctx, &mut g, &source(20, 20), "", Direction::Panoramic)
            .unwrap_err()
    };

    assert_eq!(err.kind(), FailureKind::RateLimited);
    assert_eq!(o.state(), &OutpaintState::Failed(err.clone()));
    assert!(!o.transitions().contains(&OutpaintState::Done));
    assert!(history.is_empty());
}

#[test]
fn success_records_only_terminal_result() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(77);
    let mut history = HistoryLog::default();
    let mut g = ScriptedGenerator::new(Reply::Fill(GREEN));
    let mut o = OutpaintOrchestrator::new();
    let src = source(8, 8);

    let out = {
        let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
        o.outpaint(&mut ctx, &mut g, &src, "beach", Direction::Panoramic)
            .unwrap()
    };

    assert_eq!(history.len(), 1);
    let r = &history.records()[0];
    assert_eq!(r.image_key, out.fingerprint());
    assert_eq!(r.prompt, "beach");
    assert_eq!(r.details.as_deref(), Some("panoramic"));
    assert_eq!(r.input_keys, vec![src.fingerprint()]);
    assert_eq!(r.timestamp_ms, 77);
}

#[test]
fn model_config_failure_is_distinguished() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::new(Reply::Fail(
        "404 models/imagen-edit is not found for API version v1beta".into(),
    ));
    let err = OutpaintOrchestrator::new()
        .outpaint(&mut ctx, &mut g, &source(4, 4), "", Direction::Up)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Config);
}

#[test]
fn wrong_sized_result_is_a_generic_failure() {
    let cfg = StudioConfig::default();
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::new(Reply::Image(source(4, 4)));
    let err = OutpaintOrchestrator::new()
        .outpaint(&mut ctx, &mut g, &source(4, 4), "", Direction::Down)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Generic);
}

#[test]
fn configured_ratio_is_used() {
    let cfg = StudioConfig {
        single_ratio: 0.25,
        ..StudioConfig::default()
    };
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
    let mut g = ScriptedGenerator::default();
    let out = OutpaintOrchestrator::new()
        .outpaint(&mut ctx, &mut g, &source(40, 40), "", Direction::Left)
        .unwrap();
    assert_eq!(out.dims(), Dims::new(50, 40));
}

#[test]
fn rejected_expansion_fails_locally_as_user_input() {
    let cfg = StudioConfig {
        single_ratio: -1.0,
        ..StudioConfig::default()
    };
    let clock = ManualClock::new(1);
    let mut history = HistoryLog::default();
    let mut g = ScriptedGenerator::default();
    let mut o = OutpaintOrchestrator::new();

    let err = {
        let mut ctx = StudioContext::new(&cfg, &clock, &mut history);
        o.outpaint(&mut ctx, &mut g, &source(8, 8), "", Direction::Right)
            .unwrap_err()
    };

    assert_eq!(err.kind(), FailureKind::UserInput);
    assert!(g.calls().is_empty());
    assert_eq!(o.transitions(), &[OutpaintState::Failed(err)]);
    assert!(history.is_empty());
}
