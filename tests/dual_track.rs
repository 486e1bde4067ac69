//! Dual-track orchestration timing behaviour.

mod common;

use std::time::{Duration, Instant};

use common::*;
use pagefuse::fusion::FusionEngine;
use pagefuse::models::{EngineTag, ExtractionMethod, FailureReason};

#[tokio::test]
async fn vision_timeout_returns_both_results_within_ceiling() {
    let orchestrator = orchestrator(
        ScriptedEngine::new(EngineTag::Ocr).on(1, slow_reply("receipt total 12.50", 0.9, 20)),
        ScriptedEngine::new(EngineTag::Vision).on(1, Step::Hang),
        100,
        250,
    );

    let start = Instant::now();
    let (ocr, vision) = orchestrator.run_dual(&image(1, 0.0, 0.0)).await;
    let elapsed = start.elapsed();

    assert!(ocr.success);
    assert_eq!(ocr.text, "receipt total 12.50");
    assert!(!vision.success);
    assert_eq!(vision.failure, Some(FailureReason::Timeout { timeout_ms: 250 }));
    assert!(elapsed >= Duration::from_millis(240));
    assert!(elapsed < Duration::from_millis(1_000));

    let span = FusionEngine::default().fuse(ocr, vision);
    assert_eq!(span.method, ExtractionMethod::OcrProcessed);
    assert_eq!(span.text, "receipt total 12.50");
}

#[tokio::test]
async fn waits_for_slower_track_instead_of_first_result() {
    let orchestrator = orchestrator(
        ScriptedEngine::new(EngineTag::Ocr).on(1, reply("fast", 0.9)),
        ScriptedEngine::new(EngineTag::Vision).on(1, slow_reply("slow but complete", 0.9, 200)),
        1_000,
        1_000,
    );

    let (ocr, vision) = orchestrator.run_dual(&image(1, 0.0, 0.0)).await;
    assert!(ocr.success);
    assert!(vision.success);
    assert_eq!(vision.text, "slow but complete");
    assert!(vision.elapsed_ms >= 190);
}

#[tokio::test]
async fn sibling_failure_does_not_cancel_other_track() {
    let orchestrator = orchestrator(
        ScriptedEngine::new(EngineTag::Ocr).on(1, Step::Fail("segfault")),
        ScriptedEngine::new(EngineTag::Vision).on(1, slow_reply("still here", 0.5, 100)),
        1_000,
        1_000,
    );

    let (ocr, vision) = orchestrator.run_dual(&image(1, 0.0, 0.0)).await;
    assert!(matches!(ocr.failure, Some(FailureReason::EngineError { .. })));
    assert_eq!(vision.text, "still here");
}

#[tokio::test]
async fn both_tracks_failing_yields_error_span() {
    let orchestrator = orchestrator(
        ScriptedEngine::new(EngineTag::Ocr).on(1, Step::Fail("ocr")),
        ScriptedEngine::new(EngineTag::Vision).on(1, reply("   ", 0.9)),
        1_000,
        1_000,
    );

    let (ocr, vision) = orchestrator.run_dual(&image(1, 0.0, 0.0)).await;
    assert_eq!(vision.failure, Some(FailureReason::EmptyResult));

    let span = FusionEngine::default().fuse(ocr, vision);
    assert_eq!(span.method, ExtractionMethod::Error);
    assert!(span.text.is_empty());
}
