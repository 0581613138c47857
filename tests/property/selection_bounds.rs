//! Property-based tests for candidate selection bounds

use georef::config::TransformConfig;
use georef::context::Context;
use georef::engine::mock::{ApplyOutcome, MockEngine, MockObject};
use georef::error::GeorefError;
use georef::factory::ObjectKind;
use georef::selector::ChooseOperation;
use georef::types::{Coordinate, Direction};

fn chooser_over(engine: &MockEngine, candidates: Vec<MockObject>) -> (Context, ChooseOperation) {
    let ids: Vec<u64> = candidates
        .into_iter()
        .map(|candidate| engine.insert(candidate))
        .collect();
    let manager = engine.insert(MockObject::of_kind(ObjectKind::Unknown));
    engine.script_ranking(manager, ids);
    let source = engine.insert(MockObject::of_kind(ObjectKind::Geographic2DCrs));
    let target = engine.insert(MockObject::of_kind(ObjectKind::ProjectedCrs));

    let ctx = Context::new(engine.clone());
    let source = ctx.materialize(georef::types::RawHandle::new(source)).unwrap();
    let target = ctx.materialize(georef::types::RawHandle::new(target)).unwrap();
    let chooser = ctx
        .choose_transform(&source, &target, &TransformConfig::default())
        .unwrap();
    (ctx, chooser)
}

fn failing() -> MockObject {
    MockObject::of_kind(ObjectKind::Transformation)
        .with_grid_dependencies(1)
        .applying(ApplyOutcome::NonFinite)
}

/// With one grid-free candidate anywhere in the list and everything else
/// failing, a transform always succeeds, and never applies more than
/// `max_retries + 2` candidates (the bounded retries plus the fallback).
#[test]
fn test_grid_free_candidate_guarantees_progress_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..6, 0usize..6), |(failing_count, position)| {
            let position = position.min(failing_count);
            let mut candidates: Vec<MockObject> = (0..failing_count).map(|_| failing()).collect();
            candidates.insert(
                position,
                MockObject::of_kind(ObjectKind::Transformation)
                    .applying(ApplyOutcome::Shift { dx: 1.0, dy: 0.0 }),
            );

            let engine = MockEngine::new();
            let (_ctx, chooser) = chooser_over(&engine, candidates);
            let out = chooser
                .transform(Coordinate::new(4.9, 52.3), Direction::Forward)
                .unwrap();
            assert!(out.is_finite());
            assert!(engine.applied().len() <= TransformConfig::default().max_retries + 2);
            Ok(())
        })
        .unwrap();
}

/// With only failing grid-backed candidates, the exclusion budget bounds
/// the retries: the reported exclusion count never exceeds `max_retries`
/// and at most `max_retries + 1` applications happen before the failure.
#[test]
fn test_exclusion_budget_is_bounded_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..8), |candidate_count| {
            let engine = MockEngine::new();
            let (_ctx, chooser) =
                chooser_over(&engine, (0..candidate_count).map(|_| failing()).collect());

            let err = chooser
                .transform(Coordinate::new(4.9, 52.3), Direction::Forward)
                .unwrap_err();
            let max_retries = TransformConfig::default().max_retries;
            let GeorefError::NoUsableOperation { excluded, .. } = err else {
                panic!("expected NoUsableOperation");
            };
            assert!(excluded <= max_retries);
            assert!(engine.applied().len() <= max_retries + 1);
            Ok(())
        })
        .unwrap();
}
