//! End-to-end candidate selection through the public API.

use georef::config::TransformConfig;
use georef::context::Context;
use georef::engine::mock::{ApplyOutcome, MockEngine, MockObject};
use georef::error::GeorefError;
use georef::factory::ObjectKind;
use georef::selector::ChooseOperation;
use georef::types::{Coordinate, Direction};

fn chooser_between(
    engine: &MockEngine,
    candidates: Vec<MockObject>,
) -> (Context, ChooseOperation, Vec<u64>) {
    let ids: Vec<u64> = candidates
        .into_iter()
        .map(|candidate| engine.insert(candidate))
        .collect();
    let manager = engine.insert(MockObject::of_kind(ObjectKind::Unknown));
    engine.script_ranking(manager, ids.clone());

    let source = engine.insert(MockObject::of_kind(ObjectKind::Geographic2DCrs).named("WGS 84"));
    let target =
        engine.insert(MockObject::of_kind(ObjectKind::ProjectedCrs).named("Amersfoort / RD New"));
    engine.register_definition("EPSG:4326", source);
    engine.register_definition("EPSG:28992", target);

    let ctx = Context::new(engine.clone());
    let source = ctx.create("EPSG:4326").unwrap();
    let target = ctx.create("EPSG:28992").unwrap();
    assert!(source.is_crs() && target.is_crs());
    let chooser = ctx
        .choose_transform(&source, &target, &TransformConfig::default())
        .unwrap();
    (ctx, chooser, ids)
}

fn grid_backed_failure() -> MockObject {
    MockObject::of_kind(ObjectKind::Transformation)
        .with_grid_dependencies(1)
        .applying(ApplyOutcome::NonFinite)
}

#[test]
fn test_retry_recovers_from_coverage_gap() {
    let engine = MockEngine::new();
    let (_ctx, chooser, ids) = chooser_between(
        &engine,
        vec![
            grid_backed_failure(),
            MockObject::of_kind(ObjectKind::Transformation)
                .with_grid_dependencies(1)
                .applying(ApplyOutcome::Shift { dx: 2.0, dy: 0.0 }),
        ],
    );
    engine.script_suggestions(vec![Some(0), Some(1)]);

    let out = chooser
        .transform(Coordinate::new(4.9, 52.3), Direction::Forward)
        .unwrap();
    assert!((out.x - 6.9).abs() < 1e-12);
    assert_eq!(engine.applied(), vec![ids[0], ids[1]]);
}

#[test]
fn test_exhausted_candidates_fail_with_context() {
    let engine = MockEngine::new();
    let (_ctx, chooser, _) =
        chooser_between(&engine, vec![grid_backed_failure(), grid_backed_failure()]);

    let err = chooser
        .transform(Coordinate::new(4.9, 52.3), Direction::Forward)
        .unwrap_err();
    let GeorefError::NoUsableOperation { excluded, .. } = err else {
        panic!("expected NoUsableOperation, got {err}");
    };
    assert!(excluded <= 2);
}

#[test]
fn test_remote_failure_is_not_a_coverage_gap() {
    let engine = MockEngine::new();
    let (_ctx, chooser, ids) = chooser_between(
        &engine,
        vec![
            MockObject::of_kind(ObjectKind::Transformation)
                .with_grid_dependencies(1)
                .applying(ApplyOutcome::NetworkError("grid cdn timed out".into())),
            MockObject::of_kind(ObjectKind::Transformation)
                .applying(ApplyOutcome::Shift { dx: 1.0, dy: 0.0 }),
        ],
    );

    let err = chooser
        .transform(Coordinate::new(4.9, 52.3), Direction::Forward)
        .unwrap_err();
    assert!(matches!(err, GeorefError::RemoteResource(_)));
    assert_eq!(engine.applied(), vec![ids[0]]);
}

#[test]
fn test_bulk_batch_shares_one_selection() {
    let engine = MockEngine::new();
    let (_ctx, chooser, _) = chooser_between(
        &engine,
        vec![MockObject::of_kind(ObjectKind::Transformation)
            .applying(ApplyOutcome::Shift { dx: 1.0, dy: -1.0 })],
    );

    let mut batch = [
        Coordinate::new(4.9, 52.3),
        Coordinate::new(5.1, 52.0),
        Coordinate::new(6.0, 51.5),
    ];
    chooser.transform_bulk(&mut batch, Direction::Forward).unwrap();
    assert!((batch[0].x - 5.9).abs() < 1e-12);
    assert!((batch[2].y - 50.5).abs() < 1e-12);
    // One candidate served the whole batch: one selection event.
    assert_eq!(chooser.selection_changes(), 1);
}

#[test]
fn test_chooser_surface() {
    let engine = MockEngine::new();
    let (_ctx, chooser, _) = chooser_between(
        &engine,
        vec![
            grid_backed_failure(),
            MockObject::of_kind(ObjectKind::Transformation)
                .applying(ApplyOutcome::Shift { dx: 1.0, dy: 0.0 }),
        ],
    );

    assert_eq!(chooser.kind(), ObjectKind::ChooseTransform);
    assert_eq!(chooser.count(), 2);
    assert_eq!(chooser.candidate(0).unwrap().kind(), ObjectKind::Transformation);
    assert!(matches!(
        chooser.candidate(2),
        Err(GeorefError::IndexOutOfRange { index: 2, count: 2 })
    ));
    assert_eq!(
        chooser.name().unwrap().as_deref(),
        Some("<choose-coordinate-transform>")
    );

    let suggested = chooser
        .suggested_operation(Coordinate::new(4.9, 52.3))
        .unwrap();
    assert!(suggested.is_some());

    chooser.dispose();
    assert!(chooser.is_disposed());
    assert!(matches!(
        chooser.transform(Coordinate::new(0.0, 0.0), Direction::Forward),
        Err(GeorefError::DisposedAccess { .. })
    ));
    assert_eq!(engine.destroyed_list_count(), 1);
}

#[test]
fn test_create_failure_populates_last_error() {
    let engine = MockEngine::new();
    let ctx = Context::new(engine);
    assert!(ctx.last_error().is_none());
    assert!(ctx.create("EPSG:99999").is_err());
    let message = ctx.last_error().expect("failure should be recorded");
    assert!(message.contains("EPSG:99999"));
    ctx.clear_error();
    assert!(ctx.last_error().is_none());
}
