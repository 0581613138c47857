//! Wrapper lifecycle: disposal, metadata memoization, lazy children.

use georef::context::Context;
use georef::engine::mock::{MockEngine, MockObject};
use georef::error::GeorefError;
use georef::factory::{ObjectKind, ProjObject};
use georef::object::Identifier;
use georef::types::RawHandle;
use std::rc::Rc;

#[test]
fn test_metadata_memoized_across_dispose() {
    let engine = MockEngine::new();
    let id = engine.insert(
        MockObject::of_kind(ObjectKind::Ellipsoid)
            .named("GRS 1980")
            .with_id("EPSG:7019"),
    );
    let ctx = Context::new(engine.clone());
    let obj = ctx.materialize(RawHandle::new(id)).unwrap();

    assert_eq!(obj.name().unwrap().as_deref(), Some("GRS 1980"));
    obj.dispose();
    assert!(obj.is_disposed());
    assert_eq!(engine.destroy_count(id), 1);

    // The name was fetched while live and survives in the cache; the id was
    // never fetched and now cannot be.
    assert_eq!(obj.name().unwrap().as_deref(), Some("GRS 1980"));
    assert!(matches!(
        obj.object_id(),
        Err(GeorefError::DisposedAccess { .. })
    ));

    // The safety net must observe "already disposed".
    drop(obj);
    assert_eq!(engine.destroy_count(id), 1);
}

#[test]
fn test_identifiers_cached_and_bounds_checked() {
    let engine = MockEngine::new();
    let id = engine.insert(
        MockObject::of_kind(ObjectKind::Geographic2DCrs).with_identifiers(vec![Identifier {
            authority: "EPSG".into(),
            code: "4326".into(),
        }]),
    );
    let ctx = Context::new(engine);
    let ProjObject::GeographicCrs(crs) = ctx.materialize(RawHandle::new(id)).unwrap() else {
        panic!("expected geographic crs");
    };

    assert_eq!(crs.identifier_count().unwrap(), 1);
    let first = crs.identifier(0).unwrap();
    assert!(Rc::ptr_eq(&first, &crs.identifier(0).unwrap()));
    assert_eq!(first.authority, "EPSG");
    assert!(matches!(
        crs.identifier(1),
        Err(GeorefError::IndexOutOfRange { index: 1, count: 1 })
    ));
}

#[test]
fn test_ensemble_members_built_eagerly_released_once() {
    let engine = MockEngine::new();
    let m0 = engine.insert(MockObject::of_kind(ObjectKind::TemporalDatum).named("epoch A"));
    let m1 = engine.insert(MockObject::of_kind(ObjectKind::TemporalDatum).named("epoch B"));
    let ensemble_id = engine.insert(
        MockObject::of_kind(ObjectKind::DatumEnsemble)
            .named("ensemble")
            .with_members(vec![m0, m1]),
    );
    let ctx = Context::new(engine.clone());
    let ProjObject::DatumEnsemble(ensemble) =
        ctx.materialize(RawHandle::new(ensemble_id)).unwrap()
    else {
        panic!("expected datum ensemble");
    };

    // Eager: both member handles were minted during materialization.
    assert_eq!(engine.minted_from(m0).len(), 1);
    assert_eq!(engine.minted_from(m1).len(), 1);
    assert_eq!(ensemble.member_count(), 2);
    assert_eq!(
        ensemble.member(0).unwrap().name().unwrap().as_deref(),
        Some("epoch A")
    );

    ensemble.dispose();
    ensemble.dispose();
    assert_eq!(engine.destroy_count(ensemble_id), 1);
    assert_eq!(engine.destroy_count(engine.minted_from(m0)[0]), 1);
    assert_eq!(engine.destroy_count(engine.minted_from(m1)[0]), 1);
}

#[test]
fn test_pipeline_steps_materialize_on_demand() {
    let engine = MockEngine::new();
    let s0 = engine.insert(MockObject::of_kind(ObjectKind::Conversion));
    let s1 = engine.insert(MockObject::of_kind(ObjectKind::Transformation));
    let pipeline_id = engine.insert(
        MockObject::of_kind(ObjectKind::ConcatenatedOperation).with_steps(vec![s0, s1]),
    );
    let ctx = Context::new(engine.clone());
    let ProjObject::Pipeline(pipeline) = ctx.materialize(RawHandle::new(pipeline_id)).unwrap()
    else {
        panic!("expected pipeline");
    };

    assert_eq!(pipeline.step_count().unwrap(), 2);
    assert!(engine.minted_from(s0).is_empty());

    let first = pipeline.step(0).unwrap();
    assert!(Rc::ptr_eq(&first, &pipeline.step(0).unwrap()));
    assert_eq!(engine.minted_from(s0).len(), 1);
    assert!(engine.minted_from(s1).is_empty());

    assert!(matches!(
        pipeline.step(2),
        Err(GeorefError::IndexOutOfRange { index: 2, count: 2 })
    ));

    // Enumeration forces the remaining slot.
    assert_eq!(pipeline.steps().unwrap().len(), 2);
    assert_eq!(engine.minted_from(s1).len(), 1);
}

#[test]
fn test_dropped_context_neutralizes_wrappers() {
    let engine = MockEngine::new();
    let id = engine.insert(MockObject::of_kind(ObjectKind::Ellipsoid).named("WGS 84"));
    let ctx = Context::new(engine.clone());
    let obj = ctx.materialize(RawHandle::new(id)).unwrap();
    drop(ctx);

    assert!(matches!(obj.name(), Err(GeorefError::ContextDropped)));
    // Release has no engine to call into; it must not panic and must not
    // pretend to have destroyed anything.
    obj.dispose();
    drop(obj);
    assert_eq!(engine.destroy_count(id), 0);
}
