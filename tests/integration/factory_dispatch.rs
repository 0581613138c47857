//! Discriminant dispatch through the public materialization entry point.

use georef::context::Context;
use georef::engine::mock::{MockEngine, MockObject};
use georef::error::GeorefError;
use georef::factory::{CoordinateSystemKind, ObjectKind, ProjObject};
use georef::types::RawHandle;

fn materialize(kind: ObjectKind) -> ProjObject {
    let engine = MockEngine::new();
    let id = engine.insert(MockObject::of_kind(kind));
    Context::new(engine)
        .materialize(RawHandle::new(id))
        .unwrap()
}

#[test]
fn test_family_dispatch() {
    assert!(matches!(
        materialize(ObjectKind::Ellipsoid),
        ProjObject::Ellipsoid(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::PrimeMeridian),
        ProjObject::PrimeMeridian(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::DynamicGeodeticReferenceFrame),
        ProjObject::ReferenceFrame(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::ParametricDatum),
        ProjObject::Datum(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::Geographic3DCrs),
        ProjObject::GeographicCrs(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::GeocentricCrs),
        ProjObject::GeodeticCrs(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::ProjectedCrs),
        ProjObject::Crs(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::BoundCrs),
        ProjObject::BoundCrs(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::OtherCoordinateOperation),
        ProjObject::Operation(_)
    ));
    assert!(matches!(
        materialize(ObjectKind::ConcatenatedOperation),
        ProjObject::Pipeline(_)
    ));
}

#[test]
fn test_dynamic_frames_report_dynamic() {
    let ProjObject::ReferenceFrame(frame) = materialize(ObjectKind::DynamicVerticalReferenceFrame)
    else {
        panic!("expected reference frame");
    };
    assert!(frame.is_dynamic());

    let ProjObject::ReferenceFrame(frame) = materialize(ObjectKind::VerticalReferenceFrame) else {
        panic!("expected reference frame");
    };
    assert!(!frame.is_dynamic());
}

#[test]
fn test_local_only_tags_rejected() {
    for kind in [ObjectKind::ChooseTransform, ObjectKind::CoordinateSystem] {
        let engine = MockEngine::new();
        let id = engine.insert(MockObject::of_kind(kind));
        let err = Context::new(engine)
            .materialize(RawHandle::new(id))
            .unwrap_err();
        assert!(matches!(err, GeorefError::InvariantViolation(_)));
    }
}

#[test]
fn test_unknown_tag_fallback_chain() {
    // Classifier hit: coordinate system wrapper.
    let engine = MockEngine::new();
    let id = engine.insert(
        MockObject::of_kind(ObjectKind::Unknown).classified_as(CoordinateSystemKind::Vertical),
    );
    let obj = Context::new(engine).materialize(RawHandle::new(id)).unwrap();
    assert!(matches!(obj, ProjObject::CoordinateSystem(_)));

    // Legacy aggregate, recognizable only by name: operation wrapper.
    let engine = MockEngine::new();
    let id = engine.insert(
        MockObject::of_kind(ObjectKind::Unknown).named("Transformation pipeline manager"),
    );
    let obj = Context::new(engine).materialize(RawHandle::new(id)).unwrap();
    assert!(matches!(obj, ProjObject::Operation(_)));

    // Neither: generic wrapper.
    let engine = MockEngine::new();
    let id = engine.insert(MockObject::of_kind(ObjectKind::Unknown).named("mystery"));
    let obj = Context::new(engine).materialize(RawHandle::new(id)).unwrap();
    assert!(matches!(obj, ProjObject::Generic(_)));
}

#[test]
fn test_compound_crs_aggregates_component_axes() {
    let engine = MockEngine::new();
    let horizontal = engine.insert(
        MockObject::of_kind(ObjectKind::Geographic2DCrs)
            .named("horizontal")
            .with_axes(vec![axis("Latitude"), axis("Longitude")]),
    );
    let vertical = engine.insert(
        MockObject::of_kind(ObjectKind::VerticalCrs)
            .named("vertical")
            .with_axes(vec![axis("Gravity-related height")]),
    );
    let compound = engine.insert(
        MockObject::of_kind(ObjectKind::CompoundCrs).with_sub_crs(vec![horizontal, vertical]),
    );
    let ctx = Context::new(engine);

    let ProjObject::CompoundCrs(compound) = ctx.materialize(RawHandle::new(compound)).unwrap()
    else {
        panic!("expected compound crs");
    };
    assert_eq!(compound.axis_count().unwrap(), 3);
    assert_eq!(
        compound.component(0).unwrap().name().unwrap().as_deref(),
        Some("horizontal")
    );
    assert!(matches!(
        compound.component(2),
        Err(GeorefError::IndexOutOfRange { index: 2, count: 2 })
    ));
}

fn axis(name: &str) -> georef::crs::AxisInfo {
    georef::crs::AxisInfo {
        name: name.into(),
        abbreviation: name[..1].to_lowercase(),
        direction: "north".into(),
        unit_name: "degree".into(),
        unit_conversion_factor: 0.017_453_292_519_943_295,
    }
}
