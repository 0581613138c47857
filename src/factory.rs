//! Discriminant-driven materialization of engine handles into typed wrappers.
//!
//! Every handle entering the object model passes through [`materialize`]
//! exactly once. The discriminant space is the engine's closed enumeration
//! plus two values this crate mints for its own aggregate shapes
//! ([`ObjectKind::ChooseTransform`] and [`ObjectKind::CoordinateSystem`]);
//! those two label wrappers returned by other entry points and must never be
//! read off a fresh handle.

use crate::context::ContextInner;
use crate::crs::{BoundCrs, CompoundCrs, CoordinateSystem, Crs, GeodeticCrs, GeographicCrs};
use crate::datum::{Datum, DatumEnsemble, Ellipsoid, PrimeMeridian, ReferenceFrame};
use crate::error::GeorefError;
use crate::object::{GenericObject, ObjectCore};
use crate::operation::{Operation, Pipeline};
use crate::types::RawHandle;
use std::rc::Rc;

/// Declared name of the engine's internal aggregate object for a ranked
/// candidate set. Such handles report an unknown discriminant and are only
/// recognizable by this exact name.
pub(crate) const PIPELINE_MANAGER_NAME: &str = "Transformation pipeline manager";

/// Discriminant tag identifying a handle's concrete kind.
///
/// `ChooseTransform` and `CoordinateSystem` are local-only: they label
/// wrapper shapes this crate builds itself and are rejected by
/// [`materialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Unknown,
    Ellipsoid,
    PrimeMeridian,
    GeodeticReferenceFrame,
    DynamicGeodeticReferenceFrame,
    VerticalReferenceFrame,
    DynamicVerticalReferenceFrame,
    DatumEnsemble,
    TemporalDatum,
    EngineeringDatum,
    ParametricDatum,
    Geographic2DCrs,
    Geographic3DCrs,
    GeodeticCrs,
    GeocentricCrs,
    VerticalCrs,
    ProjectedCrs,
    CompoundCrs,
    TemporalCrs,
    EngineeringCrs,
    BoundCrs,
    OtherCrs,
    Conversion,
    Transformation,
    ConcatenatedOperation,
    OtherCoordinateOperation,
    /// Local-only: a ranked candidate aggregate built by this crate.
    ChooseTransform,
    /// Local-only: a bare coordinate system recognized via the secondary
    /// classifier.
    CoordinateSystem,
}

/// Secondary classifier for handles whose discriminant is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystemKind {
    Unknown,
    Cartesian,
    Ellipsoidal,
    Vertical,
    Spherical,
    Ordinal,
    Parametric,
    DateTime,
    TemporalCount,
    TemporalMeasure,
}

/// A materialized wrapper of the variant its discriminant calls for.
///
/// Variants share an `Rc` so aggregates can hand out stable child instances;
/// cloning the enum clones the reference, not the wrapper.
#[derive(Debug, Clone)]
pub enum ProjObject {
    Ellipsoid(Rc<Ellipsoid>),
    PrimeMeridian(Rc<PrimeMeridian>),
    ReferenceFrame(Rc<ReferenceFrame>),
    Datum(Rc<Datum>),
    DatumEnsemble(Rc<DatumEnsemble>),
    GeographicCrs(Rc<GeographicCrs>),
    GeodeticCrs(Rc<GeodeticCrs>),
    Crs(Rc<Crs>),
    BoundCrs(Rc<BoundCrs>),
    CompoundCrs(Rc<CompoundCrs>),
    Operation(Rc<Operation>),
    Pipeline(Rc<Pipeline>),
    CoordinateSystem(Rc<CoordinateSystem>),
    Generic(Rc<GenericObject>),
}

impl ProjObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ProjObject::Ellipsoid(o) => o.kind(),
            ProjObject::PrimeMeridian(o) => o.kind(),
            ProjObject::ReferenceFrame(o) => o.kind(),
            ProjObject::Datum(o) => o.kind(),
            ProjObject::DatumEnsemble(o) => o.kind(),
            ProjObject::GeographicCrs(o) => o.kind(),
            ProjObject::GeodeticCrs(o) => o.kind(),
            ProjObject::Crs(o) => o.kind(),
            ProjObject::BoundCrs(o) => o.kind(),
            ProjObject::CompoundCrs(o) => o.kind(),
            ProjObject::Operation(o) => o.kind(),
            ProjObject::Pipeline(o) => o.kind(),
            ProjObject::CoordinateSystem(o) => o.kind(),
            ProjObject::Generic(_) => ObjectKind::Unknown,
        }
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        match self {
            ProjObject::Ellipsoid(o) => o.core(),
            ProjObject::PrimeMeridian(o) => o.core(),
            ProjObject::ReferenceFrame(o) => o.core(),
            ProjObject::Datum(o) => o.core(),
            ProjObject::DatumEnsemble(o) => o.core(),
            ProjObject::GeographicCrs(o) => o.core(),
            ProjObject::GeodeticCrs(o) => o.core(),
            ProjObject::Crs(o) => o.core(),
            ProjObject::BoundCrs(o) => o.core(),
            ProjObject::CompoundCrs(o) => o.core(),
            ProjObject::Operation(o) => o.core(),
            ProjObject::Pipeline(o) => o.core(),
            ProjObject::CoordinateSystem(o) => o.core(),
            ProjObject::Generic(o) => o.core(),
        }
    }

    pub fn name(&self) -> Result<Option<String>, GeorefError> {
        self.core().name()
    }

    pub fn object_id(&self) -> Result<Option<String>, GeorefError> {
        self.core().object_id()
    }

    pub fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    pub fn is_crs(&self) -> bool {
        matches!(
            self,
            ProjObject::GeographicCrs(_)
                | ProjObject::GeodeticCrs(_)
                | ProjObject::Crs(_)
                | ProjObject::BoundCrs(_)
                | ProjObject::CompoundCrs(_)
        )
    }

    /// Dispose the wrapper behind this reference. Aggregate variants release
    /// their materialized children first; every path is idempotent.
    pub fn dispose(&self) {
        match self {
            ProjObject::Ellipsoid(o) => o.dispose(),
            ProjObject::PrimeMeridian(o) => o.dispose(),
            ProjObject::ReferenceFrame(o) => o.dispose(),
            ProjObject::Datum(o) => o.dispose(),
            ProjObject::DatumEnsemble(o) => o.dispose(),
            ProjObject::GeographicCrs(o) => o.dispose(),
            ProjObject::GeodeticCrs(o) => o.dispose(),
            ProjObject::Crs(o) => o.dispose(),
            ProjObject::BoundCrs(o) => o.dispose(),
            ProjObject::CompoundCrs(o) => o.dispose(),
            ProjObject::Operation(o) => o.dispose(),
            ProjObject::Pipeline(o) => o.dispose(),
            ProjObject::CoordinateSystem(o) => o.dispose(),
            ProjObject::Generic(o) => o.dispose(),
        }
    }
}

/// Read the handle's discriminant and build the wrapper variant it calls
/// for. Ownership of the handle transfers to the wrapper on success and the
/// handle is destroyed on failure paths that already own it.
pub(crate) fn materialize(
    ctx: &Rc<ContextInner>,
    handle: RawHandle,
) -> Result<ProjObject, GeorefError> {
    if handle.is_null() {
        return Err(GeorefError::InvalidArgument("handle"));
    }
    let kind = ctx.note(ctx.engine().object_kind(&handle))?;
    let object = match kind {
        ObjectKind::Ellipsoid => ProjObject::Ellipsoid(Rc::new(Ellipsoid::new(ctx, handle)?)),
        ObjectKind::PrimeMeridian => {
            ProjObject::PrimeMeridian(Rc::new(PrimeMeridian::new(ctx, handle)?))
        }
        ObjectKind::GeodeticReferenceFrame
        | ObjectKind::DynamicGeodeticReferenceFrame
        | ObjectKind::VerticalReferenceFrame
        | ObjectKind::DynamicVerticalReferenceFrame => {
            ProjObject::ReferenceFrame(Rc::new(ReferenceFrame::new(ctx, handle, kind)?))
        }
        ObjectKind::TemporalDatum | ObjectKind::EngineeringDatum | ObjectKind::ParametricDatum => {
            ProjObject::Datum(Rc::new(Datum::new(ctx, handle, kind)?))
        }
        ObjectKind::DatumEnsemble => {
            ProjObject::DatumEnsemble(Rc::new(DatumEnsemble::new(ctx, handle)?))
        }
        ObjectKind::Geographic2DCrs | ObjectKind::Geographic3DCrs => {
            ProjObject::GeographicCrs(Rc::new(GeographicCrs::new(ctx, handle, kind)?))
        }
        ObjectKind::GeodeticCrs | ObjectKind::GeocentricCrs => {
            ProjObject::GeodeticCrs(Rc::new(GeodeticCrs::new(ctx, handle, kind)?))
        }
        ObjectKind::VerticalCrs
        | ObjectKind::ProjectedCrs
        | ObjectKind::TemporalCrs
        | ObjectKind::EngineeringCrs
        | ObjectKind::OtherCrs => ProjObject::Crs(Rc::new(Crs::new(ctx, handle, kind)?)),
        ObjectKind::BoundCrs => ProjObject::BoundCrs(Rc::new(BoundCrs::new(ctx, handle)?)),
        ObjectKind::CompoundCrs => ProjObject::CompoundCrs(Rc::new(CompoundCrs::new(ctx, handle)?)),
        ObjectKind::Conversion
        | ObjectKind::Transformation
        | ObjectKind::OtherCoordinateOperation => {
            ProjObject::Operation(Rc::new(Operation::new(ctx, handle, kind)?))
        }
        ObjectKind::ConcatenatedOperation => {
            ProjObject::Pipeline(Rc::new(Pipeline::new(ctx, handle)?))
        }
        ObjectKind::Unknown => return materialize_unknown(ctx, handle),
        ObjectKind::ChooseTransform | ObjectKind::CoordinateSystem => {
            ctx.engine().destroy_handle(handle);
            return Err(GeorefError::InvariantViolation(
                "local-only discriminant reached materialization",
            ));
        }
    };
    Ok(object)
}

/// Fallback chain for handles the primary discriminant cannot place: first
/// the coordinate-system classifier, then the engine's legacy aggregate by
/// its declared name, and finally a generic wrapper.
fn materialize_unknown(
    ctx: &Rc<ContextInner>,
    handle: RawHandle,
) -> Result<ProjObject, GeorefError> {
    let cs_kind = ctx.engine().classify_coordinate_system(&handle);
    if cs_kind != CoordinateSystemKind::Unknown {
        return Ok(ProjObject::CoordinateSystem(Rc::new(CoordinateSystem::new(
            ctx, handle, cs_kind,
        )?)));
    }
    // The classifier probe may have recorded a failure; wipe it so the name
    // lookup below starts from a clean slot.
    ctx.clear_error();
    let name = ctx.note(ctx.engine().declared_name(&handle))?;
    if name.as_deref() == Some(PIPELINE_MANAGER_NAME) {
        return Ok(ProjObject::Operation(Rc::new(Operation::new(
            ctx,
            handle,
            ObjectKind::Unknown,
        )?)));
    }
    Ok(ProjObject::Generic(Rc::new(GenericObject::new(ctx, handle)?)))
}
