//! Coordinate-reference-system wrappers.
//!
//! The CRS discriminant family maps onto a handful of wrapper shapes:
//! geographic CRS get their own wrapper, geodetic/geocentric share one,
//! compound CRS are a fixed two-element aggregate over their horizontal and
//! vertical components, and the remaining kinds share the plain [`Crs`]
//! wrapper. [`CoordinateSystem`] only ever comes out of the factory's
//! secondary classifier.

use crate::children::LazyList;
use crate::context::ContextInner;
use crate::error::GeorefError;
use crate::factory::{CoordinateSystemKind, ObjectKind, ProjObject};
use crate::object::ObjectCore;
use crate::types::RawHandle;
use std::cell::RefCell;
use std::rc::Rc;

/// One axis of a coordinate system, as declared by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisInfo {
    pub name: String,
    pub abbreviation: String,
    pub direction: String,
    pub unit_name: String,
    pub unit_conversion_factor: f64,
}

/// Geographic 2D or 3D CRS.
#[derive(Debug)]
pub struct GeographicCrs {
    core: ObjectCore,
    kind: ObjectKind,
}

impl GeographicCrs {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(GeographicCrs {
            core: ObjectCore::new(ctx, handle, "geographic crs")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_three_dimensional(&self) -> bool {
        self.kind == ObjectKind::Geographic3DCrs
    }

    pub fn axis_count(&self) -> Result<usize, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h)))
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(GeographicCrs);

/// Geodetic or geocentric CRS.
#[derive(Debug)]
pub struct GeodeticCrs {
    core: ObjectCore,
    kind: ObjectKind,
}

impl GeodeticCrs {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(GeodeticCrs {
            core: ObjectCore::new(ctx, handle, "geodetic crs")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn axis_count(&self) -> Result<usize, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h)))
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(GeodeticCrs);

/// Vertical, projected, temporal, engineering and other CRS kinds.
#[derive(Debug)]
pub struct Crs {
    core: ObjectCore,
    kind: ObjectKind,
}

impl Crs {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(Crs {
            core: ObjectCore::new(ctx, handle, "crs")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn axis_count(&self) -> Result<usize, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h)))
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(Crs);

/// A CRS bound to a target frame through a declared transformation.
#[derive(Debug)]
pub struct BoundCrs {
    core: ObjectCore,
}

impl BoundCrs {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(BoundCrs {
            core: ObjectCore::new(ctx, handle, "bound crs")?,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::BoundCrs
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(BoundCrs);

/// A compound CRS. Its two components sit at fixed indices 0 and 1 rather
/// than behind an arbitrary-length list, and are materialized on first
/// access.
#[derive(Debug)]
pub struct CompoundCrs {
    core: ObjectCore,
    subs: RefCell<[Option<ProjObject>; 2]>,
}

impl CompoundCrs {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(CompoundCrs {
            core: ObjectCore::new(ctx, handle, "compound crs")?,
            subs: RefCell::new([None, None]),
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::CompoundCrs
    }

    pub fn component_count(&self) -> usize {
        2
    }

    /// Component 0 (horizontal) or 1 (vertical), materialized on first
    /// access and cached for the compound's lifetime.
    pub fn component(&self, index: usize) -> Result<ProjObject, GeorefError> {
        if index >= 2 {
            return Err(GeorefError::IndexOutOfRange { index, count: 2 });
        }
        if let Some(existing) = &self.subs.borrow()[index] {
            return Ok(existing.clone());
        }
        let ctx = self.core.context()?;
        let handle = self
            .core
            .with_handle(|c, h| c.note(c.engine().sub_crs(h, index)))?;
        let object = crate::factory::materialize(&ctx, handle)?;
        if !object.is_crs() {
            object.dispose();
            return Err(GeorefError::InvariantViolation(
                "compound crs component did not materialize as a crs",
            ));
        }
        self.subs.borrow_mut()[index] = Some(object.clone());
        Ok(object)
    }

    /// Sum of the two components' axis counts.
    pub fn axis_count(&self) -> Result<usize, GeorefError> {
        let horizontal = self.component(0)?;
        let vertical = self.component(1)?;
        let a = horizontal
            .core()
            .with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h)))?;
        let b = vertical
            .core()
            .with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h)))?;
        Ok(a + b)
    }

    /// Disposes whichever components have been materialized, then the
    /// compound handle itself.
    pub fn dispose(&self) {
        for slot in self.subs.borrow().iter().flatten() {
            slot.dispose();
        }
        self.core.dispose();
    }
}

crate::delegate_object_meta!(CompoundCrs);

/// A bare coordinate system, reached only through the factory's secondary
/// classifier when the primary discriminant is unknown.
#[derive(Debug)]
pub struct CoordinateSystem {
    core: ObjectCore,
    cs_kind: CoordinateSystemKind,
    axes: LazyList<AxisInfo>,
}

impl CoordinateSystem {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        cs_kind: CoordinateSystemKind,
    ) -> Result<Self, GeorefError> {
        Ok(CoordinateSystem {
            core: ObjectCore::new(ctx, handle, "coordinate system")?,
            cs_kind,
            axes: LazyList::new(),
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// The local-only discriminant used to label this wrapper shape.
    pub fn kind(&self) -> ObjectKind {
        ObjectKind::CoordinateSystem
    }

    pub fn coordinate_system_kind(&self) -> CoordinateSystemKind {
        self.cs_kind
    }

    pub fn axis_count(&self) -> Result<usize, GeorefError> {
        self.axes
            .count(|| self.core.with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h))))
    }

    pub fn axis(&self, index: usize) -> Result<Rc<AxisInfo>, GeorefError> {
        self.axes.item(
            index,
            || self.core.with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h))),
            |i| {
                self.core
                    .with_handle(|ctx, h| ctx.note(ctx.engine().axis(h, i)))
                    .map(Rc::new)
            },
        )
    }

    pub fn axes(&self) -> Result<Vec<Rc<AxisInfo>>, GeorefError> {
        self.axes.force_all(
            || self.core.with_handle(|ctx, h| ctx.note(ctx.engine().axis_count(h))),
            |i| {
                self.core
                    .with_handle(|ctx, h| ctx.note(ctx.engine().axis(h, i)))
                    .map(Rc::new)
            },
        )
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(CoordinateSystem);
