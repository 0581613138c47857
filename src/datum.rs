//! Datum-side wrappers: ellipsoids, prime meridians, reference frames,
//! datums and datum ensembles.

use crate::context::ContextInner;
use crate::error::GeorefError;
use crate::factory::ObjectKind;
use crate::object::ObjectCore;
use crate::types::RawHandle;
use std::rc::Rc;

#[derive(Debug)]
pub struct Ellipsoid {
    core: ObjectCore,
}

impl Ellipsoid {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(Ellipsoid {
            core: ObjectCore::new(ctx, handle, "ellipsoid")?,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::Ellipsoid
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(Ellipsoid);

#[derive(Debug)]
pub struct PrimeMeridian {
    core: ObjectCore,
}

impl PrimeMeridian {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(PrimeMeridian {
            core: ObjectCore::new(ctx, handle, "prime meridian")?,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::PrimeMeridian
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(PrimeMeridian);

/// Wrapper for the four reference-frame discriminants (geodetic, vertical,
/// and their dynamic variants).
#[derive(Debug)]
pub struct ReferenceFrame {
    core: ObjectCore,
    kind: ObjectKind,
}

impl ReferenceFrame {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(ReferenceFrame {
            core: ObjectCore::new(ctx, handle, "reference frame")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::DynamicGeodeticReferenceFrame | ObjectKind::DynamicVerticalReferenceFrame
        )
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(ReferenceFrame);

/// Wrapper for the temporal, engineering and parametric datum discriminants,
/// and for members of a datum ensemble.
#[derive(Debug)]
pub struct Datum {
    core: ObjectCore,
    kind: ObjectKind,
}

impl Datum {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(Datum {
            core: ObjectCore::new(ctx, handle, "datum")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(Datum);

/// A datum ensemble: a candidate-set-shaped aggregate whose members are
/// built eagerly at materialization (ensembles are few and cheap).
#[derive(Debug)]
pub struct DatumEnsemble {
    core: ObjectCore,
    members: Vec<Rc<Datum>>,
}

impl DatumEnsemble {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        let core = ObjectCore::new(ctx, handle, "datum ensemble")?;
        let count =
            core.with_handle(|c, h| c.note(c.engine().ensemble_member_count(h)))?;
        let mut members = Vec::with_capacity(count);
        for index in 0..count {
            let member_handle =
                core.with_handle(|c, h| c.note(c.engine().ensemble_member(h, index)))?;
            let kind = core.with_handle(|c, _| c.note(c.engine().object_kind(&member_handle)))?;
            members.push(Rc::new(Datum::new(ctx, member_handle, kind)?));
        }
        Ok(DatumEnsemble { core, members })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::DatumEnsemble
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, index: usize) -> Result<Rc<Datum>, GeorefError> {
        self.members
            .get(index)
            .map(Rc::clone)
            .ok_or(GeorefError::IndexOutOfRange {
                index,
                count: self.members.len(),
            })
    }

    pub fn members(&self) -> impl Iterator<Item = &Rc<Datum>> {
        self.members.iter()
    }

    /// Disposes every member, then the ensemble handle itself.
    pub fn dispose(&self) {
        for member in &self.members {
            member.dispose();
        }
        self.core.dispose();
    }
}

crate::delegate_object_meta!(DatumEnsemble);
