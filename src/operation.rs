//! Coordinate operation wrappers: single operations and concatenated
//! pipelines.

use crate::children::LazyList;
use crate::context::ContextInner;
use crate::error::GeorefError;
use crate::factory::{self, ObjectKind, ProjObject};
use crate::object::ObjectCore;
use crate::types::{Coordinate, Direction, RawHandle};
use std::rc::Rc;

/// A single coordinate operation (conversion, transformation or other).
#[derive(Debug)]
pub struct Operation {
    core: ObjectCore,
    kind: ObjectKind,
}

impl Operation {
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: ObjectKind,
    ) -> Result<Self, GeorefError> {
        Ok(Operation {
            core: ObjectCore::new(ctx, handle, "operation")?,
            kind,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// How many external grid-shift datasets this operation depends on.
    /// Zero means it is applicable everywhere by construction.
    pub fn grid_dependency_count(&self) -> Result<usize, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().grid_dependency_count(h)))
    }

    /// Declared accuracy in meters, if the engine knows one.
    pub fn accuracy(&self) -> Result<Option<f64>, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().accuracy(h)))
    }

    pub fn has_inverse(&self) -> Result<bool, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().has_inverse(h)))
    }

    /// Apply this operation to one coordinate. A non-finite result means the
    /// point fell outside the operation's actual coverage.
    pub fn apply(
        &self,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().apply(h, coordinate, direction)))
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(Operation);

/// A concatenated operation: an ordered, fixed-length sequence of steps.
///
/// The step count is fetched once and cached; each step is materialized
/// independently on first access, and a materialized step's identity is
/// stable for the pipeline's lifetime.
#[derive(Debug)]
pub struct Pipeline {
    core: ObjectCore,
    steps: LazyList<Operation>,
}

impl Pipeline {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(Pipeline {
            core: ObjectCore::new(ctx, handle, "pipeline")?,
            steps: LazyList::new(),
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::ConcatenatedOperation
    }

    pub fn step_count(&self) -> Result<usize, GeorefError> {
        self.steps
            .count(|| self.core.with_handle(|ctx, h| ctx.note(ctx.engine().step_count(h))))
    }

    /// Step at `index`, in pipeline order. Built through the factory on
    /// first access; the same instance is returned afterwards.
    pub fn step(&self, index: usize) -> Result<Rc<Operation>, GeorefError> {
        self.steps.item(
            index,
            || self.core.with_handle(|ctx, h| ctx.note(ctx.engine().step_count(h))),
            |i| self.build_step(i),
        )
    }

    /// All steps in order, forcing materialization of every slot not yet
    /// built.
    pub fn steps(&self) -> Result<Vec<Rc<Operation>>, GeorefError> {
        self.steps.force_all(
            || self.core.with_handle(|ctx, h| ctx.note(ctx.engine().step_count(h))),
            |i| self.build_step(i),
        )
    }

    fn build_step(&self, index: usize) -> Result<Rc<Operation>, GeorefError> {
        let ctx = self.core.context()?;
        let handle = self
            .core
            .with_handle(|c, h| c.note(c.engine().step(h, index)))?;
        match factory::materialize(&ctx, handle)? {
            ProjObject::Operation(op) => Ok(op),
            other => {
                other.dispose();
                Err(GeorefError::InvariantViolation(
                    "pipeline step did not materialize as an operation",
                ))
            }
        }
    }

    /// Same semantics as [`Operation::apply`], evaluated by the engine over
    /// the whole pipeline.
    pub fn apply(
        &self,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().apply(h, coordinate, direction)))
    }

    pub fn grid_dependency_count(&self) -> Result<usize, GeorefError> {
        self.core
            .with_handle(|ctx, h| ctx.note(ctx.engine().grid_dependency_count(h)))
    }

    /// Disposes whichever steps have been materialized, then the pipeline
    /// handle itself. Untouched slots are skipped, never forced.
    pub fn dispose(&self) {
        for step in self.steps.materialized() {
            step.dispose();
        }
        self.core.dispose();
    }
}

crate::delegate_object_meta!(Pipeline);
