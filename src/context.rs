//! Process-scoped resource domain.
//!
//! A [`Context`] owns the engine connection and is the creation point for
//! every wrapper. Wrappers hold a weak back-reference to the context's
//! interior: dropping the context while wrappers are still live is a caller
//! error, after which those wrappers fail with
//! [`GeorefError::ContextDropped`] instead of touching a stale engine.
//!
//! All access to a context and the objects it produced must happen on one
//! thread; nothing here locks. This is a documented precondition, not an
//! enforced one.

use crate::config::TransformConfig;
use crate::engine::GeodesyEngine;
use crate::error::GeorefError;
use crate::factory::{self, ProjObject};
use crate::selector::ChooseOperation;
use crate::types::RawHandle;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct ContextInner {
    engine: Box<dyn GeodesyEngine>,
    last_error: RefCell<Option<String>>,
}

impl ContextInner {
    pub(crate) fn engine(&self) -> &dyn GeodesyEngine {
        self.engine.as_ref()
    }

    /// Record an engine failure in the last-error slot on its way out.
    ///
    /// The slot only distinguishes "no result" from "no error recorded" for
    /// callers that cleared it first; it is not a general error channel.
    pub(crate) fn note<T>(
        &self,
        result: Result<T, GeorefError>,
    ) -> Result<T, GeorefError> {
        if let Err(err) = &result {
            *self.last_error.borrow_mut() = Some(err.to_string());
        }
        result
    }

    pub(crate) fn clear_error(&self) {
        self.last_error.borrow_mut().take();
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }
}

/// Owner of an engine connection and of the wrappers created through it.
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    pub fn new(engine: impl GeodesyEngine + 'static) -> Self {
        Context {
            inner: Rc::new(ContextInner {
                engine: Box::new(engine),
                last_error: RefCell::new(None),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Rc<ContextInner> {
        &self.inner
    }

    /// Parse a definition (EPSG code, proj-string, WKT, ...) and materialize
    /// the resulting handle into its typed wrapper.
    pub fn create(&self, definition: &str) -> Result<ProjObject, GeorefError> {
        if definition.trim().is_empty() {
            return Err(GeorefError::InvalidArgument("definition"));
        }
        let handle = self
            .inner
            .note(self.inner.engine().create_from_definition(definition))?;
        self.materialize(handle)
    }

    /// Turn an engine handle into the typed wrapper its discriminant calls
    /// for. Ownership of the handle transfers to the wrapper.
    pub fn materialize(&self, handle: RawHandle) -> Result<ProjObject, GeorefError> {
        factory::materialize(&self.inner, handle)
    }

    /// Rank candidate operations between two reference systems and return
    /// the aggregate that selects among them per coordinate.
    pub fn choose_transform(
        &self,
        source: &ProjObject,
        target: &ProjObject,
        options: &TransformConfig,
    ) -> Result<ChooseOperation, GeorefError> {
        ChooseOperation::new_ranked(&self.inner, source, target, options)
    }

    /// Clear the last-error slot. Call before an operation whose "no result"
    /// outcome must be distinguishable from a recorded failure.
    pub fn clear_error(&self) {
        self.inner.clear_error();
    }

    /// Message of the last engine failure observed since the slot was
    /// cleared, if any.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error()
    }
}
