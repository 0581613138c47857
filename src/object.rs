//! Handle ownership and the shared wrapper core.
//!
//! Every typed wrapper embeds one [`ObjectCore`]: it owns the native handle,
//! guarantees exactly-once destruction, rejects use after dispose, and
//! memoizes the immutable metadata (id, name, definition, scope) fetched
//! from the engine. Explicit [`ObjectCore::dispose`] and the `Drop` safety
//! net converge on one release routine guarded by a single disposed flag,
//! so whichever runs first performs the release and the other observes
//! "already done".

use crate::children::LazyList;
use crate::context::ContextInner;
use crate::error::GeorefError;
use crate::types::RawHandle;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Authority/code pair declared on an object, e.g. `EPSG` / `4326`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub authority: String,
    pub code: String,
}

/// Sentinel metadata value used for synthetic wrappers whose handle must not
/// be queried (see [`ObjectCore::force_unknown_info`]).
const UNKNOWN_INFO: &str = "?";

#[derive(Debug)]
pub struct ObjectCore {
    ctx: Weak<ContextInner>,
    kind: &'static str,
    handle: RefCell<Option<RawHandle>>,
    disposed: Cell<bool>,
    id: RefCell<Option<String>>,
    name: RefCell<Option<String>>,
    definition: RefCell<Option<String>>,
    scope: RefCell<Option<String>>,
    identifiers: LazyList<Identifier>,
}

impl ObjectCore {
    /// `kind` names the resource in disposed-access errors.
    pub(crate) fn new(
        ctx: &Rc<ContextInner>,
        handle: RawHandle,
        kind: &'static str,
    ) -> Result<Self, GeorefError> {
        if handle.is_null() {
            return Err(GeorefError::InvalidArgument("handle"));
        }
        Ok(ObjectCore {
            ctx: Rc::downgrade(ctx),
            kind,
            handle: RefCell::new(Some(handle)),
            disposed: Cell::new(false),
            id: RefCell::new(None),
            name: RefCell::new(None),
            definition: RefCell::new(None),
            scope: RefCell::new(None),
            identifiers: LazyList::new(),
        })
    }

    pub(crate) fn context(&self) -> Result<Rc<ContextInner>, GeorefError> {
        self.ctx.upgrade().ok_or(GeorefError::ContextDropped)
    }

    pub(crate) fn context_opt(&self) -> Option<Rc<ContextInner>> {
        self.ctx.upgrade()
    }

    /// Run `f` against the live handle. Fails with `DisposedAccess` after
    /// dispose and with `ContextDropped` once the owning context is gone.
    pub(crate) fn with_handle<R>(
        &self,
        f: impl FnOnce(&ContextInner, &RawHandle) -> Result<R, GeorefError>,
    ) -> Result<R, GeorefError> {
        if self.disposed.get() {
            return Err(GeorefError::DisposedAccess { kind: self.kind });
        }
        let ctx = self.context()?;
        let guard = self.handle.borrow();
        let handle = guard.as_ref().ok_or(GeorefError::DisposedAccess {
            kind: self.kind,
        })?;
        f(&ctx, handle)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn resource_kind(&self) -> &'static str {
        self.kind
    }

    /// Destroy the handle. Idempotent; later accessor calls fail with
    /// `DisposedAccess` naming the resource kind.
    pub fn dispose(&self) {
        self.release();
    }

    fn release(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(handle) = self.handle.borrow_mut().take() {
            // Context already gone: nothing left to destroy against.
            if let Some(ctx) = self.ctx.upgrade() {
                ctx.engine().destroy_handle(handle);
            }
        }
    }

    /// Pre-seed every metadata field with a sentinel so later queries never
    /// touch a handle that an aggregate may share or have disposed.
    pub(crate) fn force_unknown_info(&self) {
        *self.id.borrow_mut() = Some(UNKNOWN_INFO.to_string());
        *self.name.borrow_mut() = Some(UNKNOWN_INFO.to_string());
        *self.definition.borrow_mut() = Some(UNKNOWN_INFO.to_string());
        *self.scope.borrow_mut() = Some(UNKNOWN_INFO.to_string());
    }

    pub(crate) fn set_name(&self, value: &str) {
        *self.name.borrow_mut() = Some(value.to_string());
    }

    fn meta(
        &self,
        cell: &RefCell<Option<String>>,
        fetch: impl FnOnce(&ContextInner, &RawHandle) -> Result<Option<String>, GeorefError>,
    ) -> Result<Option<String>, GeorefError> {
        if let Some(value) = cell.borrow().clone() {
            return Ok(Some(value));
        }
        let fetched = self.with_handle(|ctx, handle| ctx.note(fetch(ctx, handle)))?;
        if let Some(value) = &fetched {
            *cell.borrow_mut() = Some(value.clone());
        }
        Ok(fetched)
    }

    pub fn object_id(&self) -> Result<Option<String>, GeorefError> {
        self.meta(&self.id, |ctx, h| ctx.engine().declared_id(h))
    }

    pub fn name(&self) -> Result<Option<String>, GeorefError> {
        self.meta(&self.name, |ctx, h| ctx.engine().declared_name(h))
    }

    pub fn definition(&self) -> Result<Option<String>, GeorefError> {
        self.meta(&self.definition, |ctx, h| ctx.engine().definition(h))
    }

    pub fn scope(&self) -> Result<Option<String>, GeorefError> {
        self.meta(&self.scope, |ctx, h| ctx.engine().scope(h))
    }

    pub fn identifier_count(&self) -> Result<usize, GeorefError> {
        self.identifiers
            .count(|| self.with_handle(|ctx, h| ctx.note(ctx.engine().identifier_count(h))))
    }

    pub fn identifier(&self, index: usize) -> Result<Rc<Identifier>, GeorefError> {
        self.identifiers.item(
            index,
            || self.with_handle(|ctx, h| ctx.note(ctx.engine().identifier_count(h))),
            |i| {
                self.with_handle(|ctx, h| ctx.note(ctx.engine().identifier(h, i)))
                    .map(Rc::new)
            },
        )
    }

    pub fn identifiers(&self) -> Result<Vec<Rc<Identifier>>, GeorefError> {
        self.identifiers.force_all(
            || self.with_handle(|ctx, h| ctx.note(ctx.engine().identifier_count(h))),
            |i| {
                self.with_handle(|ctx, h| ctx.note(ctx.engine().identifier(h, i)))
                    .map(Rc::new)
            },
        )
    }
}

impl Drop for ObjectCore {
    fn drop(&mut self) {
        self.release();
    }
}

/// Fallback wrapper for handles whose discriminant matches nothing more
/// specific.
#[derive(Debug)]
pub struct GenericObject {
    core: ObjectCore,
}

impl GenericObject {
    pub(crate) fn new(ctx: &Rc<ContextInner>, handle: RawHandle) -> Result<Self, GeorefError> {
        Ok(GenericObject {
            core: ObjectCore::new(ctx, handle, "object")?,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }
}

crate::delegate_object_meta!(GenericObject);

/// Generates the metadata accessors every wrapper shares with its core.
/// `dispose` stays hand-written per wrapper: aggregates must release their
/// children first.
#[macro_export]
macro_rules! delegate_object_meta {
    ($ty:ty) => {
        impl $ty {
            pub fn object_id(&self) -> Result<Option<String>, $crate::error::GeorefError> {
                self.core().object_id()
            }

            pub fn name(&self) -> Result<Option<String>, $crate::error::GeorefError> {
                self.core().name()
            }

            pub fn definition(&self) -> Result<Option<String>, $crate::error::GeorefError> {
                self.core().definition()
            }

            pub fn scope(&self) -> Result<Option<String>, $crate::error::GeorefError> {
                self.core().scope()
            }

            pub fn identifier_count(&self) -> Result<usize, $crate::error::GeorefError> {
                self.core().identifier_count()
            }

            pub fn identifier(
                &self,
                index: usize,
            ) -> Result<std::rc::Rc<$crate::object::Identifier>, $crate::error::GeorefError> {
                self.core().identifier(index)
            }

            pub fn identifiers(
                &self,
            ) -> Result<Vec<std::rc::Rc<$crate::object::Identifier>>, $crate::error::GeorefError>
            {
                self.core().identifiers()
            }

            pub fn is_disposed(&self) -> bool {
                self.core().is_disposed()
            }
        }
    };
}
