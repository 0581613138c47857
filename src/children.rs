//! On-demand, cached construction of children from an indexable opaque
//! collection.
//!
//! Pipelines, coordinate-system axes and identifier lists all follow the
//! same shape: the element count is fetched from the engine once and never
//! re-queried, and each slot is built at most once, on first access.
//! [`LazyList`] carries that shared bookkeeping; the owning wrapper supplies
//! the count and element fetchers per call, so the cache itself holds no
//! engine state.

use crate::error::GeorefError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug)]
pub struct LazyList<T> {
    count: Cell<Option<usize>>,
    slots: RefCell<Vec<Option<Rc<T>>>>,
}

impl<T> LazyList<T> {
    pub fn new() -> Self {
        LazyList {
            count: Cell::new(None),
            slots: RefCell::new(Vec::new()),
        }
    }

    /// Element count, fetched through `fetch` on first call and cached. A
    /// count of zero yields a permanently empty list.
    pub fn count(
        &self,
        fetch: impl FnOnce() -> Result<usize, GeorefError>,
    ) -> Result<usize, GeorefError> {
        if let Some(n) = self.count.get() {
            return Ok(n);
        }
        let n = fetch()?;
        self.count.set(Some(n));
        self.slots.borrow_mut().resize_with(n, || None);
        Ok(n)
    }

    /// Element at `index`, building it through `build` on first access.
    /// Subsequent calls return the same instance.
    pub fn item(
        &self,
        index: usize,
        fetch_count: impl FnOnce() -> Result<usize, GeorefError>,
        build: impl FnOnce(usize) -> Result<Rc<T>, GeorefError>,
    ) -> Result<Rc<T>, GeorefError> {
        let count = self.count(fetch_count)?;
        if index >= count {
            return Err(GeorefError::IndexOutOfRange { index, count });
        }
        if let Some(existing) = &self.slots.borrow()[index] {
            return Ok(Rc::clone(existing));
        }
        let built = build(index)?;
        self.slots.borrow_mut()[index] = Some(Rc::clone(&built));
        Ok(built)
    }

    /// All elements in insertion order, forcing construction of every slot
    /// not yet built.
    pub fn force_all(
        &self,
        fetch_count: impl FnOnce() -> Result<usize, GeorefError>,
        mut build: impl FnMut(usize) -> Result<Rc<T>, GeorefError>,
    ) -> Result<Vec<Rc<T>>, GeorefError> {
        let count = self.count(fetch_count)?;
        let mut out = Vec::with_capacity(count);
        for index in 0..count {
            let cached = self.slots.borrow()[index].as_ref().map(Rc::clone);
            let item = match cached {
                Some(item) => item,
                None => {
                    let built = build(index)?;
                    self.slots.borrow_mut()[index] = Some(Rc::clone(&built));
                    built
                }
            };
            out.push(item);
        }
        Ok(out)
    }

    /// Only the elements that have been built so far. Disposal walks this,
    /// never forcing construction of untouched slots.
    pub fn materialized(&self) -> Vec<Rc<T>> {
        self.slots
            .borrow()
            .iter()
            .flatten()
            .map(Rc::clone)
            .collect()
    }

    pub fn cached_count(&self) -> Option<usize> {
        self.count.get()
    }
}

impl<T> Default for LazyList<T> {
    fn default() -> Self {
        Self::new()
    }
}
