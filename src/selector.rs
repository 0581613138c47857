//! Candidate selection over a ranked operation list.
//!
//! A [`ChooseOperation`] owns everything one transform request produced: the
//! engine's aggregate manager object, the ranked candidate list, and every
//! candidate wrapper built from it. Per coordinate it asks the engine for
//! its best candidate, applies it, and falls back when the point turns out
//! to sit in a coverage gap: first by retrying the ranker a bounded number
//! of times, then by applying the first candidate with no grid dependencies
//! at all. Declared areas of use are coarse rectangles while grid-shift
//! datasets have internal gaps, so a point can pass the ranker yet miss
//! every actual sub-grid; the grid-free fallback trades accuracy for
//! guaranteed forward progress.

use crate::config::TransformConfig;
use crate::context::ContextInner;
use crate::engine::RankedCandidates;
use crate::error::GeorefError;
use crate::factory::{self, ObjectKind, ProjObject};
use crate::object::ObjectCore;
use crate::types::{Coordinate, Direction, ListHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

/// Synthetic name given to the aggregate; its manager handle is shared with
/// the engine and is never queried for metadata.
const CHOOSER_NAME: &str = "<choose-coordinate-transform>";

/// Aggregate over the ranked candidate operations between two reference
/// systems.
///
/// Owns the list resource and every candidate; disposing the aggregate
/// disposes all of them exactly once. Candidates are built eagerly: the
/// ranker already paid for them, and the per-coordinate hot path must not
/// allocate wrappers.
pub struct ChooseOperation {
    core: ObjectCore,
    list: RefCell<Option<ListHandle>>,
    candidates: Vec<ProjObject>,
    /// Last candidate actually applied, compared by identity to avoid
    /// logging the same selection for every coordinate in a run.
    last: RefCell<Option<ProjObject>>,
    last_index: Cell<Option<usize>>,
    selection_changes: Cell<usize>,
    max_retries: usize,
}

impl ChooseOperation {
    pub(crate) fn new_ranked(
        ctx: &Rc<ContextInner>,
        source: &ProjObject,
        target: &ProjObject,
        options: &TransformConfig,
    ) -> Result<Self, GeorefError> {
        if !source.is_crs() {
            return Err(GeorefError::InvalidArgument("source"));
        }
        if !target.is_crs() {
            return Err(GeorefError::InvalidArgument("target"));
        }
        let RankedCandidates { manager, list } = source.core().with_handle(|inner, sh| {
            target.core().with_handle(|_, th| {
                inner.note(inner.engine().rank_candidates(sh, th, &options.ranking))
            })
        })?;

        let core = match ObjectCore::new(ctx, manager, "coordinate transform chooser") {
            Ok(core) => core,
            Err(err) => {
                ctx.engine().destroy_list(list);
                return Err(err);
            }
        };
        // The manager handle belongs to the engine's aggregate machinery;
        // metadata queries against it are not supported, so seed the cache
        // instead of ever fetching.
        core.force_unknown_info();
        core.set_name(CHOOSER_NAME);

        let candidates = match collect_candidates(ctx, &list) {
            Ok(candidates) => candidates,
            Err(err) => {
                // `core` and any built candidates release through their
                // drop safety nets; the list is ours to destroy.
                ctx.engine().destroy_list(list);
                return Err(err);
            }
        };

        Ok(ChooseOperation {
            core,
            list: RefCell::new(Some(list)),
            candidates,
            last: RefCell::new(None),
            last_index: Cell::new(None),
            selection_changes: Cell::new(0),
            max_retries: options.max_retries,
        })
    }

    pub(crate) fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// The local-only discriminant used to label this wrapper shape.
    pub fn kind(&self) -> ObjectKind {
        ObjectKind::ChooseTransform
    }

    pub fn count(&self) -> usize {
        self.candidates.len()
    }

    /// Candidate at `index` in ranked order.
    pub fn candidate(&self, index: usize) -> Result<ProjObject, GeorefError> {
        self.candidates
            .get(index)
            .cloned()
            .ok_or(GeorefError::IndexOutOfRange {
                index,
                count: self.candidates.len(),
            })
    }

    /// Index of the last candidate applied by a transform call.
    pub fn last_selected(&self) -> Option<usize> {
        self.last_index.get()
    }

    /// How many times the applied candidate has changed across the
    /// aggregate's lifetime. One diagnostic event is emitted per change.
    pub fn selection_changes(&self) -> usize {
        self.selection_changes.get()
    }

    /// The candidate the ranker would pick for this coordinate, without
    /// applying anything or touching the selection memo. Diagnostics only.
    pub fn suggested_operation(
        &self,
        coordinate: Coordinate,
    ) -> Result<Option<ProjObject>, GeorefError> {
        let ctx = self.core.context()?;
        let guard = self.list.borrow();
        let list = guard.as_ref().ok_or(GeorefError::DisposedAccess {
            kind: self.core.resource_kind(),
        })?;
        match ctx.engine().suggest(list, coordinate, Direction::Forward) {
            Some(index) => self.candidate(index).map(Some),
            None => Ok(None),
        }
    }

    /// Transform one coordinate.
    ///
    /// Suggest-apply-retry with a bounded exclusion budget, then the
    /// grid-free fallback. A remote-resource failure during application
    /// signals an unrecoverable dependency, not a coverage gap, and
    /// propagates immediately without any fallback attempt.
    pub fn transform(
        &self,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError> {
        let ctx = self.core.context()?;
        let mut excluded = 0usize;

        for attempt in 0..=self.max_retries {
            let suggested = {
                let guard = self.list.borrow();
                let list = guard.as_ref().ok_or(GeorefError::DisposedAccess {
                    kind: self.core.resource_kind(),
                })?;
                ctx.engine().suggest(list, coordinate, direction)
            };
            let Some(index) = suggested else {
                break;
            };
            let candidate = self.candidates.get(index).ok_or(
                GeorefError::InvariantViolation("ranker suggested an index outside the list"),
            )?;
            self.note_selection(index, candidate);
            // Distinguish "no usable result" from a failure recorded by an
            // earlier call.
            ctx.clear_error();
            match apply_candidate(candidate, coordinate, direction) {
                Ok(out) if out.is_finite() => return Ok(out),
                Ok(_) => {}
                Err(err @ GeorefError::RemoteResource(_)) => return Err(err),
                Err(_) => {}
            }
            if attempt == self.max_retries {
                break;
            }
            excluded += 1;
            debug!(
                candidate = index,
                attempt, "candidate produced no usable result, asking ranker again"
            );
        }

        self.grid_free_fallback(coordinate, direction, excluded)
    }

    /// Transform a batch in place.
    ///
    /// The bulk variant keeps no exclusion budget: when the suggested
    /// candidate fails for a coordinate, every candidate is tried in ranked
    /// order before the grid-free fallback.
    pub fn transform_bulk(
        &self,
        coordinates: &mut [Coordinate],
        direction: Direction,
    ) -> Result<(), GeorefError> {
        for coordinate in coordinates.iter_mut() {
            *coordinate = self.transform_scanning(*coordinate, direction)?;
        }
        Ok(())
    }

    fn transform_scanning(
        &self,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError> {
        let ctx = self.core.context()?;
        let suggested = {
            let guard = self.list.borrow();
            let list = guard.as_ref().ok_or(GeorefError::DisposedAccess {
                kind: self.core.resource_kind(),
            })?;
            ctx.engine().suggest(list, coordinate, direction)
        };
        if let Some(index) = suggested {
            let candidate = self.candidates.get(index).ok_or(
                GeorefError::InvariantViolation("ranker suggested an index outside the list"),
            )?;
            ctx.clear_error();
            match apply_candidate(candidate, coordinate, direction) {
                Ok(out) if out.is_finite() => {
                    self.note_selection(index, candidate);
                    return Ok(out);
                }
                Ok(_) => {}
                Err(err @ GeorefError::RemoteResource(_)) => return Err(err),
                Err(_) => {}
            }
        }

        for (index, candidate) in self.candidates.iter().enumerate() {
            match apply_candidate(candidate, coordinate, direction) {
                Ok(out) if out.is_finite() => {
                    self.note_selection(index, candidate);
                    return Ok(out);
                }
                Ok(_) => {}
                Err(err @ GeorefError::RemoteResource(_)) => return Err(err),
                Err(_) => {}
            }
        }

        self.grid_free_fallback(coordinate, direction, 0)
    }

    /// Apply the first candidate with no grid dependencies and return its
    /// result unconditionally: a zero-dependency candidate is applicable
    /// everywhere by construction, so even a non-finite result is final.
    fn grid_free_fallback(
        &self,
        coordinate: Coordinate,
        direction: Direction,
        excluded: usize,
    ) -> Result<Coordinate, GeorefError> {
        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate_grid_dependencies(candidate)? > 0 {
                continue;
            }
            self.note_selection(index, candidate);
            warn!(
                candidate = index,
                "no grid-backed candidate covered the coordinate, using grid-free fallback"
            );
            return apply_candidate(candidate, coordinate, direction);
        }
        Err(GeorefError::NoUsableOperation {
            last_selected: self.last_index.get(),
            excluded,
        })
    }

    fn note_selection(&self, index: usize, candidate: &ProjObject) {
        let unchanged = self
            .last
            .borrow()
            .as_ref()
            .map_or(false, |prev| std::ptr::eq(prev.core(), candidate.core()));
        if unchanged {
            return;
        }
        debug!(candidate = index, "using candidate operation");
        self.selection_changes.set(self.selection_changes.get() + 1);
        *self.last.borrow_mut() = Some(candidate.clone());
        self.last_index.set(Some(index));
    }

    /// Destroys the candidate list, every candidate, and the manager
    /// handle, each exactly once. Idempotent.
    pub fn dispose(&self) {
        if let Some(list) = self.list.borrow_mut().take() {
            if let Some(ctx) = self.core.context_opt() {
                ctx.engine().destroy_list(list);
            }
        }
        for candidate in &self.candidates {
            candidate.dispose();
        }
        self.core.dispose();
    }
}

crate::delegate_object_meta!(ChooseOperation);

impl Drop for ChooseOperation {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn collect_candidates(
    ctx: &Rc<ContextInner>,
    list: &ListHandle,
) -> Result<Vec<ProjObject>, GeorefError> {
    let len = ctx.note(ctx.engine().list_len(list))?;
    let mut candidates = Vec::with_capacity(len);
    for index in 0..len {
        let handle = ctx.note(ctx.engine().list_item(list, index))?;
        match factory::materialize(ctx, handle)? {
            op @ (ProjObject::Operation(_) | ProjObject::Pipeline(_)) => candidates.push(op),
            other => {
                other.dispose();
                return Err(GeorefError::InvariantViolation(
                    "ranked candidate was neither an operation nor a pipeline",
                ));
            }
        }
    }
    Ok(candidates)
}

fn apply_candidate(
    candidate: &ProjObject,
    coordinate: Coordinate,
    direction: Direction,
) -> Result<Coordinate, GeorefError> {
    match candidate {
        ProjObject::Operation(op) => op.apply(coordinate, direction),
        ProjObject::Pipeline(pipeline) => pipeline.apply(coordinate, direction),
        _ => Err(GeorefError::InvariantViolation(
            "candidate list held a non-operation wrapper",
        )),
    }
}

fn candidate_grid_dependencies(candidate: &ProjObject) -> Result<usize, GeorefError> {
    match candidate {
        ProjObject::Operation(op) => op.grid_dependency_count(),
        ProjObject::Pipeline(pipeline) => pipeline.grid_dependency_count(),
        _ => Err(GeorefError::InvariantViolation(
            "candidate list held a non-operation wrapper",
        )),
    }
}
