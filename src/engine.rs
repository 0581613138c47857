//! The outbound contract with the external geodesy engine.
//!
//! Everything this crate does not do itself — projection math, database
//! lookups, grid file resolution, serialization — sits behind the
//! [`GeodesyEngine`] trait. The object model calls it synchronously on the
//! thread that owns the [`Context`](crate::context::Context); an engine
//! implementation is free to block.

pub mod mock;

use crate::crs::AxisInfo;
use crate::error::GeorefError;
use crate::factory::{CoordinateSystemKind, ObjectKind};
use crate::object::Identifier;
use crate::types::{Coordinate, Direction, ListHandle, RankingOptions, RawHandle};

/// Result of ranking candidate operations between two reference systems:
/// a handle for the aggregate "pipeline manager" object the engine builds,
/// plus the ordered candidate list itself. Both are owned by the caller.
#[derive(Debug)]
pub struct RankedCandidates {
    pub manager: RawHandle,
    pub list: ListHandle,
}

/// In-process contract with the geodesy engine.
///
/// Handle-creating methods (`create_from_definition`, `step`,
/// `ensemble_member`, `sub_crs`, `list_item`) transfer ownership of the
/// returned handle to the caller, which must eventually destroy it.
/// `apply` reports coverage failures as an `Ok` coordinate with a non-finite
/// x ordinate; hard failures (network and otherwise) come back as errors.
pub trait GeodesyEngine {
    /// Destroy a single object handle. Must tolerate being the last call
    /// made against the handle; it is never invoked twice for one handle.
    fn destroy_handle(&self, handle: RawHandle);

    /// Destroy a ranked candidate list.
    fn destroy_list(&self, list: ListHandle);

    /// Parse a definition (EPSG code, proj-string, WKT, ...) into a fresh
    /// object handle.
    fn create_from_definition(&self, definition: &str) -> Result<RawHandle, GeorefError>;

    /// Read the discriminant tag identifying the handle's concrete kind.
    fn object_kind(&self, handle: &RawHandle) -> Result<ObjectKind, GeorefError>;

    /// Secondary classifier consulted when `object_kind` reports `Unknown`.
    fn classify_coordinate_system(&self, handle: &RawHandle) -> CoordinateSystemKind;

    fn declared_name(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError>;
    fn declared_id(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError>;
    fn definition(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError>;
    fn scope(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError>;

    fn identifier_count(&self, handle: &RawHandle) -> Result<usize, GeorefError>;
    fn identifier(&self, handle: &RawHandle, index: usize) -> Result<Identifier, GeorefError>;

    fn axis_count(&self, handle: &RawHandle) -> Result<usize, GeorefError>;
    fn axis(&self, handle: &RawHandle, index: usize) -> Result<AxisInfo, GeorefError>;

    /// Number of steps of a concatenated operation.
    fn step_count(&self, handle: &RawHandle) -> Result<usize, GeorefError>;

    /// Fresh handle for one step of a concatenated operation.
    fn step(&self, handle: &RawHandle, index: usize) -> Result<RawHandle, GeorefError>;

    fn ensemble_member_count(&self, handle: &RawHandle) -> Result<usize, GeorefError>;
    fn ensemble_member(&self, handle: &RawHandle, index: usize)
        -> Result<RawHandle, GeorefError>;

    /// Fresh handle for a component of a compound CRS. Only indices 0 and 1
    /// are ever requested.
    fn sub_crs(&self, handle: &RawHandle, index: usize) -> Result<RawHandle, GeorefError>;

    /// How many external grid-shift datasets an operation depends on. Zero
    /// means the operation is applicable everywhere by construction.
    fn grid_dependency_count(&self, handle: &RawHandle) -> Result<usize, GeorefError>;

    /// Declared accuracy of an operation in meters, if known.
    fn accuracy(&self, handle: &RawHandle) -> Result<Option<f64>, GeorefError>;

    fn has_inverse(&self, handle: &RawHandle) -> Result<bool, GeorefError>;

    /// Rank candidate operations between two CRS handles, best first.
    fn rank_candidates(
        &self,
        source: &RawHandle,
        target: &RawHandle,
        options: &RankingOptions,
    ) -> Result<RankedCandidates, GeorefError>;

    fn list_len(&self, list: &ListHandle) -> Result<usize, GeorefError>;

    /// Fresh handle for one entry of a ranked candidate list.
    fn list_item(&self, list: &ListHandle, index: usize) -> Result<RawHandle, GeorefError>;

    /// Best candidate index for a coordinate and direction, or `None` when
    /// the ranker has no suggestion. Steering away from candidates that
    /// already failed for nearby inputs is the engine's business.
    fn suggest(
        &self,
        list: &ListHandle,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Option<usize>;

    /// Apply one operation to a coordinate.
    fn apply(
        &self,
        operation: &RawHandle,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError>;
}
