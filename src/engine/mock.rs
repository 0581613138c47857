//! Scripted in-memory engine for tests.
//!
//! [`MockEngine`] keeps a table of [`MockObject`] templates keyed by handle
//! id. Child-producing calls (`step`, `ensemble_member`, `sub_crs`,
//! `list_item`) mint a fresh handle per call by cloning the template, the
//! way a native engine hands out a new pointer per lookup; the mint log lets
//! tests assert which children were ever materialized and how often each
//! handle was destroyed.
//!
//! Cloning a `MockEngine` shares its state, so a test can keep a probe
//! handle after moving the engine into a
//! [`Context`](crate::context::Context).

use crate::crs::AxisInfo;
use crate::engine::{GeodesyEngine, RankedCandidates};
use crate::error::GeorefError;
use crate::factory::{CoordinateSystemKind, ObjectKind};
use crate::object::Identifier;
use crate::types::{Coordinate, Direction, ListHandle, RankingOptions, RawHandle};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// What applying a mock operation to a coordinate does.
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// Offset x and y, leave z and t alone.
    Shift { dx: f64, dy: f64 },
    /// Coverage gap: succeed with a non-finite coordinate.
    NonFinite,
    /// Remote grid download failure, surfaced as
    /// [`GeorefError::RemoteResource`].
    NetworkError(String),
    /// Hard engine failure.
    Fail(String),
}

impl Default for ApplyOutcome {
    fn default() -> Self {
        ApplyOutcome::Shift { dx: 0.0, dy: 0.0 }
    }
}

/// Template for one engine object. Inserted templates keep their id;
/// child-producing calls clone them under fresh ids.
#[derive(Debug, Clone, Default)]
pub struct MockObject {
    kind: Option<ObjectKind>,
    name: Option<String>,
    id: Option<String>,
    definition: Option<String>,
    scope: Option<String>,
    cs_kind: Option<CoordinateSystemKind>,
    identifiers: Vec<Identifier>,
    axes: Vec<AxisInfo>,
    steps: Vec<u64>,
    members: Vec<u64>,
    sub_crs: Vec<u64>,
    grid_dependencies: usize,
    accuracy: Option<f64>,
    has_inverse: bool,
    apply: ApplyOutcome,
}

impl MockObject {
    pub fn of_kind(kind: ObjectKind) -> Self {
        MockObject {
            kind: Some(kind),
            has_inverse: true,
            ..MockObject::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    pub fn with_definition(mut self, definition: &str) -> Self {
        self.definition = Some(definition.to_owned());
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_owned());
        self
    }

    pub fn classified_as(mut self, cs_kind: CoordinateSystemKind) -> Self {
        self.cs_kind = Some(cs_kind);
        self
    }

    pub fn with_identifiers(mut self, identifiers: Vec<Identifier>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_axes(mut self, axes: Vec<AxisInfo>) -> Self {
        self.axes = axes;
        self
    }

    /// Step templates, by inserted id, in pipeline order.
    pub fn with_steps(mut self, steps: Vec<u64>) -> Self {
        self.steps = steps;
        self
    }

    /// Ensemble member templates, by inserted id.
    pub fn with_members(mut self, members: Vec<u64>) -> Self {
        self.members = members;
        self
    }

    /// Compound CRS component templates, by inserted id.
    pub fn with_sub_crs(mut self, sub_crs: Vec<u64>) -> Self {
        self.sub_crs = sub_crs;
        self
    }

    pub fn with_grid_dependencies(mut self, count: usize) -> Self {
        self.grid_dependencies = count;
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    pub fn applying(mut self, outcome: ApplyOutcome) -> Self {
        self.apply = outcome;
        self
    }
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    objects: HashMap<u64, MockObject>,
    lists: HashMap<u64, Vec<u64>>,
    definitions: HashMap<String, u64>,
    /// Queued `rank_candidates` results: manager template id plus candidate
    /// template ids, consumed front to back.
    rankings: VecDeque<(u64, Vec<u64>)>,
    /// Queued `suggest` answers; the last one repeats once the queue drains.
    suggestions: VecDeque<Option<usize>>,
    last_suggestion: Option<Option<usize>>,
    destroyed: HashMap<u64, usize>,
    destroyed_lists: usize,
    /// template id -> handles minted from it, in mint order
    minted: HashMap<u64, Vec<u64>>,
    /// minted id -> template id it was cloned from
    template_of: HashMap<u64, u64>,
    name_queries: HashMap<u64, usize>,
    step_count_queries: HashMap<u64, usize>,
    /// template-resolved ids of every operation handle passed to `apply`
    applied: Vec<u64>,
}

impl MockState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn object(&self, handle: &RawHandle) -> Result<&MockObject, GeorefError> {
        self.objects
            .get(&handle.value())
            .ok_or(GeorefError::Engine(format!(
                "unknown handle {}",
                handle.value()
            )))
    }

    fn mint(&mut self, template: u64) -> Result<u64, GeorefError> {
        let clone = self
            .objects
            .get(&template)
            .ok_or(GeorefError::Engine(format!("unknown template {template}")))?
            .clone();
        let id = self.fresh_id();
        self.objects.insert(id, clone);
        self.minted.entry(template).or_default().push(id);
        self.template_of.insert(id, template);
        Ok(id)
    }
}

/// Shared-state scripted engine. See the module docs.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine::default()
    }

    /// Register a template and return its handle id.
    pub fn insert(&self, object: MockObject) -> u64 {
        let mut state = self.state.lock();
        let id = state.fresh_id();
        state.objects.insert(id, object);
        id
    }

    /// Make `create_from_definition(definition)` resolve to a fresh clone of
    /// the given template.
    pub fn register_definition(&self, definition: &str, template: u64) {
        self.state
            .lock()
            .definitions
            .insert(definition.to_owned(), template);
    }

    /// Queue one `rank_candidates` result.
    pub fn script_ranking(&self, manager: u64, candidates: Vec<u64>) {
        self.state.lock().rankings.push_back((manager, candidates));
    }

    /// Queue `suggest` answers; once drained, the last queued answer
    /// repeats. Unscripted engines suggest index 0 of a non-empty list.
    pub fn script_suggestions(&self, answers: Vec<Option<usize>>) {
        self.state.lock().suggestions.extend(answers);
    }

    pub fn destroy_count(&self, id: u64) -> usize {
        self.state.lock().destroyed.get(&id).copied().unwrap_or(0)
    }

    pub fn destroyed_list_count(&self) -> usize {
        self.state.lock().destroyed_lists
    }

    /// Handles minted from a template, in mint order.
    pub fn minted_from(&self, template: u64) -> Vec<u64> {
        self.state
            .lock()
            .minted
            .get(&template)
            .cloned()
            .unwrap_or_default()
    }

    pub fn name_query_count(&self, id: u64) -> usize {
        self.state.lock().name_queries.get(&id).copied().unwrap_or(0)
    }

    pub fn step_count_queries(&self, id: u64) -> usize {
        self.state
            .lock()
            .step_count_queries
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    /// Every `apply` call so far, by the template id of the applied handle
    /// (minted handles resolve back to the template they were cloned from).
    pub fn applied(&self) -> Vec<u64> {
        self.state.lock().applied.clone()
    }
}

impl GeodesyEngine for MockEngine {
    fn destroy_handle(&self, handle: RawHandle) {
        let mut state = self.state.lock();
        *state.destroyed.entry(handle.value()).or_insert(0) += 1;
    }

    fn destroy_list(&self, list: ListHandle) {
        let mut state = self.state.lock();
        state.lists.remove(&list.value());
        state.destroyed_lists += 1;
    }

    fn create_from_definition(&self, definition: &str) -> Result<RawHandle, GeorefError> {
        let mut state = self.state.lock();
        let template = state
            .definitions
            .get(definition)
            .copied()
            .ok_or(GeorefError::Engine(format!(
                "unknown definition {definition:?}"
            )))?;
        state.mint(template).map(RawHandle::new)
    }

    fn object_kind(&self, handle: &RawHandle) -> Result<ObjectKind, GeorefError> {
        let state = self.state.lock();
        let object = state.object(handle)?;
        object
            .kind
            .ok_or(GeorefError::Engine("object has no kind".to_owned()))
    }

    fn classify_coordinate_system(&self, handle: &RawHandle) -> CoordinateSystemKind {
        self.state
            .lock()
            .objects
            .get(&handle.value())
            .and_then(|o| o.cs_kind)
            .unwrap_or(CoordinateSystemKind::Unknown)
    }

    fn declared_name(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError> {
        let mut state = self.state.lock();
        *state.name_queries.entry(handle.value()).or_insert(0) += 1;
        state.object(handle).map(|o| o.name.clone())
    }

    fn declared_id(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError> {
        self.state.lock().object(handle).map(|o| o.id.clone())
    }

    fn definition(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError> {
        self.state.lock().object(handle).map(|o| o.definition.clone())
    }

    fn scope(&self, handle: &RawHandle) -> Result<Option<String>, GeorefError> {
        self.state.lock().object(handle).map(|o| o.scope.clone())
    }

    fn identifier_count(&self, handle: &RawHandle) -> Result<usize, GeorefError> {
        self.state.lock().object(handle).map(|o| o.identifiers.len())
    }

    fn identifier(&self, handle: &RawHandle, index: usize) -> Result<Identifier, GeorefError> {
        let state = self.state.lock();
        state
            .object(handle)?
            .identifiers
            .get(index)
            .cloned()
            .ok_or(GeorefError::Engine(format!("no identifier {index}")))
    }

    fn axis_count(&self, handle: &RawHandle) -> Result<usize, GeorefError> {
        self.state.lock().object(handle).map(|o| o.axes.len())
    }

    fn axis(&self, handle: &RawHandle, index: usize) -> Result<AxisInfo, GeorefError> {
        let state = self.state.lock();
        state
            .object(handle)?
            .axes
            .get(index)
            .cloned()
            .ok_or(GeorefError::Engine(format!("no axis {index}")))
    }

    fn step_count(&self, handle: &RawHandle) -> Result<usize, GeorefError> {
        let mut state = self.state.lock();
        *state.step_count_queries.entry(handle.value()).or_insert(0) += 1;
        state.object(handle).map(|o| o.steps.len())
    }

    fn step(&self, handle: &RawHandle, index: usize) -> Result<RawHandle, GeorefError> {
        let mut state = self.state.lock();
        let template = state
            .object(handle)?
            .steps
            .get(index)
            .copied()
            .ok_or(GeorefError::Engine(format!("no step {index}")))?;
        state.mint(template).map(RawHandle::new)
    }

    fn ensemble_member_count(&self, handle: &RawHandle) -> Result<usize, GeorefError> {
        self.state.lock().object(handle).map(|o| o.members.len())
    }

    fn ensemble_member(
        &self,
        handle: &RawHandle,
        index: usize,
    ) -> Result<RawHandle, GeorefError> {
        let mut state = self.state.lock();
        let template = state
            .object(handle)?
            .members
            .get(index)
            .copied()
            .ok_or(GeorefError::Engine(format!("no member {index}")))?;
        state.mint(template).map(RawHandle::new)
    }

    fn sub_crs(&self, handle: &RawHandle, index: usize) -> Result<RawHandle, GeorefError> {
        let mut state = self.state.lock();
        let template = state
            .object(handle)?
            .sub_crs
            .get(index)
            .copied()
            .ok_or(GeorefError::Engine(format!("no component {index}")))?;
        state.mint(template).map(RawHandle::new)
    }

    fn grid_dependency_count(&self, handle: &RawHandle) -> Result<usize, GeorefError> {
        self.state.lock().object(handle).map(|o| o.grid_dependencies)
    }

    fn accuracy(&self, handle: &RawHandle) -> Result<Option<f64>, GeorefError> {
        self.state.lock().object(handle).map(|o| o.accuracy)
    }

    fn has_inverse(&self, handle: &RawHandle) -> Result<bool, GeorefError> {
        self.state.lock().object(handle).map(|o| o.has_inverse)
    }

    fn rank_candidates(
        &self,
        source: &RawHandle,
        target: &RawHandle,
        _options: &RankingOptions,
    ) -> Result<RankedCandidates, GeorefError> {
        let mut state = self.state.lock();
        state.object(source)?;
        state.object(target)?;
        let (manager_template, candidates) =
            state.rankings.pop_front().ok_or(GeorefError::Engine(
                "no candidate operations between these systems".to_owned(),
            ))?;
        let manager = state.mint(manager_template)?;
        let list = state.fresh_id();
        state.lists.insert(list, candidates);
        Ok(RankedCandidates {
            manager: RawHandle::new(manager),
            list: ListHandle::new(list),
        })
    }

    fn list_len(&self, list: &ListHandle) -> Result<usize, GeorefError> {
        self.state
            .lock()
            .lists
            .get(&list.value())
            .map(Vec::len)
            .ok_or(GeorefError::Engine(format!(
                "unknown list {}",
                list.value()
            )))
    }

    fn list_item(&self, list: &ListHandle, index: usize) -> Result<RawHandle, GeorefError> {
        let mut state = self.state.lock();
        let template = state
            .lists
            .get(&list.value())
            .and_then(|l| l.get(index))
            .copied()
            .ok_or(GeorefError::Engine(format!("no list item {index}")))?;
        state.mint(template).map(RawHandle::new)
    }

    fn suggest(
        &self,
        list: &ListHandle,
        _coordinate: Coordinate,
        _direction: Direction,
    ) -> Option<usize> {
        let mut state = self.state.lock();
        if let Some(answer) = state.suggestions.pop_front() {
            state.last_suggestion = Some(answer);
            return answer;
        }
        if let Some(answer) = state.last_suggestion {
            return answer;
        }
        match state.lists.get(&list.value()) {
            Some(candidates) if !candidates.is_empty() => Some(0),
            _ => None,
        }
    }

    fn apply(
        &self,
        operation: &RawHandle,
        coordinate: Coordinate,
        direction: Direction,
    ) -> Result<Coordinate, GeorefError> {
        let mut state = self.state.lock();
        let resolved = state
            .template_of
            .get(&operation.value())
            .copied()
            .unwrap_or(operation.value());
        state.applied.push(resolved);
        let sign = match direction {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        };
        match &state.object(operation)?.apply {
            ApplyOutcome::Shift { dx, dy } => Ok(Coordinate {
                x: coordinate.x + sign * dx,
                y: coordinate.y + sign * dy,
                ..coordinate
            }),
            ApplyOutcome::NonFinite => Ok(Coordinate::non_finite()),
            ApplyOutcome::NetworkError(message) => {
                Err(GeorefError::RemoteResource(message.clone()))
            }
            ApplyOutcome::Fail(message) => Err(GeorefError::Engine(message.clone())),
        }
    }
}
