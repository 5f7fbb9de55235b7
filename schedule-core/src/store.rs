//! Per-domain async lifecycle state.
//!
//! Each domain owns a [`Slice`]: lifecycle flags plus a normalized
//! collection. Flags move Idle → Pending → Fulfilled | Rejected and stay
//! there until the next dispatch or an explicit [`Slice::clear_status`].
//! Duplicate dispatches are neither merged nor cancelled; what happens to
//! a response that arrives after a newer dispatch depends on the slice's
//! [`SupersessionPolicy`].

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{
    Appointment, ClinicalNote, Document, Entity, LabResult, Medication, Meeting, Patient, Vital,
};

/// The `{loading, error, success}` triple.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleFlags {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

impl LifecycleFlags {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Pending
        } else if self.error.is_some() {
            Phase::Rejected
        } else if self.success {
            Phase::Fulfilled
        } else {
            Phase::Idle
        }
    }
}

/// Which response wins when dispatches overlap.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupersessionPolicy {
    /// Every response is applied; the last one to resolve wins.
    #[default]
    LastResolved,
    /// Only the response of the most recent dispatch is applied.
    LatestDispatched,
}

/// A dispatch and the part of the slice it writes to.
///
/// Under [`SupersessionPolicy::LatestDispatched`] only dispatches with an
/// equal `Operation` supersede each other. Creates never do: each one adds
/// its own record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch(Scope),
    Create,
    Update(String),
    Delete(String),
}

/// Handed out by [`Slice::begin`]; identifies one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: u64,
}

/// Which part of a collection a fetch refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Patient(String),
}

/// Normalized storage behind a slice.
pub trait Collection: Default + Debug {
    type Item: Entity;

    /// Replaces the part of the collection covered by `scope`.
    fn replace(&mut self, scope: &Scope, items: Vec<Self::Item>);
    /// Appends a newly created record.
    fn insert(&mut self, item: Self::Item);
    /// Swaps the record with the same id in place. False when absent.
    fn update(&mut self, item: Self::Item) -> bool;
    fn remove(&mut self, id: &str) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered records, refetched wholesale.
#[derive(Debug, Clone)]
pub struct EntityList<E> {
    items: Vec<E>,
}

impl<E> Default for EntityList<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E: Entity> EntityList<E> {
    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }
}

impl<E: Entity + Debug> Collection for EntityList<E> {
    type Item = E;

    fn replace(&mut self, _scope: &Scope, items: Vec<E>) {
        self.items = items;
    }

    fn insert(&mut self, item: E) {
        self.items.push(item);
    }

    fn update(&mut self, item: E) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Records grouped by owning patient.
#[derive(Debug, Clone)]
pub struct PatientIndex<E> {
    by_patient: BTreeMap<String, Vec<E>>,
}

impl<E> Default for PatientIndex<E> {
    fn default() -> Self {
        Self {
            by_patient: BTreeMap::new(),
        }
    }
}

impl<E: Entity> PatientIndex<E> {
    pub fn for_patient(&self, patient_id: &str) -> &[E] {
        self.by_patient
            .get(patient_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn patients(&self) -> impl Iterator<Item = &str> {
        self.by_patient.keys().map(String::as_str)
    }

    fn push(&mut self, item: E) {
        match item.patient_id() {
            Some(owner) => self.by_patient.entry(owner.to_string()).or_default().push(item),
            None => warn!(id = item.id(), "record without patient id was not indexed"),
        }
    }
}

impl<E: Entity + Debug> Collection for PatientIndex<E> {
    type Item = E;

    fn replace(&mut self, scope: &Scope, items: Vec<E>) {
        match scope {
            Scope::All => {
                self.by_patient.clear();
                for item in items {
                    self.push(item);
                }
            }
            Scope::Patient(patient_id) => {
                let (own, foreign): (Vec<E>, Vec<E>) = items
                    .into_iter()
                    .partition(|item| item.patient_id() == Some(patient_id.as_str()));
                if !foreign.is_empty() {
                    debug!(
                        patient_id = patient_id.as_str(),
                        dropped = foreign.len(),
                        "ignoring records of other patients"
                    );
                }
                self.by_patient.insert(patient_id.clone(), own);
            }
        }
    }

    fn insert(&mut self, item: E) {
        self.push(item);
    }

    fn update(&mut self, item: E) -> bool {
        let previous_owner = self
            .by_patient
            .iter()
            .find(|(_, items)| items.iter().any(|existing| existing.id() == item.id()))
            .map(|(owner, _)| owner.clone());
        let Some(previous_owner) = previous_owner else {
            return false;
        };

        if item.patient_id() == Some(previous_owner.as_str()) {
            if let Some(slot) = self
                .by_patient
                .get_mut(&previous_owner)
                .and_then(|items| items.iter_mut().find(|existing| existing.id() == item.id()))
            {
                *slot = item;
            }
        } else {
            self.remove(item.id());
            self.push(item);
        }
        true
    }

    fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for items in self.by_patient.values_mut() {
            let before = items.len();
            items.retain(|item| item.id() != id);
            removed |= items.len() != before;
        }
        removed
    }

    fn len(&self) -> usize {
        self.by_patient.values().map(Vec::len).sum()
    }
}

/// Lifecycle flags and data of one domain.
#[derive(Debug)]
pub struct Slice<C> {
    flags: LifecycleFlags,
    data: C,
    policy: SupersessionPolicy,
    generations: HashMap<Operation, u64>,
}

impl<C: Default> Default for Slice<C> {
    fn default() -> Self {
        Self::with_policy(SupersessionPolicy::default())
    }
}

impl<C: Default> Slice<C> {
    pub fn with_policy(policy: SupersessionPolicy) -> Self {
        Self {
            flags: LifecycleFlags::default(),
            data: C::default(),
            policy,
            generations: HashMap::new(),
        }
    }
}

impl<C> Slice<C> {
    pub fn flags(&self) -> &LifecycleFlags {
        &self.flags
    }

    pub fn data(&self) -> &C {
        &self.data
    }

    pub fn policy(&self) -> SupersessionPolicy {
        self.policy
    }

    /// Marks a dispatch as pending.
    pub fn begin(&mut self, operation: Operation) -> Ticket {
        let counter = self.generations.entry(operation.clone()).or_insert(0);
        *counter += 1;
        let generation = *counter;
        self.flags = LifecycleFlags {
            loading: true,
            error: None,
            success: false,
        };
        Ticket {
            operation,
            generation,
        }
    }

    fn accepts(&self, ticket: &Ticket) -> bool {
        match (self.policy, &ticket.operation) {
            (SupersessionPolicy::LastResolved, _) | (_, Operation::Create) => true,
            (SupersessionPolicy::LatestDispatched, operation) => {
                self.generations.get(operation) == Some(&ticket.generation)
            }
        }
    }

    /// Applies a successful response. Returns false when it was discarded
    /// as stale.
    pub fn fulfill(&mut self, ticket: &Ticket, reduce: impl FnOnce(&mut C)) -> bool {
        if !self.accepts(ticket) {
            debug!(?ticket, "discarding stale response");
            return false;
        }
        reduce(&mut self.data);
        self.flags = LifecycleFlags {
            loading: false,
            error: None,
            success: true,
        };
        true
    }

    pub fn reject(&mut self, ticket: &Ticket, message: impl Into<String>) -> bool {
        if !self.accepts(ticket) {
            debug!(?ticket, "discarding stale failure");
            return false;
        }
        self.flags = LifecycleFlags {
            loading: false,
            error: Some(message.into()),
            success: false,
        };
        true
    }

    /// Back to Idle; the data is kept.
    pub fn clear_status(&mut self) {
        self.flags = LifecycleFlags::default();
    }
}

/// Application store, one slice per domain.
#[derive(Debug, Default)]
pub struct AppState {
    pub appointments: Slice<EntityList<Appointment>>,
    pub patients: Slice<EntityList<Patient>>,
    pub vitals: Slice<PatientIndex<Vital>>,
    pub lab_results: Slice<PatientIndex<LabResult>>,
    pub medications: Slice<PatientIndex<Medication>>,
    pub clinical_notes: Slice<PatientIndex<ClinicalNote>>,
    pub documents: Slice<PatientIndex<Document>>,
    pub meetings: Slice<EntityList<Meeting>>,
}

impl AppState {
    pub fn with_policy(policy: SupersessionPolicy) -> Self {
        Self {
            appointments: Slice::with_policy(policy),
            patients: Slice::with_policy(policy),
            vitals: Slice::with_policy(policy),
            lab_results: Slice::with_policy(policy),
            medications: Slice::with_policy(policy),
            clinical_notes: Slice::with_policy(policy),
            documents: Slice::with_policy(policy),
            meetings: Slice::with_policy(policy),
        }
    }
}

/// A record type served by the API and kept in the store.
pub trait Resource: Entity + Clone + Debug + Serialize + DeserializeOwned + Send + 'static {
    type Collection: Collection<Item = Self> + Send;

    /// REST path segment, e.g. `lab-results`.
    const PATH: &'static str;
    /// Envelope key of list responses.
    const COLLECTION_KEY: &'static str;
    /// Envelope key of single-record responses.
    const ITEM_KEY: &'static str;

    fn slice(state: &AppState) -> &Slice<Self::Collection>;
    fn slice_mut(state: &mut AppState) -> &mut Slice<Self::Collection>;
}

macro_rules! resource {
    ($record:ty, $collection:ident, $field:ident, $path:literal, $many:literal, $one:literal) => {
        impl Resource for $record {
            type Collection = $collection<$record>;

            const PATH: &'static str = $path;
            const COLLECTION_KEY: &'static str = $many;
            const ITEM_KEY: &'static str = $one;

            fn slice(state: &AppState) -> &Slice<Self::Collection> {
                &state.$field
            }

            fn slice_mut(state: &mut AppState) -> &mut Slice<Self::Collection> {
                &mut state.$field
            }
        }
    };
}

resource!(Appointment, EntityList, appointments, "appointments", "appointments", "appointment");
resource!(Patient, EntityList, patients, "patients", "patients", "patient");
resource!(Vital, PatientIndex, vitals, "vitals", "vitals", "vital");
resource!(LabResult, PatientIndex, lab_results, "lab-results", "labResults", "labResult");
resource!(Medication, PatientIndex, medications, "medications", "medications", "medication");
resource!(ClinicalNote, PatientIndex, clinical_notes, "clinical-notes", "notes", "note");
resource!(Document, PatientIndex, documents, "documents", "documents", "document");
resource!(Meeting, EntityList, meetings, "meetings", "meetings", "meeting");

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: &'static str,
        owner: &'static str,
        body: &'static str,
    }

    impl Entity for Note {
        fn id(&self) -> &str {
            self.id
        }

        fn patient_id(&self) -> Option<&str> {
            Some(self.owner)
        }
    }

    fn note(id: &'static str, owner: &'static str, body: &'static str) -> Note {
        Note { id, owner, body }
    }

    #[test]
    fn fresh_slice_is_idle() {
        let slice: Slice<EntityList<Note>> = Slice::default();
        assert_eq!(slice.flags().phase(), Phase::Idle);
        assert!(slice.data().is_empty());
    }

    #[test]
    fn pending_then_fulfilled() {
        let mut slice: Slice<EntityList<Note>> = Slice::default();
        let ticket = slice.begin(Operation::Fetch(Scope::All));
        assert_eq!(
            slice.flags(),
            &LifecycleFlags {
                loading: true,
                error: None,
                success: false
            }
        );

        assert!(slice.fulfill(&ticket, |list| list.replace(&Scope::All, vec![note("1", "p", "a")])));
        assert_eq!(slice.flags().phase(), Phase::Fulfilled);
        assert_eq!(slice.data().len(), 1);
    }

    #[test]
    fn rejection_is_sticky_until_cleared() {
        let mut slice: Slice<EntityList<Note>> = Slice::default();
        let ticket = slice.begin(Operation::Fetch(Scope::All));
        slice.reject(&ticket, "Patient not found");
        assert_eq!(slice.flags().error.as_deref(), Some("Patient not found"));
        assert!(!slice.flags().loading);
        assert_eq!(slice.flags().phase(), Phase::Rejected);

        slice.clear_status();
        assert_eq!(slice.flags(), &LifecycleFlags::default());
    }

    #[test]
    fn new_dispatch_clears_previous_error() {
        let mut slice: Slice<EntityList<Note>> = Slice::default();
        let ticket = slice.begin(Operation::Fetch(Scope::All));
        slice.reject(&ticket, "boom");
        slice.begin(Operation::Fetch(Scope::All));
        assert!(slice.flags().loading);
        assert!(slice.flags().error.is_none());
    }

    #[test]
    fn last_resolved_wins_by_default() {
        let mut slice: Slice<EntityList<Note>> = Slice::default();
        let first = slice.begin(Operation::Fetch(Scope::All));
        let second = slice.begin(Operation::Fetch(Scope::All));

        assert!(slice.fulfill(&second, |list| list.replace(&Scope::All, vec![note("new", "p", "")])));
        assert!(slice.fulfill(&first, |list| list.replace(&Scope::All, vec![note("old", "p", "")])));

        assert_eq!(slice.data().items()[0].id, "old");
    }

    #[test]
    fn latest_dispatched_discards_stale_responses() {
        let mut slice: Slice<EntityList<Note>> =
            Slice::with_policy(SupersessionPolicy::LatestDispatched);
        let first = slice.begin(Operation::Fetch(Scope::All));
        let second = slice.begin(Operation::Fetch(Scope::All));

        assert!(!slice.fulfill(&first, |list| list.replace(&Scope::All, vec![note("old", "p", "")])));
        assert!(slice.flags().loading);
        assert!(slice.data().is_empty());

        assert!(slice.fulfill(&second, |list| list.replace(&Scope::All, vec![note("new", "p", "")])));
        assert!(!slice.reject(&first, "late failure"));
        assert_eq!(slice.data().items()[0].id, "new");
        assert_eq!(slice.flags().phase(), Phase::Fulfilled);
    }

    #[test]
    fn generations_are_per_operation() {
        let mut slice: Slice<EntityList<Note>> =
            Slice::with_policy(SupersessionPolicy::LatestDispatched);
        let fetch = slice.begin(Operation::Fetch(Scope::All));
        let create = slice.begin(Operation::Create);
        assert!(slice.fulfill(&create, |list| list.insert(note("1", "p", ""))));
        assert!(slice.fulfill(&fetch, |_| {}));
    }

    #[test]
    fn overlapping_creates_are_all_kept() {
        let mut slice: Slice<EntityList<Note>> =
            Slice::with_policy(SupersessionPolicy::LatestDispatched);
        let first = slice.begin(Operation::Create);
        let second = slice.begin(Operation::Create);

        assert!(slice.fulfill(&second, |list| list.insert(note("2", "p", ""))));
        assert!(slice.fulfill(&first, |list| list.insert(note("1", "p", ""))));
        assert_eq!(slice.data().len(), 2);
    }

    #[test]
    fn fetches_of_different_patients_do_not_supersede() {
        let mut slice: Slice<PatientIndex<Note>> =
            Slice::with_policy(SupersessionPolicy::LatestDispatched);
        let alice = Scope::Patient("alice".into());
        let bob = Scope::Patient("bob".into());
        let for_alice = slice.begin(Operation::Fetch(alice.clone()));
        let stale_bob = slice.begin(Operation::Fetch(bob.clone()));
        let for_bob = slice.begin(Operation::Fetch(bob.clone()));

        assert!(slice.fulfill(&for_bob, |index| index.replace(&bob, vec![note("b", "bob", "")])));
        assert!(!slice.fulfill(&stale_bob, |index| index.replace(&bob, Vec::new())));
        assert!(slice.fulfill(&for_alice, |index| index.replace(&alice, vec![note("a", "alice", "")])));

        assert_eq!(slice.data().for_patient("alice").len(), 1);
        assert_eq!(slice.data().for_patient("bob").len(), 1);
    }

    #[test]
    fn updates_supersede_per_record() {
        let mut slice: Slice<EntityList<Note>> =
            Slice::with_policy(SupersessionPolicy::LatestDispatched);
        slice.data.insert(note("1", "p", "a"));
        slice.data.insert(note("2", "p", "b"));
        let old_edit = slice.begin(Operation::Update("1".into()));
        let other = slice.begin(Operation::Update("2".into()));
        let new_edit = slice.begin(Operation::Update("1".into()));

        assert!(slice.fulfill(&new_edit, |list| {
            list.update(note("1", "p", "new"));
        }));
        assert!(slice.fulfill(&other, |list| {
            list.update(note("2", "p", "other"));
        }));
        assert!(!slice.fulfill(&old_edit, |list| {
            list.update(note("1", "p", "old"));
        }));

        let bodies: Vec<_> = slice.data().items().iter().map(|n| n.body).collect();
        assert_eq!(bodies, ["new", "other"]);
    }

    #[test]
    fn list_upserts() {
        let mut list = EntityList::default();
        list.replace(&Scope::All, vec![note("1", "p", "a"), note("2", "p", "b")]);
        list.insert(note("3", "p", "c"));
        assert!(list.update(note("2", "p", "edited")));
        assert!(!list.update(note("9", "p", "missing")));
        assert!(list.remove("1"));
        assert!(!list.remove("1"));

        let bodies: Vec<_> = list.items().iter().map(|n| n.body).collect();
        assert_eq!(bodies, ["edited", "c"]);
        assert_eq!(list.get("3").map(|n| n.body), Some("c"));
    }

    #[test]
    fn patient_fetch_replaces_only_that_patient() {
        let mut index = PatientIndex::default();
        index.replace(
            &Scope::All,
            vec![note("1", "alice", "a"), note("2", "bob", "b")],
        );
        index.replace(&Scope::Patient("alice".into()), vec![note("3", "alice", "c")]);

        assert_eq!(index.for_patient("alice"), &[note("3", "alice", "c")]);
        assert_eq!(index.for_patient("bob").len(), 1);
        assert!(index.for_patient("carol").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn patient_fetch_with_no_results_is_an_empty_list() {
        let mut index: PatientIndex<Note> = PatientIndex::default();
        index.replace(&Scope::Patient("alice".into()), Vec::new());
        assert!(index.for_patient("alice").is_empty());
        assert_eq!(index.patients().collect::<Vec<_>>(), ["alice"]);
    }

    #[test]
    fn index_update_moves_between_patients() {
        let mut index = PatientIndex::default();
        index.insert(note("1", "alice", "a"));
        assert!(index.update(note("1", "bob", "moved")));
        assert!(index.for_patient("alice").is_empty());
        assert_eq!(index.for_patient("bob")[0].body, "moved");

        assert!(index.update(note("1", "bob", "edited")));
        assert_eq!(index.for_patient("bob")[0].body, "edited");
        assert!(index.remove("1"));
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn policy_applies_to_every_slice() {
        let state = AppState::with_policy(SupersessionPolicy::LatestDispatched);
        assert_eq!(state.appointments.policy(), SupersessionPolicy::LatestDispatched);
        assert_eq!(Vital::slice(&state).policy(), SupersessionPolicy::LatestDispatched);
        assert_eq!(<LabResult as Resource>::PATH, "lab-results");
    }
}
