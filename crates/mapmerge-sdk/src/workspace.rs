use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use mapmerge_diff::{diff_element, ElementDiff};
use mapmerge_merge::{resolve_with_diff, MergeOutcome};
use mapmerge_resolve::{ChoiceSet, InMemoryResolutionStore, ResolutionStore};
use mapmerge_status::{aggregate, classify_element, tally, AggregateStatus, ConflictTally, ElementStatus};
use mapmerge_types::{
    ConflictElement, ElementAction, ElementId, ResolutionChoice, Side, SubmissionId, TypeError,
};
use tracing::{debug, info, warn};

use crate::collab::{ElementSource, MergeSink, SubmitReceipt};
use crate::config::ReconcileConfig;
use crate::error::{SdkError, SdkResult};

/// Memo key. An entry is only served for the exact element instance it was
/// computed from, since a re-extraction can change content without a new
/// version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct DiffKey {
    element: ElementId,
    original: u64,
    ours: Option<u64>,
    theirs: Option<u64>,
}

impl DiffKey {
    fn of(element: &ConflictElement) -> Self {
        Self {
            element: element.element_id,
            original: element.original.version,
            ours: element.ours.as_ref().map(|v| v.version),
            theirs: element.theirs.as_ref().map(|v| v.version),
        }
    }
}

/// A working set of conflicting elements and the operator's progress on it.
///
/// Fetched elements are immutable; choices live in a separate resolution
/// store; statuses and progress are derived from both on every read.
pub struct Reconciler<S, K> {
    config: ReconcileConfig,
    source: S,
    sink: K,
    elements: RwLock<BTreeMap<ElementId, Arc<ConflictElement>>>,
    diffs: RwLock<HashMap<DiffKey, (Arc<ConflictElement>, Arc<ElementDiff>)>>,
    excluded: RwLock<Vec<TypeError>>,
    active: RwLock<Option<ElementId>>,
    choices: InMemoryResolutionStore,
}

impl<S: ElementSource, K: MergeSink> Reconciler<S, K> {
    pub fn new(source: S, sink: K, config: ReconcileConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            sink,
            elements: RwLock::new(BTreeMap::new()),
            diffs: RwLock::new(HashMap::new()),
            excluded: RwLock::new(Vec::new()),
            active: RwLock::new(None),
            choices: InMemoryResolutionStore::new(),
        })
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    // ---- Loading ----

    /// Fetch the working set, replacing whatever was loaded before.
    ///
    /// Choices of elements that are still present survive the reload; those
    /// of elements that disappeared are discarded.
    pub async fn load(&self) -> SdkResult<AggregateStatus> {
        let fetched = self.source.fetch_all().await?;

        let mut accepted = BTreeMap::new();
        let mut excluded = Vec::new();
        for element in fetched {
            match element.validate() {
                Ok(()) => {
                    accepted.insert(element.element_id, Arc::new(element));
                }
                Err(e) if self.config.exclude_malformed => {
                    warn!(element = %element.element_id, error = %e, "excluding malformed element");
                    excluded.push(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        for id in self.choices.elements()? {
            if !accepted.contains_key(&id) {
                self.choices.clear(id)?;
            }
        }

        info!(loaded = accepted.len(), excluded = excluded.len(), "working set loaded");
        *write(&self.elements)? = accepted;
        *write(&self.excluded)? = excluded;
        write(&self.diffs)?.clear();
        if let Some(id) = self.active()? {
            if !read(&self.elements)?.contains_key(&id) {
                *write(&self.active)? = None;
            }
        }
        self.progress()
    }

    /// Re-fetch one element. Returns `false` if it left the working set,
    /// either because it is no longer in conflict or because the new
    /// version is malformed and excluded. Its choices leave with it.
    pub async fn refresh(&self, id: ElementId) -> SdkResult<bool> {
        let Some(element) = self.source.fetch(id).await? else {
            self.forget(id)?;
            return Ok(false);
        };
        let label = id.to_string();
        match element.validate() {
            Ok(()) => {}
            Err(e) if self.config.exclude_malformed => {
                warn!(element = %id, error = %e, "excluding malformed element");
                self.forget(id)?;
                let mut excluded = write(&self.excluded)?;
                excluded.retain(|x| !excludes(x, &label));
                excluded.push(e);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        write(&self.excluded)?.retain(|x| !excludes(x, &label));
        write(&self.diffs)?.retain(|k, _| k.element != id);
        write(&self.elements)?.insert(id, Arc::new(element));
        debug!(element = %id, "element refreshed");
        Ok(true)
    }

    /// Elements left out of the working set as malformed.
    pub fn excluded(&self) -> SdkResult<Vec<TypeError>> {
        Ok(read(&self.excluded)?.clone())
    }

    // ---- Reading ----

    pub fn element_ids(&self) -> SdkResult<Vec<ElementId>> {
        Ok(read(&self.elements)?.keys().copied().collect())
    }

    pub fn element(&self, id: ElementId) -> SdkResult<Arc<ConflictElement>> {
        read(&self.elements)?
            .get(&id)
            .cloned()
            .ok_or(SdkError::ElementNotFound(id))
    }

    /// The element's diff, computed once per set of variant versions.
    pub fn diff(&self, id: ElementId) -> SdkResult<Arc<ElementDiff>> {
        let element = self.element(id)?;
        let key = DiffKey::of(&element);
        if let Some((source, diff)) = read(&self.diffs)?.get(&key) {
            if Arc::ptr_eq(source, &element) {
                return Ok(Arc::clone(diff));
            }
        }
        let diff = Arc::new(diff_element(&element));
        write(&self.diffs)?.insert(key, (element, Arc::clone(&diff)));
        Ok(diff)
    }

    pub fn choices(&self, id: ElementId) -> SdkResult<ChoiceSet> {
        self.element(id)?;
        Ok(self.choices.choices(id)?)
    }

    pub fn status(&self, id: ElementId) -> SdkResult<ElementStatus> {
        let diff = self.diff(id)?;
        let choices = self.choices.choices(id)?;
        Ok(classify_element(&diff, &choices))
    }

    /// Resolved vs. total conflicts for one element.
    pub fn element_progress(&self, id: ElementId) -> SdkResult<ConflictTally> {
        let diff = self.diff(id)?;
        let choices = self.choices.choices(id)?;
        Ok(tally(&diff.tags, diff.geometry_conflicted, &choices))
    }

    /// Progress across the whole working set, recomputed from scratch.
    pub fn progress(&self) -> SdkResult<AggregateStatus> {
        let elements: Vec<Arc<ConflictElement>> = read(&self.elements)?.values().cloned().collect();
        let mut statuses = HashMap::with_capacity(elements.len());
        for element in &elements {
            statuses.insert(element.element_id, self.status(element.element_id)?);
        }
        let excluded = read(&self.excluded)?.len();
        let status = aggregate(elements.iter().map(Arc::as_ref), |e| {
            statuses
                .get(&e.element_id)
                .copied()
                .unwrap_or(ElementStatus::Unresolved)
        });
        Ok(status.with_excluded(excluded))
    }

    /// Returns `true` if the element could be submitted as it stands.
    pub fn is_ready(&self, id: ElementId) -> SdkResult<bool> {
        match self.resolve(id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_incomplete_resolution() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The first element after `after` (wrapping around) that is not yet
    /// ready to submit, including elements still awaiting a keep/delete
    /// decision.
    pub fn next_unresolved(&self, after: Option<ElementId>) -> SdkResult<Option<ElementId>> {
        let ids = self.element_ids()?;
        let start = after
            .and_then(|a| ids.iter().position(|id| *id > a))
            .unwrap_or(0);
        for id in ids[start..].iter().chain(&ids[..start]) {
            if Some(*id) != after && !self.is_ready(*id)? {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    // ---- Active element ----

    /// Make `id` the element under review. Other elements' choices are
    /// untouched.
    pub fn activate(&self, id: ElementId) -> SdkResult<()> {
        self.element(id)?;
        *write(&self.active)? = Some(id);
        debug!(element = %id, "element activated");
        Ok(())
    }

    pub fn active(&self) -> SdkResult<Option<ElementId>> {
        Ok(*read(&self.active)?)
    }

    // ---- Choices ----

    /// Toggle `side` for `key` on `id`. See [`ResolutionChoice::apply`].
    pub fn select(&self, id: ElementId, key: &str, side: Side) -> SdkResult<ResolutionChoice> {
        self.element(id)?;
        Ok(self.choices.set_choice(id, key, side)?)
    }

    /// Choose `side` for every conflicted field of `id`.
    pub fn choose_all(&self, id: ElementId, side: Side) -> SdkResult<()> {
        let diff = self.diff(id)?;
        self.choices.choose_all(id, &diff.conflict_keys(), side)?;
        Ok(())
    }

    /// Toggle the keep/delete decision for an element one branch deleted.
    pub fn decide(&self, id: ElementId, action: ElementAction) -> SdkResult<Option<ElementAction>> {
        self.element(id)?;
        Ok(self.choices.set_decision(id, action)?)
    }

    /// Replace all choices of `id`, e.g. when restoring saved work.
    pub fn restore_choices(&self, id: ElementId, choices: ChoiceSet) -> SdkResult<()> {
        self.element(id)?;
        Ok(self.choices.replace(id, choices)?)
    }

    // ---- Merging ----

    /// Materialize the merge of `id` without submitting it.
    pub fn resolve(&self, id: ElementId) -> SdkResult<MergeOutcome> {
        let element = self.element(id)?;
        let diff = self.diff(id)?;
        let choices = self.choices.choices(id)?;
        Ok(resolve_with_diff(&element, &diff, &choices)?)
    }

    /// Resolve and submit `id`.
    ///
    /// On success the element's choices are discarded and it leaves the
    /// working set; the receipt carries the state that now stands. A failed
    /// resolution or submission leaves everything in place for a retry.
    pub async fn submit(&self, id: ElementId) -> SdkResult<SubmitReceipt> {
        let outcome = self.resolve(id)?;
        let request = outcome.to_request();

        let max = self.config.max_submit_attempts;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.sink.submit(id, &request).await {
                Ok(()) => break,
                Err(e) if attempts < max => {
                    warn!(element = %id, attempt = attempts, error = %e, "submission failed, retrying");
                }
                Err(e) => {
                    return Err(SdkError::Submission {
                        element: id,
                        attempts,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let was_active = self.active()? == Some(id);
        self.forget(id)?;
        let receipt = SubmitReceipt {
            submission_id: SubmissionId::generate(),
            element_id: id,
            request,
            settled: outcome.settled_variant(),
            attempts,
            submitted_at: Utc::now(),
        };
        info!(element = %id, submission = %receipt.submission_id, attempts, "merge submitted");

        if self.config.auto_advance && was_active {
            let next = self.next_unresolved(Some(id))?;
            *write(&self.active)? = next;
        }
        Ok(receipt)
    }

    /// Submit every element that is ready, in id order.
    ///
    /// Elements that still need choices are skipped. A submission failure
    /// stops the run and is returned.
    pub async fn submit_ready(&self) -> SdkResult<Vec<SubmitReceipt>> {
        let mut receipts = Vec::new();
        for id in self.element_ids()? {
            if self.is_ready(id)? {
                receipts.push(self.submit(id).await?);
            }
        }
        Ok(receipts)
    }

    /// Drop `id` and everything derived from it.
    fn forget(&self, id: ElementId) -> SdkResult<()> {
        write(&self.elements)?.remove(&id);
        write(&self.diffs)?.retain(|k, _| k.element != id);
        self.choices.clear(id)?;
        let mut active = write(&self.active)?;
        if *active == Some(id) {
            *active = None;
        }
        Ok(())
    }
}

fn excludes(error: &TypeError, element: &str) -> bool {
    matches!(error, TypeError::MalformedVariant { element: e, .. } if e == element)
}

fn read<T>(lock: &RwLock<T>) -> SdkResult<std::sync::RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| SdkError::Internal(format!("lock poisoned: {e}")))
}

fn write<T>(lock: &RwLock<T>) -> SdkResult<std::sync::RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| SdkError::Internal(format!("lock poisoned: {e}")))
}
