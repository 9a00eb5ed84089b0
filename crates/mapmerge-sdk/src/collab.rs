//! Collaborator interfaces: where elements come from and where merges go.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mapmerge_merge::SubmissionRequest;
use mapmerge_types::{ConflictElement, ElementId, ElementVariant, SubmissionId};
use serde::Serialize;

use crate::error::{SdkError, SdkResult};

/// Supplies the elements under reconciliation.
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// Fetch the whole working set.
    async fn fetch_all(&self) -> SdkResult<Vec<ConflictElement>>;

    /// Fetch one element; `Ok(None)` if it is no longer in conflict.
    async fn fetch(&self, id: ElementId) -> SdkResult<Option<ConflictElement>>;
}

/// Accepts finished merges.
#[async_trait]
pub trait MergeSink: Send + Sync {
    /// Submit the request for one element. An error means the submission was
    /// not accepted and may be retried.
    async fn submit(&self, element: ElementId, request: &SubmissionRequest) -> SdkResult<()>;
}

/// Record of an accepted submission.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub submission_id: SubmissionId,
    pub element_id: ElementId,
    pub request: SubmissionRequest,
    /// The state that stands after the merge, or `None` if the element was
    /// deleted. It is the original for any later conflict on this element.
    pub settled: Option<ElementVariant>,
    pub attempts: u32,
    pub submitted_at: DateTime<Utc>,
}

/// An [`ElementSource`] backed by a map in memory.
#[derive(Debug, Default)]
pub struct InMemoryElementSource {
    elements: RwLock<BTreeMap<ElementId, ConflictElement>>,
}

impl InMemoryElementSource {
    pub fn new(elements: impl IntoIterator<Item = ConflictElement>) -> Self {
        Self {
            elements: RwLock::new(elements.into_iter().map(|e| (e.element_id, e)).collect()),
        }
    }

    /// Add or replace an element.
    pub fn insert(&self, element: ConflictElement) -> SdkResult<()> {
        let mut elements = self.elements.write().map_err(lock_err)?;
        elements.insert(element.element_id, element);
        Ok(())
    }

    pub fn remove(&self, id: ElementId) -> SdkResult<Option<ConflictElement>> {
        let mut elements = self.elements.write().map_err(lock_err)?;
        Ok(elements.remove(&id))
    }
}

#[async_trait]
impl ElementSource for InMemoryElementSource {
    async fn fetch_all(&self) -> SdkResult<Vec<ConflictElement>> {
        let elements = self.elements.read().map_err(lock_err)?;
        Ok(elements.values().cloned().collect())
    }

    async fn fetch(&self, id: ElementId) -> SdkResult<Option<ConflictElement>> {
        let elements = self.elements.read().map_err(lock_err)?;
        Ok(elements.get(&id).cloned())
    }
}

/// A [`MergeSink`] that records every accepted request.
///
/// It can be told to reject a number of submissions first, which is how
/// retry behavior is exercised.
#[derive(Debug, Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<(ElementId, SubmissionRequest)>>,
    reject_next: Mutex<u32>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects the first `n` submissions.
    pub fn rejecting(n: u32) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            reject_next: Mutex::new(n),
        }
    }

    /// Accepted requests in submission order.
    pub fn submitted(&self) -> SdkResult<Vec<(ElementId, SubmissionRequest)>> {
        Ok(self.submitted.lock().map_err(lock_err)?.clone())
    }
}

#[async_trait]
impl MergeSink for RecordingSink {
    async fn submit(&self, element: ElementId, request: &SubmissionRequest) -> SdkResult<()> {
        {
            let mut reject = self.reject_next.lock().map_err(lock_err)?;
            if *reject > 0 {
                *reject -= 1;
                return Err(SdkError::Internal(format!("submission of {element} rejected")));
            }
        }
        self.submitted
            .lock()
            .map_err(lock_err)?
            .push((element, request.clone()));
        Ok(())
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> SdkError {
    SdkError::Internal(format!("lock poisoned: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapmerge_types::{AttributeMap, ElementAction};

    fn element(id: i64) -> ConflictElement {
        let v = ElementVariant::new(id, 1, AttributeMap::new());
        ConflictElement::new(ElementId::node(id), v.clone(), Some(v.clone()), Some(v))
    }

    #[tokio::test]
    async fn source_fetches_in_id_order() {
        let source = InMemoryElementSource::new(vec![element(3), element(1)]);
        let all = source.fetch_all().await.unwrap();
        assert_eq!(all.iter().map(|e| e.element_id.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(source.fetch(ElementId::node(2)).await.unwrap().is_none());

        source.remove(ElementId::node(1)).unwrap();
        source.insert(element(2)).unwrap();
        assert!(source.fetch(ElementId::node(2)).await.unwrap().is_some());
        assert_eq!(source.fetch_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejecting_sink_recovers() {
        let sink = RecordingSink::rejecting(1);
        let req = SubmissionRequest::Action { action: ElementAction::Keep };
        assert!(sink.submit(ElementId::node(1), &req).await.is_err());
        assert!(sink.submit(ElementId::node(1), &req).await.is_ok());
        assert_eq!(sink.submitted().unwrap().len(), 1);
    }
}
