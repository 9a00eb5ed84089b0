//! In-memory resolution store.
//!
//! [`InMemoryResolutionStore`] keeps one `RwLock<ChoiceSet>` per element
//! inside an outer `RwLock<HashMap>`. The outer lock is only held long enough
//! to find or create an element's slot, so writers on different elements do
//! not contend, while a writer and a reader of the same element are
//! serialized by that element's lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mapmerge_types::{ElementAction, ElementId, ResolutionChoice, Side};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::traits::ResolutionStore;
use crate::types::ChoiceSet;

type Slot = Arc<RwLock<ChoiceSet>>;

/// An in-memory implementation of [`ResolutionStore`].
///
/// State is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryResolutionStore {
    elements: RwLock<HashMap<ElementId, Slot>>,
}

impl InMemoryResolutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, element: ElementId) -> ResolveResult<Option<Slot>> {
        let elements = self.elements.read().map_err(poisoned)?;
        Ok(elements.get(&element).cloned())
    }

    fn slot_or_insert(&self, element: ElementId) -> ResolveResult<Slot> {
        if let Some(slot) = self.slot(element)? {
            return Ok(slot);
        }
        let mut elements = self.elements.write().map_err(poisoned)?;
        Ok(elements.entry(element).or_default().clone())
    }

    fn update<T>(&self, element: ElementId, f: impl FnOnce(&mut ChoiceSet) -> T) -> ResolveResult<T> {
        let slot = self.slot_or_insert(element)?;
        let mut set = slot.write().map_err(poisoned)?;
        Ok(f(&mut *set))
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> ResolveError {
    ResolveError::LockPoisoned(e.to_string())
}

fn check_key(key: &str) -> ResolveResult<()> {
    if key.is_empty() {
        return Err(ResolveError::InvalidKey { key: key.to_string() });
    }
    Ok(())
}

impl ResolutionStore for InMemoryResolutionStore {
    fn set_choice(&self, element: ElementId, key: &str, side: Side) -> ResolveResult<ResolutionChoice> {
        check_key(key)?;
        let next = self.update(element, |set| set.apply(key, side))?;
        debug!(element = %element, key, choice = %next, "resolution choice updated");
        Ok(next)
    }

    fn get_choice(&self, element: ElementId, key: &str) -> ResolveResult<ResolutionChoice> {
        match self.slot(element)? {
            Some(slot) => Ok(slot.read().map_err(poisoned)?.choice(key)),
            None => Ok(ResolutionChoice::Unset),
        }
    }

    fn choose_all(&self, element: ElementId, keys: &[&str], side: Side) -> ResolveResult<()> {
        keys.iter().try_for_each(|k| check_key(k))?;
        self.update(element, |set| {
            for key in keys {
                set.set(key, side);
            }
        })?;
        debug!(element = %element, count = keys.len(), side = %side, "bulk resolution applied");
        Ok(())
    }

    fn set_decision(
        &self,
        element: ElementId,
        action: ElementAction,
    ) -> ResolveResult<Option<ElementAction>> {
        let next = self.update(element, |set| set.apply_decision(action))?;
        debug!(element = %element, decision = ?next, "element decision updated");
        Ok(next)
    }

    fn choices(&self, element: ElementId) -> ResolveResult<ChoiceSet> {
        match self.slot(element)? {
            Some(slot) => Ok(slot.read().map_err(poisoned)?.clone()),
            None => Ok(ChoiceSet::new()),
        }
    }

    fn replace(&self, element: ElementId, choices: ChoiceSet) -> ResolveResult<()> {
        for key in choices.fields.keys() {
            check_key(key)?;
        }
        self.update(element, |set| *set = choices)
    }

    fn clear(&self, element: ElementId) -> ResolveResult<bool> {
        let mut elements = self.elements.write().map_err(poisoned)?;
        let existed = elements.remove(&element).is_some();
        if existed {
            debug!(element = %element, "resolution state discarded");
        }
        Ok(existed)
    }

    fn elements(&self) -> ResolveResult<Vec<ElementId>> {
        let elements = self.elements.read().map_err(poisoned)?;
        let mut ids: Vec<ElementId> = elements.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapmerge_types::GEOMETRY_KEY;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::thread;

    fn a() -> ElementId {
        ElementId::way(1)
    }

    fn b() -> ElementId {
        ElementId::node(2)
    }

    #[test]
    fn unknown_element_reads_unset() {
        let store = InMemoryResolutionStore::new();
        assert_eq!(store.get_choice(a(), "name").unwrap(), ResolutionChoice::Unset);
        assert!(store.choices(a()).unwrap().is_empty());
        assert!(store.elements().unwrap().is_empty());
    }

    #[test]
    fn double_select_clears() {
        let store = InMemoryResolutionStore::new();
        assert_eq!(store.set_choice(a(), "name", Side::Ours).unwrap(), ResolutionChoice::Ours);
        assert_eq!(store.set_choice(a(), "name", Side::Ours).unwrap(), ResolutionChoice::Unset);
        assert_eq!(store.get_choice(a(), "name").unwrap(), ResolutionChoice::Unset);
    }

    #[test]
    fn opposite_side_overwrites() {
        let store = InMemoryResolutionStore::new();
        store.set_choice(a(), "name", Side::Ours).unwrap();
        assert_eq!(store.set_choice(a(), "name", Side::Theirs).unwrap(), ResolutionChoice::Theirs);
    }

    #[test]
    fn elements_are_isolated() {
        let store = InMemoryResolutionStore::new();
        store.set_choice(a(), "name", Side::Ours).unwrap();
        store.set_choice(b(), "name", Side::Theirs).unwrap();
        store.set_geometry_choice(b(), Side::Ours).unwrap();

        assert_eq!(store.get_choice(a(), "name").unwrap(), ResolutionChoice::Ours);
        assert_eq!(store.get_choice(a(), GEOMETRY_KEY).unwrap(), ResolutionChoice::Unset);
        assert_eq!(store.get_choice(b(), "name").unwrap(), ResolutionChoice::Theirs);

        assert!(store.clear(a()).unwrap());
        assert!(!store.clear(a()).unwrap());
        assert_eq!(store.get_choice(b(), GEOMETRY_KEY).unwrap(), ResolutionChoice::Ours);
        assert_eq!(store.elements().unwrap(), vec![b()]);
    }

    #[test]
    fn choose_all_does_not_toggle() {
        let store = InMemoryResolutionStore::new();
        store.set_choice(a(), "x", Side::Theirs).unwrap();
        store.choose_all(a(), &["x", "y"], Side::Theirs).unwrap();
        let set = store.choices(a()).unwrap();
        assert_eq!(set.choice("x"), ResolutionChoice::Theirs);
        assert_eq!(set.choice("y"), ResolutionChoice::Theirs);
    }

    #[test]
    fn empty_key_rejected() {
        let store = InMemoryResolutionStore::new();
        assert!(matches!(
            store.set_choice(a(), "", Side::Ours),
            Err(ResolveError::InvalidKey { .. })
        ));
        assert!(store.choose_all(a(), &["ok", ""], Side::Ours).is_err());
        assert!(store.choices(a()).unwrap().is_empty());
    }

    #[test]
    fn decisions_toggle() {
        let store = InMemoryResolutionStore::new();
        assert_eq!(store.set_decision(a(), ElementAction::Keep).unwrap(), Some(ElementAction::Keep));
        assert_eq!(store.decision(a()).unwrap(), Some(ElementAction::Keep));
        assert_eq!(store.set_decision(a(), ElementAction::Keep).unwrap(), None);
    }

    #[test]
    fn replace_overwrites_whole_set() {
        let store = InMemoryResolutionStore::new();
        store.set_choice(a(), "old", Side::Ours).unwrap();
        let set: ChoiceSet = [("new", Side::Theirs)].into_iter().collect();
        store.replace(a(), set.clone()).unwrap();
        assert_eq!(store.choices(a()).unwrap(), set);
    }

    #[test]
    fn concurrent_writers_on_distinct_elements() {
        let store = Arc::new(InMemoryResolutionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let id = ElementId::node(i);
                    for n in 0..50 {
                        store.set_choice(id, &format!("k{n}"), Side::Ours).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            assert_eq!(store.choices(ElementId::node(i)).unwrap().chosen_count(), 50);
        }
    }

    fn op() -> impl Strategy<Value = (bool, &'static str, Side)> {
        (
            any::<bool>(),
            prop_oneof![Just("name"), Just("ref"), Just(GEOMETRY_KEY)],
            prop_oneof![Just(Side::Ours), Just(Side::Theirs)],
        )
    }

    proptest! {
        #[test]
        fn store_matches_toggle_model(ops in proptest::collection::vec(op(), 0..40)) {
            let store = InMemoryResolutionStore::new();
            let mut model: BTreeMap<(bool, &str), ResolutionChoice> = BTreeMap::new();

            for (first, key, side) in ops {
                let element = if first { a() } else { b() };
                let expected = model.get(&(first, key)).copied().unwrap_or_default().apply(side);
                model.insert((first, key), expected);
                prop_assert_eq!(store.set_choice(element, key, side).unwrap(), expected);
            }

            for ((first, key), choice) in model {
                let element = if first { a() } else { b() };
                prop_assert_eq!(store.get_choice(element, key).unwrap(), choice);
            }
        }

        #[test]
        fn clearing_one_element_keeps_the_other(ops in proptest::collection::vec(op(), 1..20)) {
            let store = InMemoryResolutionStore::new();
            for (_, key, side) in &ops {
                store.set_choice(a(), key, *side).unwrap();
                store.set_choice(b(), key, *side).unwrap();
            }
            let before = store.choices(b()).unwrap();
            store.clear(a()).unwrap();
            prop_assert!(store.choices(a()).unwrap().is_empty());
            prop_assert_eq!(store.choices(b()).unwrap(), before);
        }
    }
}
