//! The [`ResolutionStore`] trait defining the resolution state interface.

use mapmerge_types::{ElementAction, ElementId, ResolutionChoice, Side, GEOMETRY_KEY};

use crate::error::ResolveResult;
use crate::types::ChoiceSet;

/// Storage backend for operator choices.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes to one
/// element are serialized against reads of the same element, so a reader
/// never observes a half-applied update. Elements are fully independent.
pub trait ResolutionStore: Send + Sync {
    /// Select `side` for `key` on `element` and return the new choice.
    ///
    /// Selecting the side that is already chosen clears the choice to
    /// [`ResolutionChoice::Unset`]; selecting the other side overwrites it.
    fn set_choice(&self, element: ElementId, key: &str, side: Side) -> ResolveResult<ResolutionChoice>;

    /// The current choice for `key` on `element`.
    fn get_choice(&self, element: ElementId, key: &str) -> ResolveResult<ResolutionChoice>;

    /// Set every key in `keys` to `side`, without toggling.
    fn choose_all(&self, element: ElementId, keys: &[&str], side: Side) -> ResolveResult<()>;

    /// Select a keep/delete decision, toggling like [`set_choice`](Self::set_choice).
    fn set_decision(
        &self,
        element: ElementId,
        action: ElementAction,
    ) -> ResolveResult<Option<ElementAction>>;

    /// A consistent snapshot of every choice for `element`.
    ///
    /// Returns an empty set for elements with no recorded state.
    fn choices(&self, element: ElementId) -> ResolveResult<ChoiceSet>;

    /// Replace the whole choice set of `element`.
    fn replace(&self, element: ElementId, choices: ChoiceSet) -> ResolveResult<()>;

    /// Discard all state for `element`.
    ///
    /// Returns `Ok(true)` if the element had state.
    fn clear(&self, element: ElementId) -> ResolveResult<bool>;

    /// Elements currently holding any state, in ascending order.
    fn elements(&self) -> ResolveResult<Vec<ElementId>>;

    /// Select `side` for the geometry field.
    fn set_geometry_choice(&self, element: ElementId, side: Side) -> ResolveResult<ResolutionChoice> {
        self.set_choice(element, GEOMETRY_KEY, side)
    }

    /// The current keep/delete decision for `element`.
    fn decision(&self, element: ElementId) -> ResolveResult<Option<ElementAction>> {
        Ok(self.choices(element)?.decision)
    }
}
