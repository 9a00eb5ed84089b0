//! Three-way attribute diff.
//!
//! Every key present in any of the three maps yields one [`FieldComparison`].
//! Keys are ordered ascending by their literal string value so the output is
//! stable regardless of how the input maps were built.

use std::collections::BTreeSet;

use mapmerge_types::AttributeMap;
use serde::Serialize;

/// Comparison of one attribute key across original, ours, and theirs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComparison {
    pub key: String,
    pub original_value: Option<String>,
    pub ours_value: Option<String>,
    pub theirs_value: Option<String>,
    /// `false` when the local branch deleted the whole element.
    pub ours_defined: bool,
    /// `false` when the upstream branch deleted the whole element.
    pub theirs_defined: bool,
    pub ours_changed: bool,
    pub theirs_changed: bool,
    /// Both branches kept the element and disagree on this value.
    pub conflicted: bool,
}

impl FieldComparison {
    /// The value both branches agree on, for a key that is not conflicted.
    ///
    /// Prefers the local value, then the upstream value. Returns `None` when
    /// the key ends up absent, and for conflicted keys.
    pub fn agreed_value(&self) -> Option<&str> {
        if self.conflicted {
            return None;
        }
        self.ours_value
            .as_deref()
            .or(self.theirs_value.as_deref())
    }
}

/// The ordered result of comparing one element's attribute maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    /// One entry per key, ascending by key.
    pub fields: Vec<FieldComparison>,
}

impl TagDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Look up the comparison for `key`.
    pub fn get(&self, key: &str) -> Option<&FieldComparison> {
        self.fields
            .binary_search_by(|f| f.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.fields[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Comparisons that need an operator choice.
    pub fn conflicted(&self) -> impl Iterator<Item = &FieldComparison> {
        self.fields.iter().filter(|f| f.conflicted)
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicted().count()
    }

    /// Number of keys either branch changed relative to the original.
    pub fn changed_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.ours_changed || f.theirs_changed)
            .count()
    }
}

/// Compare the attribute maps of one element's three variants.
///
/// `ours` or `theirs` is `None` when that branch deleted the element; its
/// values then read as absent and no key is ever conflicted.
pub fn compare_attributes(
    original: &AttributeMap,
    ours: Option<&AttributeMap>,
    theirs: Option<&AttributeMap>,
) -> TagDiff {
    let mut keys: BTreeSet<&str> = original.keys().collect();
    keys.extend(ours.into_iter().flat_map(AttributeMap::keys));
    keys.extend(theirs.into_iter().flat_map(AttributeMap::keys));

    let ours_defined = ours.is_some();
    let theirs_defined = theirs.is_some();

    let fields = keys
        .into_iter()
        .map(|key| {
            let original_value = original.get(key);
            let ours_value = ours.and_then(|m| m.get(key));
            let theirs_value = theirs.and_then(|m| m.get(key));
            FieldComparison {
                key: key.to_string(),
                original_value: original_value.map(str::to_string),
                ours_value: ours_value.map(str::to_string),
                theirs_value: theirs_value.map(str::to_string),
                ours_defined,
                theirs_defined,
                ours_changed: original_value != ours_value,
                theirs_changed: original_value != theirs_value,
                conflicted: ours_defined && theirs_defined && ours_value != theirs_value,
            }
        })
        .collect();

    TagDiff { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::btree_map;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn scenario_both_fields_conflicted() {
        let original = attrs(&[("a", "1"), ("b", "2")]);
        let ours = attrs(&[("a", "1"), ("b", "3")]);
        let theirs = attrs(&[("a", "9"), ("b", "2")]);

        let diff = compare_attributes(&original, Some(&ours), Some(&theirs));
        assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let a = diff.get("a").unwrap();
        assert!(!a.ours_changed);
        assert!(a.theirs_changed);
        assert!(a.conflicted);

        let b = diff.get("b").unwrap();
        assert!(b.ours_changed);
        assert!(!b.theirs_changed);
        assert!(b.conflicted);

        assert_eq!(diff.conflict_count(), 2);
    }

    #[test]
    fn same_edit_on_both_sides_is_not_conflicted() {
        let original = attrs(&[("name", "Old")]);
        let both = attrs(&[("name", "New")]);

        let diff = compare_attributes(&original, Some(&both), Some(&both));
        let name = diff.get("name").unwrap();
        assert!(name.ours_changed && name.theirs_changed);
        assert!(!name.conflicted);
        assert_eq!(name.agreed_value(), Some("New"));
    }

    #[test]
    fn unchanged_key_keeps_original() {
        let original = attrs(&[("k", "v")]);
        let diff = compare_attributes(&original, Some(&original), Some(&original));
        let k = diff.get("k").unwrap();
        assert!(!k.ours_changed && !k.theirs_changed && !k.conflicted);
        assert_eq!(k.agreed_value(), Some("v"));
        assert_eq!(diff.changed_count(), 0);
    }

    #[test]
    fn empty_string_differs_from_absent() {
        let original = AttributeMap::new();
        let ours = attrs(&[("note", "")]);
        let theirs = AttributeMap::new();

        let diff = compare_attributes(&original, Some(&ours), Some(&theirs));
        let note = diff.get("note").unwrap();
        assert!(note.ours_changed);
        assert!(!note.theirs_changed);
        assert!(note.conflicted);
    }

    #[test]
    fn deleted_branch_suppresses_conflicts() {
        let original = attrs(&[("a", "1")]);
        let theirs = attrs(&[("a", "2"), ("b", "x")]);

        let diff = compare_attributes(&original, None, Some(&theirs));
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.conflict_count(), 0);
        for field in &diff.fields {
            assert!(!field.ours_defined);
            assert!(field.theirs_defined);
            assert_eq!(field.ours_value, None);
        }
        assert!(diff.get("a").unwrap().ours_changed);
    }

    #[test]
    fn ordering_is_case_sensitive_lexical() {
        let original = attrs(&[("b", "1"), ("B", "1")]);
        let ours = attrs(&[("a", "1")]);
        let theirs = attrs(&[("addr:street", "x"), ("Z", "1")]);

        let diff = compare_attributes(&original, Some(&ours), Some(&theirs));
        assert_eq!(
            diff.keys().collect::<Vec<_>>(),
            vec!["B", "Z", "a", "addr:street", "b"]
        );
        assert!(diff.get("missing").is_none());
    }

    fn attr_map() -> impl Strategy<Value = BTreeMap<String, String>> {
        btree_map("[a-dA-D:]{1,3}", "[0-2]{0,1}", 0..6)
    }

    proptest! {
        #[test]
        fn keys_are_sorted_union(
            o in attr_map(),
            a in proptest::option::of(attr_map()),
            b in proptest::option::of(attr_map()),
        ) {
            let original: AttributeMap = o.clone().into_iter().collect();
            let ours: Option<AttributeMap> = a.clone().map(|m| m.into_iter().collect());
            let theirs: Option<AttributeMap> = b.clone().map(|m| m.into_iter().collect());

            let diff = compare_attributes(&original, ours.as_ref(), theirs.as_ref());

            let mut expected: Vec<String> = o.keys().cloned().collect();
            expected.extend(a.iter().flat_map(|m| m.keys().cloned()));
            expected.extend(b.iter().flat_map(|m| m.keys().cloned()));
            expected.sort();
            expected.dedup();

            let keys: Vec<String> = diff.keys().map(str::to_string).collect();
            prop_assert_eq!(keys, expected);
        }

        #[test]
        fn conflicted_iff_both_defined_and_different(
            o in attr_map(),
            a in proptest::option::of(attr_map()),
            b in proptest::option::of(attr_map()),
        ) {
            let original: AttributeMap = o.into_iter().collect();
            let ours: Option<AttributeMap> = a.map(|m| m.into_iter().collect());
            let theirs: Option<AttributeMap> = b.map(|m| m.into_iter().collect());

            let diff = compare_attributes(&original, ours.as_ref(), theirs.as_ref());
            for f in &diff.fields {
                let expected = f.ours_defined && f.theirs_defined && f.ours_value != f.theirs_value;
                prop_assert_eq!(f.conflicted, expected);
                if !f.ours_defined || !f.theirs_defined {
                    prop_assert!(!f.conflicted);
                }
            }
        }

        #[test]
        fn repeated_calls_are_identical(
            o in attr_map(),
            a in attr_map(),
            b in attr_map(),
        ) {
            let original: AttributeMap = o.into_iter().collect();
            let ours: AttributeMap = a.into_iter().collect();
            let theirs: AttributeMap = b.into_iter().collect();
            let first = compare_attributes(&original, Some(&ours), Some(&theirs));
            let second = compare_attributes(&original, Some(&ours), Some(&theirs));
            prop_assert_eq!(first, second);
        }
    }
}
