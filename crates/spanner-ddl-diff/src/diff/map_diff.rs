//! Keyed map difference: added, removed and modified entries.

use indexmap::IndexMap;

/// Original and new value for a key present on both sides with different
/// canonical content.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDifference<V> {
    pub original: V,
    pub new: V,
}

/// The three disjoint sets a category diff produces. Iteration order follows
/// the originating maps: original-side order for removed and modified
/// entries, new-side order for added entries.
#[derive(Debug, Clone)]
pub struct MapDifference<V> {
    only_in_original: IndexMap<String, V>,
    only_in_new: IndexMap<String, V>,
    differing: IndexMap<String, ValueDifference<V>>,
}

impl<V: Clone + PartialEq> MapDifference<V> {
    pub fn between(original: &IndexMap<String, V>, new: &IndexMap<String, V>) -> Self {
        let mut only_in_original = IndexMap::new();
        let mut differing = IndexMap::new();
        for (key, left) in original {
            match new.get(key) {
                None => {
                    only_in_original.insert(key.clone(), left.clone());
                }
                Some(right) if right != left => {
                    differing.insert(
                        key.clone(),
                        ValueDifference {
                            original: left.clone(),
                            new: right.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        let mut only_in_new = IndexMap::new();
        for (key, right) in new {
            if !original.contains_key(key) {
                only_in_new.insert(key.clone(), right.clone());
            }
        }

        Self {
            only_in_original,
            only_in_new,
            differing,
        }
    }

    /// True when the two maps held identical entries.
    pub fn are_equal(&self) -> bool {
        self.only_in_original.is_empty() && self.only_in_new.is_empty() && self.differing.is_empty()
    }

    /// Entries removed by the new schema.
    pub fn only_in_original(&self) -> &IndexMap<String, V> {
        &self.only_in_original
    }

    /// Entries added by the new schema.
    pub fn only_in_new(&self) -> &IndexMap<String, V> {
        &self.only_in_new
    }

    /// Entries present on both sides with differing content.
    pub fn differing(&self) -> &IndexMap<String, ValueDifference<V>> {
        &self.differing
    }
}
