//! Two-level keyed value store backing every analyzer.
//!
//! Values are filed under a `subcategory` (for instance an assignment name)
//! and then a `name` (for instance a grader email). Cells that were never
//! written read as the store's initial value without being materialized.

use crate::error::{StatsError, StatsResult};
use std::collections::{BTreeMap, BTreeSet};

/// Keyed store mapping `subcategory -> name -> value`.
///
/// An optional allow-list restricts which subcategories may be read or
/// written. Accessing a subcategory outside the list fails with
/// [`StatsError::InvalidSubcategory`], unless the check is suppressed, in
/// which case reads return the initial value and writes are dropped.
#[derive(Debug, Clone)]
pub struct KeyedCounterStore<V> {
    owner: String,
    subcategories: Option<BTreeSet<String>>,
    cells: BTreeMap<String, BTreeMap<String, V>>,
    initial_value: V,
    suppress_subcategory_check: bool,
}

impl<V: Clone> KeyedCounterStore<V> {
    /// Create an empty, unrestricted store.
    pub fn new(initial_value: V) -> Self {
        Self {
            owner: "KeyedCounterStore".to_string(),
            subcategories: None,
            cells: BTreeMap::new(),
            initial_value,
            suppress_subcategory_check: false,
        }
    }

    /// Name the analyzer type owning this store, used in error messages.
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Restrict the valid subcategories.
    pub fn with_subcategories<I, S>(mut self, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_subcategories(Some(subcategories.into_iter().map(Into::into).collect()));
        self
    }

    /// Degrade invalid-subcategory access to default reads and dropped writes.
    pub fn suppress_subcategory_check(mut self, suppress: bool) -> Self {
        self.suppress_subcategory_check = suppress;
        self
    }

    /// Replace the subcategory allow-list (`None` lifts the restriction).
    pub fn set_subcategories(&mut self, subcategories: Option<BTreeSet<String>>) {
        self.subcategories = subcategories;
    }

    pub fn set_suppress_subcategory_check(&mut self, suppress: bool) {
        self.suppress_subcategory_check = suppress;
    }

    pub fn subcategories(&self) -> Option<&BTreeSet<String>> {
        self.subcategories.as_ref()
    }

    /// Returns a fresh copy of the initial value.
    pub fn initial_value(&self) -> V {
        self.initial_value.clone()
    }

    /// Whether `subcat` may be read or written.
    pub fn is_valid_subcategory(&self, subcat: &str) -> bool {
        match &self.subcategories {
            Some(allowed) => allowed.contains(subcat),
            None => true,
        }
    }

    /// Checks `subcat` against the allow-list.
    ///
    /// Returns `Ok(false)` for an invalid subcategory when the check is
    /// suppressed, and an error otherwise.
    pub fn check_subcategory(&self, subcat: &str) -> StatsResult<bool> {
        if self.is_valid_subcategory(subcat) {
            return Ok(true);
        }

        if self.suppress_subcategory_check {
            return Ok(false);
        }

        Err(StatsError::InvalidSubcategory {
            subcategory: subcat.to_string(),
            owner: self.owner.clone(),
        })
    }

    /// Gets the value stored for `name` under `subcat`.
    pub fn get_value(&self, name: &str, subcat: &str) -> StatsResult<V> {
        if !self.check_subcategory(subcat)? {
            return Ok(self.initial_value());
        }

        Ok(self
            .cells
            .get(subcat)
            .and_then(|bucket| bucket.get(name))
            .cloned()
            .unwrap_or_else(|| self.initial_value()))
    }

    /// Stores `value` for `name` under `subcat`.
    pub fn set_value(&mut self, name: &str, subcat: &str, value: V) -> StatsResult<()> {
        if !self.check_subcategory(subcat)? {
            return Ok(());
        }

        self.cells
            .entry(subcat.to_string())
            .or_default()
            .insert(name.to_string(), value);

        Ok(())
    }

    /// Names for which at least one value was written since the last reset.
    pub fn names(&self) -> BTreeSet<String> {
        self.cells
            .values()
            .flat_map(|bucket| bucket.keys().cloned())
            .collect()
    }

    /// Subcategories holding at least one written value.
    pub fn written_subcategories(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Snapshot of `name` across every written subcategory.
    ///
    /// Subcategories where `name` was never written report the initial value.
    pub fn values_for(&self, name: &str) -> BTreeMap<String, V> {
        self.cells
            .iter()
            .map(|(subcat, bucket)| {
                let value = bucket
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| self.initial_value());
                (subcat.clone(), value)
            })
            .collect()
    }

    /// Clears all cells, keeping the allow-list and the initial value.
    pub fn reset(&mut self) -> bool {
        self.cells.clear();
        true
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
