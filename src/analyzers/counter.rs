//! Integer counting on top of [`KeyedCounterStore`].

use super::base::{normalize_key, Analyzer, Record};
use super::store::KeyedCounterStore;
use crate::error::{StatsError, StatsResult};
use crate::models::Course;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Counter value type.
pub type Count = i64;

/// An analyzer keeping integer counts per `(name, subcategory)`.
///
/// Usable on its own (it only remembers the visited course) and embedded by
/// the standard analyzers, which drive [`CounterAnalyzer::delta`] from their
/// event handlers and delegate the rest of the [`Analyzer`] contract.
#[derive(Debug, Clone)]
pub struct CounterAnalyzer {
    store: KeyedCounterStore<Count>,
    course: Option<Course>,
}

impl Default for CounterAnalyzer {
    fn default() -> Self {
        Self::new("CounterAnalyzer")
    }
}

impl CounterAnalyzer {
    /// Create a counter owned by the analyzer type `owner`.
    pub fn new(owner: &str) -> Self {
        Self::with_store(KeyedCounterStore::new(0).owned_by(owner))
    }

    /// Create a counter over a pre-configured store.
    pub fn with_store(store: KeyedCounterStore<Count>) -> Self {
        Self {
            store,
            course: None,
        }
    }

    pub fn store(&self) -> &KeyedCounterStore<Count> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut KeyedCounterStore<Count> {
        &mut self.store
    }

    /// The course seen by the last course event, cleared on reset.
    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn get_value(&self, name: &str, subcat: &str) -> StatsResult<Count> {
        self.store.get_value(name, subcat)
    }

    /// Adds `delta` to the cell and returns the new value.
    ///
    /// Unchecked: negative deltas are accepted.
    pub fn delta(&mut self, name: &str, subcat: &str, delta: Count) -> StatsResult<Count> {
        let current = self.store.get_value(name, subcat)?;
        let new_value = current
            .checked_add(delta)
            .ok_or_else(|| StatsError::invalid_delta(delta, "counter overflow"))?;
        self.store.set_value(name, subcat, new_value)?;
        Ok(new_value)
    }

    /// Adds a non-negative `delta` to the cell and returns the new value.
    pub fn add<D>(&mut self, name: &str, subcat: &str, delta: D) -> StatsResult<Count>
    where
        D: TryInto<Count> + fmt::Display + Copy,
    {
        let delta = check_delta(delta)?;
        self.delta(name, subcat, delta)
    }

    /// Subtracts a non-negative `delta` from the cell and returns the new value.
    ///
    /// A negative argument is rejected rather than silently turned into an
    /// addition.
    pub fn subtract<D>(&mut self, name: &str, subcat: &str, delta: D) -> StatsResult<Count>
    where
        D: TryInto<Count> + fmt::Display + Copy,
    {
        let delta = check_delta(delta)?;
        self.delta(name, subcat, -delta)
    }

    pub fn increment(&mut self, name: &str, subcat: &str) -> StatsResult<Count> {
        self.delta(name, subcat, 1)
    }

    pub fn decrement(&mut self, name: &str, subcat: &str) -> StatsResult<Count> {
        self.delta(name, subcat, -1)
    }

    /// Counts of `name` in every subcategory seen so far.
    ///
    /// With `normalize`, subcategory keys go through [`normalize_key`].
    pub fn counts_by_name(&self, name: &str, normalize: bool) -> BTreeMap<String, Count> {
        self.store
            .values_for(name)
            .into_iter()
            .map(|(subcat, count)| {
                let key = if normalize {
                    normalize_key(&subcat)
                } else {
                    subcat
                };
                (key, count)
            })
            .collect()
    }

    pub fn visit_course(&mut self, course: &Course) {
        self.course = Some(course.clone());
    }

    pub fn clear(&mut self) -> bool {
        self.course = None;
        self.store.reset()
    }
}

impl Analyzer for CounterAnalyzer {
    fn reset(&mut self) -> StatsResult<bool> {
        Ok(self.clear())
    }

    fn on_course(&mut self, course: &Course) -> StatsResult<()> {
        self.visit_course(course);
        Ok(())
    }

    fn names(&self) -> BTreeSet<String> {
        self.store.names()
    }

    fn get_by_name(&self, name: &str) -> Record {
        self.counts_by_name(name, true)
            .into_iter()
            .map(|(subcat, count)| (subcat, Value::from(count)))
            .collect()
    }
}

/// Coerces a public-facing delta and requires it to be non-negative.
fn check_delta<D>(delta: D) -> StatsResult<Count>
where
    D: TryInto<Count> + fmt::Display + Copy,
{
    let value: Count = delta
        .try_into()
        .map_err(|_| StatsError::invalid_delta(delta, "not representable as a counter value"))?;

    if value < 0 {
        return Err(StatsError::invalid_delta(value, "must be non-negative"));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::course;
    use serde_json::json;

    const NAME: &str = "grader@domain.com";
    const CATEGORY: &str = "Some Category";

    #[test]
    fn test_delta_from_initial_value() {
        let mut counter = CounterAnalyzer::default();
        assert!(counter.store().is_empty());

        let before = counter.get_value(NAME, CATEGORY).unwrap();
        assert_eq!(counter.delta(NAME, CATEGORY, 1).unwrap(), 1);
        let after = counter.get_value(NAME, CATEGORY).unwrap();

        assert_eq!(before, 0);
        assert_eq!(after - before, 1);
        assert!(!counter.store().is_empty());

        assert_eq!(counter.delta(NAME, CATEGORY, -4).unwrap(), -3);
    }

    #[test]
    fn test_add_subtract_accumulate_per_cell() {
        let mut counter = CounterAnalyzer::default();
        counter.add(NAME, "Hello", 5).unwrap();
        counter.subtract(NAME, "Hello", 2u8).unwrap();
        counter.increment(NAME, "Hello").unwrap();
        counter.add("other@domain.com", "Hello", 10u64).unwrap();
        counter.decrement(NAME, "Loops").unwrap();

        assert_eq!(counter.get_value(NAME, "Hello").unwrap(), 4);
        assert_eq!(counter.get_value("other@domain.com", "Hello").unwrap(), 10);
        assert_eq!(counter.get_value(NAME, "Loops").unwrap(), -1);
    }

    #[test]
    fn test_value_is_algebraic_sum_of_deltas() {
        const CELLS: [(&str, &str); 3] = [
            (NAME, "Hello"),
            (NAME, "Loops"),
            ("other@domain.com", "Hello"),
        ];

        // linear congruential generator with a fixed seed
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            state >> 33
        };

        for _ in 0..25 {
            let mut counter = CounterAnalyzer::default();
            let mut expected: BTreeMap<(&str, &str), Count> = BTreeMap::new();

            for _ in 0..40 {
                let (name, subcat) = CELLS[(next() % CELLS.len() as u64) as usize];
                let amount = (next() % 50) as u32;
                let sum = expected.entry((name, subcat)).or_insert(0);

                if next() % 2 == 0 {
                    counter.add(name, subcat, amount).unwrap();
                    *sum += Count::from(amount);
                } else {
                    counter.subtract(name, subcat, amount).unwrap();
                    *sum -= Count::from(amount);
                }
            }

            for (name, subcat) in CELLS {
                let sum = expected.get(&(name, subcat)).copied().unwrap_or(0);
                assert_eq!(counter.get_value(name, subcat).unwrap(), sum);
            }
        }
    }

    #[test]
    fn test_negative_deltas_rejected_without_mutation() {
        let mut counter = CounterAnalyzer::default();
        counter.add(NAME, CATEGORY, 3).unwrap();

        let err = counter.add(NAME, CATEGORY, -20).unwrap_err();
        assert!(matches!(err, StatsError::InvalidDelta { .. }));

        let err = counter.subtract(NAME, CATEGORY, -5).unwrap_err();
        assert!(matches!(err, StatsError::InvalidDelta { .. }));

        assert_eq!(counter.get_value(NAME, CATEGORY).unwrap(), 3);
        assert_eq!(counter.names().len(), 1);
    }

    #[test]
    fn test_uncoercible_delta_rejected() {
        let mut counter = CounterAnalyzer::default();
        let err = counter.add(NAME, CATEGORY, u64::MAX).unwrap_err();
        assert!(matches!(
            err,
            StatsError::InvalidDelta { ref delta, .. } if delta == &u64::MAX.to_string()
        ));
        assert!(counter.store().is_empty());
    }

    #[test]
    fn test_overflow_rejected() {
        let mut counter = CounterAnalyzer::default();
        counter.delta(NAME, CATEGORY, Count::MAX).unwrap();
        assert!(counter.increment(NAME, CATEGORY).is_err());
        assert_eq!(counter.get_value(NAME, CATEGORY).unwrap(), Count::MAX);
    }

    #[test]
    fn test_restricted_counter_fails_outside_allow_list() {
        let store = KeyedCounterStore::new(0)
            .owned_by("RestrictedCounter")
            .with_subcategories(["A"]);
        let mut counter = CounterAnalyzer::with_store(store);

        counter.increment(NAME, "A").unwrap();
        assert!(matches!(
            counter.increment(NAME, "B"),
            Err(StatsError::InvalidSubcategory { .. })
        ));

        counter.store_mut().set_suppress_subcategory_check(true);
        assert_eq!(counter.get_value(NAME, "B").unwrap(), 0);
        assert_eq!(counter.increment(NAME, "B").unwrap(), 1);
        assert_eq!(counter.get_value(NAME, "B").unwrap(), 0);
        assert_eq!(counter.get_value(NAME, "A").unwrap(), 1);
    }

    #[test]
    fn test_counts_by_name() {
        let mut counter = CounterAnalyzer::default();
        assert!(counter.counts_by_name(NAME, true).is_empty());

        counter.add(NAME, CATEGORY, 2).unwrap();
        counter.add("someone@domain.com", "Other Category", 1).unwrap();

        let normalized = counter.counts_by_name(NAME, true);
        assert_eq!(normalized.get("some-category"), Some(&2));
        assert_eq!(normalized.get("other-category"), Some(&0));

        let raw = counter.counts_by_name(NAME, false);
        assert_eq!(raw.get(CATEGORY), Some(&2));

        let record = counter.get_by_name(NAME);
        assert_eq!(record.get("some-category"), Some(&json!(2)));
    }

    #[test]
    fn test_reset_clears_counts_and_course() {
        let mut counter = CounterAnalyzer::default();
        counter
            .on_course(&course("COS126", "F2019", vec![]))
            .unwrap();
        counter.increment(NAME, CATEGORY).unwrap();
        assert_eq!(counter.course().map(|c| c.name.as_str()), Some("COS126"));

        assert!(counter.reset().unwrap());
        assert!(counter.course().is_none());
        assert!(counter.names().is_empty());
    }
}
