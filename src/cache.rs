/// One-shot dirty flag.
///
/// Used where the cached state lives elsewhere (a list of children, positions
/// written into entities) and only its freshness needs tracking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Validity {
    valid: bool,
}

impl Validity {
    /// Creates an invalid flag so the first read always computes.
    pub fn new() -> Self {
        Self { valid: false }
    }

    /// Marks the state stale. Returns `true` if it was valid before.
    pub fn invalidate(&mut self) -> bool {
        std::mem::replace(&mut self.valid, false)
    }

    /// Marks the state fresh. Call only after the authoritative state has been written.
    pub fn validate(&mut self) {
        self.valid = true;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Dirty flag carrying a memoized value.
///
/// A stale value is kept around only to be overwritten; it is never handed out.
#[derive(Clone, Debug)]
pub struct Cached<T> {
    value: Option<T>,
    validity: Validity,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Cached<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            validity: Validity::new(),
        }
    }

    /// Marks the value stale. Returns `true` if it was valid before.
    pub fn invalidate(&mut self) -> bool {
        self.validity.invalidate()
    }

    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Stores a freshly computed value and marks it valid.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
        self.validity.validate();
    }

    /// Returns the value only while it is valid.
    pub fn get(&self) -> Option<&T> {
        if self.validity.is_valid() {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Returns the value.
    ///
    /// # Panics
    /// Panics if the cache is invalid. Callers must check [`Self::is_valid`]
    /// or go through [`Self::get_or_compute`].
    pub fn value(&self) -> &T {
        self.get().expect("cached value read while invalid")
    }

    /// Marks the value stale and hands back whatever was stored.
    pub fn take(&mut self) -> Option<T> {
        self.validity.invalidate();
        self.value.take()
    }

    /// Stored value for recomputation in place, created on first use.
    ///
    /// Does not change validity; call [`Self::validate`] once the value is complete.
    pub fn slot(&mut self) -> &mut T
    where
        T: Default,
    {
        self.value.get_or_insert_with(T::default)
    }

    /// Marks the stored value fresh.
    ///
    /// # Panics
    /// Panics if nothing is stored.
    pub fn validate(&mut self) {
        assert!(self.value.is_some(), "validated an empty cache");
        self.validity.validate();
    }

    /// Whatever is stored, fresh or not.
    pub fn stale(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Computes and stores the value on a miss, then returns it.
    pub fn get_or_compute(&mut self, f: impl FnOnce() -> T) -> &T {
        if !self.validity.is_valid() {
            self.set(f());
        }
        self.value()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_starts_invalid() {
        let mut validity = Validity::new();
        assert!(!validity.is_valid());

        validity.validate();
        assert!(validity.is_valid());

        assert!(validity.invalidate());
        // idempotent
        assert!(!validity.invalidate());
        assert!(!validity.is_valid());
    }

    #[test]
    fn test_cached_hides_stale_value() {
        let mut cached = Cached::new();
        assert_eq!(cached.get(), None);

        cached.set(3);
        assert_eq!(cached.get(), Some(&3));

        cached.invalidate();
        assert_eq!(cached.get(), None);
        assert!(!cached.is_valid());
    }

    #[test]
    fn test_get_or_compute_runs_once_per_invalidation() {
        let mut cached = Cached::new();
        let mut calls = 0;

        for _ in 0..3 {
            cached.get_or_compute(|| {
                calls += 1;
                10
            });
        }
        assert_eq!(calls, 1);

        cached.invalidate();
        let value = *cached.get_or_compute(|| {
            calls += 1;
            20
        });
        assert_eq!(value, 20);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_take_leaves_cache_empty() {
        let mut cached = Cached::new();
        cached.set(vec![1, 2]);
        assert_eq!(cached.take(), Some(vec![1, 2]));
        assert!(!cached.is_valid());
        assert_eq!(cached.take(), None);
    }

    #[test]
    fn test_slot_keeps_partial_value_while_invalid() {
        let mut cached: Cached<Vec<u32>> = Cached::new();
        cached.slot().push(1);
        assert!(!cached.is_valid());
        assert_eq!(cached.get(), None);
        assert_eq!(cached.stale(), Some(&vec![1]));

        cached.validate();
        assert_eq!(cached.get(), Some(&vec![1]));
    }

    #[test]
    #[should_panic(expected = "read while invalid")]
    fn test_value_panics_when_invalid() {
        let cached: Cached<u32> = Cached::new();
        cached.value();
    }
}
