/// A value computed on first use and memoized afterwards.
///
/// The only transition is `populate`, which either fills an empty cache or
/// overwrites a populated one when the caller asks for a refresh. Callers
/// hold `&mut` to the owner while populating, so two populations of the same
/// cache cannot interleave.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LazyCache<T> {
    #[default]
    Unpopulated,
    Populated(T),
}

impl<T> LazyCache<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            LazyCache::Unpopulated => None,
            LazyCache::Populated(value) => Some(value),
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            LazyCache::Unpopulated => None,
            LazyCache::Populated(value) => Some(value),
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, LazyCache::Populated(_))
    }

    /// Stores `value`, replacing any previous one.
    pub fn populate(&mut self, value: T) {
        *self = LazyCache::Populated(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unpopulated() {
        let cache: LazyCache<Vec<u32>> = LazyCache::default();
        assert!(!cache.is_populated());
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_populate_stores_value() {
        let mut cache = LazyCache::Unpopulated;
        cache.populate(vec![1, 2]);
        assert!(cache.is_populated());
        assert_eq!(cache.get(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_populate_overwrites_previous_value() {
        let mut cache = LazyCache::Populated(vec![1]);
        cache.populate(vec![7, 8, 9]);
        assert_eq!(cache.get(), Some(&vec![7, 8, 9]));
    }

    #[test]
    fn test_get_mut_edits_populated_value_only() {
        let mut empty: LazyCache<Vec<u32>> = LazyCache::Unpopulated;
        assert!(empty.get_mut().is_none());

        let mut cache = LazyCache::Populated(vec![1, 2, 3]);
        if let Some(values) = cache.get_mut() {
            values.retain(|&v| v != 2);
        }
        assert_eq!(cache.get(), Some(&vec![1, 3]));
    }

    #[test]
    fn test_empty_value_still_counts_as_populated() {
        let mut cache: LazyCache<Vec<u32>> = LazyCache::Unpopulated;
        cache.populate(Vec::new());
        assert!(cache.is_populated());
        assert_eq!(cache.get(), Some(&Vec::new()));
    }
}
