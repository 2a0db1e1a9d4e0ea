use super::extract::ColorMap;

/// Externally sourced group colors for one chart instance.
#[derive(Clone, Debug, Default)]
pub struct ColorCache {
    fetching: bool,
    fetched: bool,
    colors: ColorMap,
    fingerprint: Option<String>,
}

impl ColorCache {
    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn get(&self, group: &str) -> Option<&str> {
        self.colors.get(group).map(String::as_str)
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn begin_fetch(&mut self) {
        self.fetching = true;
    }

    /// Completes a fetch. An empty map still counts as fetched.
    pub fn store(&mut self, colors: ColorMap, fingerprint: Option<String>) {
        self.fetching = false;
        self.fetched = true;
        self.colors = colors;
        if fingerprint.is_some() {
            self.fingerprint = fingerprint;
        }
    }

    pub fn invalidate(&mut self) {
        self.fetched = false;
        self.colors.clear();
        self.fingerprint = None;
    }

    /// Invalidates when `observed` is a fingerprint different from the stored
    /// one. Returns true when the cache was cleared.
    pub fn observe_fingerprint(&mut self, observed: Option<&str>) -> bool {
        let Some(observed) = observed else {
            return false;
        };
        if self.fingerprint.as_deref() == Some(observed) {
            return false;
        }
        self.invalidate();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(fingerprint: &str) -> ColorCache {
        let mut cache = ColorCache::default();
        cache.begin_fetch();
        cache.store(
            ColorMap::from([("G1".to_owned(), "#ff0000".to_owned())]),
            Some(fingerprint.to_owned()),
        );
        cache
    }

    #[test]
    fn store_finishes_the_fetch() {
        let cache = cached("f1");

        assert!(!cache.is_fetching());
        assert!(cache.is_fetched());
        assert_eq!(cache.get("G1"), Some("#ff0000"));
        assert_eq!(cache.fingerprint(), Some("f1"));
    }

    #[test]
    fn empty_result_is_still_fetched() {
        let mut cache = ColorCache::default();
        cache.begin_fetch();
        cache.store(ColorMap::new(), None);

        assert!(cache.is_fetched());
        assert!(!cache.has_colors());
    }

    #[test]
    fn same_fingerprint_keeps_the_cache() {
        let mut cache = cached("f1");

        assert!(!cache.observe_fingerprint(Some("f1")));
        assert!(!cache.observe_fingerprint(None));
        assert!(cache.is_fetched());
        assert!(cache.has_colors());
    }

    #[test]
    fn new_fingerprint_clears_the_cache() {
        let mut cache = cached("f1");

        assert!(cache.observe_fingerprint(Some("f2")));
        assert!(!cache.is_fetched());
        assert!(!cache.has_colors());
        assert_eq!(cache.fingerprint(), None);
    }
}
