//! Per-host outcomes of a dispatch round
//!
//! A [`ResultSet`] holds exactly one outcome per host submitted to the round.
//! The error and value views partition it: every host id is in exactly one.

use crate::error::Error;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Outcome for a single host: a value or a failure, never both
pub type NodeResult<T> = std::result::Result<T, Error>;

/// Host-keyed outcomes of one dispatch round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet<T> {
    entries: BTreeMap<String, NodeResult<T>>,
}

impl<T> ResultSet<T> {
    /// Build a result set from host-keyed outcomes
    ///
    /// Host ids are expected to be unique; a repeated id keeps the last outcome.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, NodeResult<T>)>,
    {
        Self {
            entries: results.into_iter().collect(),
        }
    }

    /// Number of hosts in the round
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the round had no hosts
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome for a host
    pub fn get(&self, host_id: &str) -> Option<&NodeResult<T>> {
        self.entries.get(host_id)
    }

    /// Successful value for a host, if it succeeded
    pub fn value(&self, host_id: &str) -> Option<&T> {
        self.entries.get(host_id).and_then(|r| r.as_ref().ok())
    }

    /// Failure for a host, if it failed
    pub fn error(&self, host_id: &str) -> Option<&Error> {
        self.entries.get(host_id).and_then(|r| r.as_ref().err())
    }

    /// Iterate over all outcomes in host id order
    pub fn iter(&self) -> btree_map::Iter<'_, String, NodeResult<T>> {
        self.entries.iter()
    }

    /// True iff at least one host failed
    pub fn has_errors(&self) -> bool {
        self.entries.values().any(Result::is_err)
    }

    /// Hosts that failed, with their errors
    pub fn error_host_map(&self) -> ErrorHostMap {
        self.entries
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id.clone(), e.clone())))
            .collect()
    }

    /// Hosts that succeeded, with their values
    pub fn value_map(&self) -> BTreeMap<&str, &T> {
        self.entries
            .iter()
            .filter_map(|(id, r)| r.as_ref().ok().map(|v| (id.as_str(), v)))
            .collect()
    }

    /// Split into owned value and error maps
    pub fn into_parts(self) -> (BTreeMap<String, T>, ErrorHostMap) {
        let mut values = BTreeMap::new();
        let mut errors = ErrorHostMap::new();
        for (id, result) in self.entries {
            match result {
                Ok(v) => {
                    values.insert(id, v);
                }
                Err(e) => errors.insert(id, e),
            }
        }
        (values, errors)
    }

    /// Transform successful values, keeping failures as they are
    ///
    /// The closure may fail, which turns that host's entry into an error.
    /// This is how decoding failures join transport failures in one set.
    pub fn and_then<U, F>(self, mut f: F) -> ResultSet<U>
    where
        F: FnMut(&str, T) -> NodeResult<U>,
    {
        ResultSet {
            entries: self
                .entries
                .into_iter()
                .map(|(id, r)| {
                    let mapped = r.and_then(|v| f(&id, v));
                    (id, mapped)
                })
                .collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = (&'a String, &'a NodeResult<T>);
    type IntoIter = btree_map::Iter<'a, String, NodeResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Host id to failure mapping, for failure summaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorHostMap {
    errors: BTreeMap<String, Error>,
}

impl ErrorHostMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a host
    pub fn insert(&mut self, host_id: impl Into<String>, error: Error) {
        self.errors.insert(host_id.into(), error);
    }

    /// Merge another map into this one
    pub fn extend(&mut self, other: ErrorHostMap) {
        self.errors.extend(other.errors);
    }

    /// Failure for a host
    pub fn get(&self, host_id: &str) -> Option<&Error> {
        self.errors.get(host_id)
    }

    /// Check if a host failed
    pub fn contains(&self, host_id: &str) -> bool {
        self.errors.contains_key(host_id)
    }

    /// Number of failed hosts
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if no host failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failed host ids in order
    pub fn hosts(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    /// Iterate over failures in host id order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Error> {
        self.errors.iter()
    }
}

impl FromIterator<(String, Error)> for ErrorHostMap {
    fn from_iter<I: IntoIterator<Item = (String, Error)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorHostMap {
    type Item = (String, Error);
    type IntoIter = btree_map::IntoIter<String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorHostMap {
    type Item = (&'a String, &'a Error);
    type IntoIter = btree_map::Iter<'a, String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ErrorHostMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(host, err)| format!("{host}: {err}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet<u32> {
        ResultSet::from_results([
            ("a".to_string(), Ok(1)),
            ("b".to_string(), Err(Error::transport("refused"))),
            ("c".to_string(), Ok(3)),
        ])
    }

    #[test]
    fn test_has_errors() {
        assert!(sample().has_errors());

        let clean: ResultSet<u32> = ResultSet::from_results([("a".to_string(), Ok(1))]);
        assert!(!clean.has_errors());
        assert!(clean.error_host_map().is_empty());
    }

    #[test]
    fn test_maps_partition_the_set() {
        let set = sample();
        let errors = set.error_host_map();
        let values = set.value_map();

        assert_eq!(errors.len() + values.len(), set.len());
        for (id, _) in &set {
            assert!(errors.contains(id) != values.contains_key(id.as_str()));
        }
        assert_eq!(errors.hosts(), vec!["b"]);
        assert_eq!(values.get("c"), Some(&&3));
    }

    #[test]
    fn test_and_then_turns_failures_into_errors() {
        let set = sample().and_then(|_, v| {
            if v > 2 {
                Err(Error::parse("too big"))
            } else {
                Ok(v * 10)
            }
        });

        assert_eq!(set.value("a"), Some(&10));
        assert_eq!(set.error("b"), Some(&Error::transport("refused")));
        assert_eq!(set.error("c"), Some(&Error::parse("too big")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_into_parts() {
        let (values, errors) = sample().into_parts();
        assert_eq!(values.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("b"));
    }

    #[test]
    fn test_error_host_map_display() {
        let errors = sample().error_host_map();
        assert_eq!(errors.to_string(), "b: transport failure: refused");
    }

    #[test]
    fn test_empty_set() {
        let set: ResultSet<()> = ResultSet::from_results(Vec::new());
        assert!(set.is_empty());
        assert!(!set.has_errors());
        assert!(set.value_map().is_empty());
    }
}
