//! Package-prefix routing with longest-prefix resolution.
//!
//! A linear scan over a small ordered list; registration order is the
//! tie-breaker, so resolution is deterministic.

use tracing::instrument;

/// Separator between package segments.
pub const PACKAGE_SEPARATOR: char = '.';

/// Registry mapping normalized package prefixes to delegate values.
///
/// "No match" is a first-class outcome, not an error: callers fall back to
/// their primary root.
#[derive(Debug, Clone)]
pub struct PackageRouter<T> {
    entries: Vec<RouteEntry<T>>,
}

#[derive(Debug, Clone)]
struct RouteEntry<T> {
    prefix: String,
    value: T,
}

impl<T> Default for PackageRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PackageRouter<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a delegate under a package prefix. The prefix is trimmed
    /// and exactly one trailing separator is stripped. Re-registering the
    /// same normalized prefix replaces the prior entry in place, keeping
    /// its original position.
    pub fn register(&mut self, prefix: &str, value: T) {
        let prefix = normalize_prefix(prefix);
        match self.entries.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => entry.value = value,
            None => self.entries.push(RouteEntry { prefix, value }),
        }
    }

    /// Resolve a package name to the most specific matching delegate.
    ///
    /// A prefix matches when it equals the package or is a strict
    /// package-segment ancestor of it. The longest prefix wins; on a length
    /// tie the earliest registration wins. An empty package never matches,
    /// and an empty normalized prefix can never match anything.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve(&self, package: &str) -> Option<&T> {
        if package.is_empty() {
            return None;
        }
        let mut best: Option<&RouteEntry<T>> = None;
        for entry in &self.entries {
            if !prefix_matches(package, &entry.prefix) {
                continue;
            }
            // Strictly longer wins; ties keep the earlier registration
            if best.map_or(true, |b| entry.prefix.len() > b.prefix.len()) {
                best = Some(entry);
            }
        }
        best.map(|entry| &entry.value)
    }

    /// Exact lookup by normalized prefix.
    pub fn get(&self, prefix: &str) -> Option<&T> {
        let prefix = normalize_prefix(prefix);
        self.entries
            .iter()
            .find(|e| e.prefix == prefix)
            .map(|e| &e.value)
    }

    /// Registered entries in registration order, for diagnostics.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|e| (e.prefix.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    trimmed
        .strip_suffix(PACKAGE_SEPARATOR)
        .unwrap_or(trimmed)
        .to_string()
}

fn prefix_matches(package: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    package == prefix
        || package
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(PACKAGE_SEPARATOR))
}
