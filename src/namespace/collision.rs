use std::collections::HashSet;

use crate::namespace::path::split_ext;

/// Assigns unique names to a sequence of candidates that may repeat.
///
/// Names are processed in input order. The first occurrence of a name is kept
/// verbatim; later repeats are renamed to `stem-N.ext` with the smallest
/// `N >= 1` that is not reserved. Every input name is reserved up front, so a
/// renamed repeat never takes a name that appears literally further down the
/// list. The whole input has to be known before the first name is emitted.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    reserved: HashSet<String>,
    yielded: HashSet<String>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a full sequence of names. The output has the same length and
    /// order as `names`, and its elements are pairwise distinct.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Vec<String> {
        let mut resolver = Self::new();
        resolver
            .reserved
            .extend(names.iter().map(|n| n.as_ref().to_string()));

        names.iter().map(|n| resolver.next_name(n.as_ref())).collect()
    }

    fn next_name(&mut self, name: &str) -> String {
        let chosen = if self.yielded.contains(name) {
            let renamed = self.disambiguate(name);
            tracing::debug!("renamed repeated name {} to {}", name, renamed);
            renamed
        } else {
            name.to_string()
        };
        self.yielded.insert(chosen.clone());
        self.reserved.insert(chosen.clone());
        chosen
    }

    fn disambiguate(&self, name: &str) -> String {
        let (stem, ext) = split_ext(name);
        // The reserved set is finite, so this always finds a free slot.
        (1u64..)
            .map(|n| format!("{}-{}{}", stem, n, ext))
            .find(|candidate| !self.reserved.contains(candidate))
            .unwrap_or_else(|| format!("{}-{}", stem, u64::MAX))
    }
}
