use std::collections::HashSet;

/// Result of offering an identity to the deduplicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time this identity was seen
    Admitted,
    /// The identity was admitted earlier
    Duplicate,
}

/// Set of identities admitted so far
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests and inserts in one step
    pub fn admit(&mut self, identity: &str) -> Admission {
        if self.seen.contains(identity) {
            Admission::Duplicate
        } else {
            self.seen.insert(identity.to_string());
            Admission::Admitted
        }
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.seen.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
