use std::collections::BTreeSet;

/// Page indices already refreshed this session.
///
/// Tracked by position, so removing a page shifts every later index down.
#[derive(Debug, Clone, Default)]
pub struct VisitedPages {
    indices: BTreeSet<usize>,
}

impl VisitedPages {
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn insert(&mut self, index: usize) {
        self.indices.insert(index);
    }

    /// Forget `removed` and decrement every index above it.
    pub fn remove_and_shift(&mut self, removed: usize) {
        self.indices = self
            .indices
            .iter()
            .filter(|&&i| i != removed)
            .map(|&i| if i > removed { i - 1 } else { i })
            .collect();
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.indices.iter().copied().collect()
    }
}
