use serde::Serialize;

/// One selectable branch inside a choice set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Tag name of the branch, unique within its set.
    pub symbol: String,
    /// Text presented to the player.
    pub text: String,
    /// Host-language expression gating visibility. Empty means always shown.
    pub condition: String,
}

/// A compiled choice set. Candidates keep document order; runtime filtering
/// happens against this record, never against the command stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceSet {
    pub candidates: Vec<Candidate>,
    /// Index highlighted initially, before filtering.
    pub default_index: i64,
    /// Index taken on cancel, before filtering.
    pub cancel_index: i64,
    pub position_type: i64,
    pub background: i64,
}

/// Append-only table of every choice set compiled so far. Indices handed out
/// by [`register`](ChoiceRegistry::register) stay valid for the life of the
/// registry, so command streams compiled earlier keep resolving correctly.
#[derive(Debug, Default)]
pub struct ChoiceRegistry {
    sets: Vec<ChoiceSet>,
}

impl ChoiceRegistry {
    pub fn new() -> Self {
        ChoiceRegistry::default()
    }

    /// Add a set and return its permanent id.
    pub fn register(&mut self, set: ChoiceSet) -> usize {
        self.sets.push(set);
        self.sets.len() - 1
    }

    pub fn get(&self, id: usize) -> Option<&ChoiceSet> {
        self.sets.get(id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn sets(&self) -> &[ChoiceSet] {
        &self.sets
    }
}
