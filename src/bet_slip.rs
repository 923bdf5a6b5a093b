use serde::{Deserialize, Serialize};

use crate::state::{Confidence, Sport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSelection {
    pub id: String,
    pub match_title: String,
    pub market: String,
    pub selection: String,
    pub confidence: Confidence,
    pub sport: Option<Sport>,
}

impl BetSelection {
    pub fn new(
        match_title: &str,
        market: &str,
        selection: &str,
        confidence: Confidence,
        sport: Option<Sport>,
    ) -> Self {
        Self {
            id: selection_id(match_title, market, selection),
            match_title: match_title.to_string(),
            market: market.to_string(),
            selection: selection.to_string(),
            confidence,
            sport,
        }
    }

    fn summary_block(&self) -> String {
        format!(
            "{}\n{}: {} ({})",
            self.match_title,
            self.market,
            self.selection,
            self.confidence.as_str()
        )
    }
}

/// `"<title>-<market>-<selection>"` with whitespace runs collapsed to `-`,
/// lowercased.
pub fn selection_id(match_title: &str, market: &str, selection: &str) -> String {
    let raw = format!("{match_title}-{market}-{selection}");
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Session-only list of picked predictions, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetSlip {
    selections: Vec<BetSelection>,
}

impl BetSlip {
    /// Removes the selection when one with the same id is present, appends it
    /// otherwise. Returns `true` when it was added.
    pub fn toggle(&mut self, selection: BetSelection) -> bool {
        if let Some(pos) = self.selections.iter().position(|s| s.id == selection.id) {
            self.selections.remove(pos);
            false
        } else {
            self.selections.push(selection);
            true
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.selections.retain(|s| s.id != id);
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Exact string match on all three fields; no case or whitespace folding.
    pub fn contains(&self, match_title: &str, market: &str, selection: &str) -> bool {
        self.selections.iter().any(|s| {
            s.match_title == match_title && s.market == market && s.selection == selection
        })
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn selections(&self) -> &[BetSelection] {
        &self.selections
    }

    /// Plain-text export, one block per selection separated by a blank line.
    pub fn summary_text(&self) -> String {
        self.selections
            .iter()
            .map(BetSelection::summary_block)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
