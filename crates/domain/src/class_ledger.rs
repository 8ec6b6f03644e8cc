//! Class levels owned by a character.
//!
//! The ledger is a point-in-time snapshot used as read-only input to the
//! effective level calculation. It is re-read from the engine on every pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ClassId;

/// A class level entry for multiclass characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevel {
    /// ID of the class
    class_id: ClassId,
    /// Number of levels in this class
    level: u8,
}

impl ClassLevel {
    /// Create a new class level entry.
    pub fn new(class_id: impl Into<ClassId>, level: u8) -> Self {
        Self {
            class_id: class_id.into(),
            level,
        }
    }

    /// Get the class ID.
    pub fn class_id(&self) -> &ClassId {
        &self.class_id
    }

    /// Get the number of levels.
    pub fn level(&self) -> u8 {
        self.level
    }
}

/// Snapshot of `class -> actual level` for one character.
///
/// Classes the character never took read as level 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLedger {
    levels: BTreeMap<ClassId, u8>,
}

impl ClassLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style level assignment; duplicate classes accumulate.
    pub fn with_class(mut self, class_id: impl Into<ClassId>, level: u8) -> Self {
        self.add_levels(class_id, level);
        self
    }

    /// Add levels to a class.
    pub fn add_levels(&mut self, class_id: impl Into<ClassId>, levels: u8) {
        let entry = self.levels.entry(class_id.into()).or_insert(0);
        *entry = entry.saturating_add(levels);
    }

    /// Actual level in a class (0 when absent).
    pub fn level(&self, class_id: &ClassId) -> u8 {
        self.levels.get(class_id).copied().unwrap_or(0)
    }

    /// Classes with at least one level, in class ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, u8)> {
        self.levels
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(class, level)| (class, *level))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl FromIterator<ClassLevel> for ClassLedger {
    fn from_iter<T: IntoIterator<Item = ClassLevel>>(iter: T) -> Self {
        let mut ledger = ClassLedger::new();
        for entry in iter {
            ledger.add_levels(entry.class_id, entry.level);
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_classes_read_as_zero() {
        let ledger = ClassLedger::new().with_class("cleric", 9);
        assert_eq!(ledger.level(&ClassId::new("cleric")), 9);
        assert_eq!(ledger.level(&ClassId::new("wizard")), 0);
    }

    #[test]
    fn collects_from_class_levels() {
        let ledger: ClassLedger = vec![
            ClassLevel::new("cleric", 4),
            ClassLevel::new("blackguard", 3),
            ClassLevel::new("cleric", 2),
        ]
        .into_iter()
        .collect();

        assert_eq!(ledger.level(&ClassId::new("cleric")), 6);
        assert_eq!(ledger.level(&ClassId::new("blackguard")), 3);
    }

    #[test]
    fn iter_skips_zero_level_entries() {
        let ledger = ClassLedger::new()
            .with_class("wizard", 0)
            .with_class("sorcerer", 5);
        let classes: Vec<_> = ledger.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["sorcerer"]);
        assert!(!ledger.is_empty());
    }
}
