//! Spell slot and spell circle progression tables.
//!
//! Tables hold the level-derived base slots only. Ability-score bonus slots are
//! identical at actual and effective level, so they cancel out of every delta
//! and are not modelled here.

use serde::{Deserialize, Serialize};

/// Highest spell circle in any spellbook.
pub const MAX_SPELL_CIRCLE: u8 = 9;

/// Highest class level the tables describe. Lookups above it clamp.
pub const MAX_TABLE_LEVEL: u8 = 20;

/// Shape of a class's slot progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotProgression {
    /// Prepared full casters (Cleric, Druid, Wizard)
    Prepared,
    /// Spontaneous full casters (Sorcerer)
    Spontaneous,
    /// Bard, circles 0-6
    Bard,
    /// Paladin and Ranger, circles 1-4 starting at level 4
    HalfCaster,
}

type SlotRows = &'static [(u8, &'static [u8])];

// Rows list base slots starting at `first_circle()`.

const PREPARED_SLOTS: SlotRows = &[
    (1, &[3, 1]),
    (2, &[4, 2]),
    (3, &[4, 2, 1]),
    (4, &[4, 3, 2]),
    (5, &[4, 3, 2, 1]),
    (6, &[4, 3, 3, 2]),
    (7, &[4, 4, 3, 2, 1]),
    (8, &[4, 4, 3, 3, 2]),
    (9, &[4, 4, 4, 3, 2, 1]),
    (10, &[4, 4, 4, 3, 3, 2]),
    (11, &[4, 4, 4, 4, 3, 2, 1]),
    (12, &[4, 4, 4, 4, 3, 3, 2]),
    (13, &[4, 4, 4, 4, 4, 3, 2, 1]),
    (14, &[4, 4, 4, 4, 4, 3, 3, 2]),
    (15, &[4, 4, 4, 4, 4, 4, 3, 2, 1]),
    (16, &[4, 4, 4, 4, 4, 4, 3, 3, 2]),
    (17, &[4, 4, 4, 4, 4, 4, 4, 3, 2, 1]),
    (18, &[4, 4, 4, 4, 4, 4, 4, 3, 3, 2]),
    (19, &[4, 4, 4, 4, 4, 4, 4, 4, 3, 3]),
    (20, &[4, 4, 4, 4, 4, 4, 4, 4, 4, 4]),
];

const SPONTANEOUS_SLOTS: SlotRows = &[
    (1, &[5, 3]),
    (2, &[6, 4]),
    (3, &[6, 5]),
    (4, &[6, 6, 3]),
    (5, &[6, 6, 4]),
    (6, &[6, 6, 5, 3]),
    (7, &[6, 6, 6, 4]),
    (8, &[6, 6, 6, 5, 3]),
    (9, &[6, 6, 6, 6, 4]),
    (10, &[6, 6, 6, 6, 5, 3]),
    (11, &[6, 6, 6, 6, 6, 4]),
    (12, &[6, 6, 6, 6, 6, 5, 3]),
    (13, &[6, 6, 6, 6, 6, 6, 4]),
    (14, &[6, 6, 6, 6, 6, 6, 5, 3]),
    (15, &[6, 6, 6, 6, 6, 6, 6, 4]),
    (16, &[6, 6, 6, 6, 6, 6, 6, 5, 3]),
    (17, &[6, 6, 6, 6, 6, 6, 6, 6, 4]),
    (18, &[6, 6, 6, 6, 6, 6, 6, 6, 5, 3]),
    (19, &[6, 6, 6, 6, 6, 6, 6, 6, 6, 4]),
    (20, &[6, 6, 6, 6, 6, 6, 6, 6, 6, 6]),
];

const BARD_SLOTS: SlotRows = &[
    (1, &[2]),
    (2, &[3, 0]),
    (3, &[3, 1]),
    (4, &[3, 2, 0]),
    (5, &[3, 3, 1]),
    (6, &[3, 3, 2]),
    (7, &[3, 3, 2, 0]),
    (8, &[3, 3, 3, 1]),
    (9, &[3, 3, 3, 2]),
    (10, &[3, 3, 3, 2, 0]),
    (11, &[3, 3, 3, 3, 1]),
    (12, &[3, 3, 3, 3, 2]),
    (13, &[3, 3, 3, 3, 2, 0]),
    (14, &[4, 3, 3, 3, 3, 1]),
    (15, &[4, 4, 3, 3, 3, 2]),
    (16, &[4, 4, 4, 3, 3, 2, 0]),
    (17, &[4, 4, 4, 4, 3, 3, 1]),
    (18, &[4, 4, 4, 4, 4, 3, 2]),
    (19, &[4, 4, 4, 4, 4, 4, 3]),
    (20, &[4, 4, 4, 4, 4, 4, 4]),
];

// A zero still opens the circle; the caster relies on bonus slots from ability.
const HALF_CASTER_SLOTS: SlotRows = &[
    (4, &[0]),
    (5, &[0]),
    (6, &[1]),
    (7, &[1]),
    (8, &[1, 0]),
    (9, &[1, 0]),
    (10, &[1, 1]),
    (11, &[1, 1, 0]),
    (12, &[1, 1, 1]),
    (13, &[1, 1, 1]),
    (14, &[2, 1, 1, 0]),
    (15, &[2, 1, 1, 1]),
    (16, &[2, 2, 1, 1]),
    (17, &[2, 2, 2, 1]),
    (18, &[3, 2, 2, 1]),
    (19, &[3, 3, 3, 2]),
    (20, &[3, 3, 3, 3]),
];

impl SlotProgression {
    fn rows(self) -> SlotRows {
        match self {
            SlotProgression::Prepared => PREPARED_SLOTS,
            SlotProgression::Spontaneous => SPONTANEOUS_SLOTS,
            SlotProgression::Bard => BARD_SLOTS,
            SlotProgression::HalfCaster => HALF_CASTER_SLOTS,
        }
    }

    /// Lowest circle this progression ever grants.
    pub fn first_circle(self) -> u8 {
        match self {
            SlotProgression::HalfCaster => 1,
            _ => 0,
        }
    }

    fn row(self, level: u8) -> &'static [u8] {
        let level = level.min(MAX_TABLE_LEVEL);
        self.rows()
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, row)| *row)
            .unwrap_or(&[])
    }

    /// Base slots per day at `circle` for a caster of `level`.
    pub fn base_slots(self, level: u8, circle: u8) -> u8 {
        let Some(index) = circle.checked_sub(self.first_circle()) else {
            return 0;
        };
        self.row(level)
            .get(usize::from(index))
            .copied()
            .unwrap_or(0)
    }

    /// Highest spell circle reachable at `level`, or `None` before the first.
    pub fn max_circle(self, level: u8) -> Option<u8> {
        let len = self.row(level).len();
        if len == 0 {
            return None;
        }
        // Rows never exceed ten entries, so the cast cannot truncate.
        Some(self.first_circle() + (len as u8) - 1)
    }

    /// Circles that become reachable when moving from `from` to `to`.
    ///
    /// Empty when `to` does not reach further than `from`.
    pub fn newly_reachable(self, from: u8, to: u8) -> std::ops::RangeInclusive<u8> {
        let start = match self.max_circle(from) {
            Some(circle) => circle + 1,
            None => self.first_circle(),
        };
        match self.max_circle(to) {
            Some(end) => start..=end,
            // start > end yields an empty range
            None => 1..=0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_caster_circles() {
        assert_eq!(SlotProgression::Prepared.max_circle(1), Some(1));
        assert_eq!(SlotProgression::Prepared.max_circle(9), Some(5));
        assert_eq!(SlotProgression::Prepared.max_circle(20), Some(9));
        assert_eq!(SlotProgression::Prepared.max_circle(0), None);
    }

    #[test]
    fn lookups_clamp_above_table() {
        assert_eq!(
            SlotProgression::Prepared.base_slots(30, 9),
            SlotProgression::Prepared.base_slots(20, 9)
        );
        assert_eq!(SlotProgression::Prepared.max_circle(40), Some(9));
    }

    #[test]
    fn half_casters_start_at_first_circle() {
        assert_eq!(SlotProgression::HalfCaster.max_circle(3), None);
        assert_eq!(SlotProgression::HalfCaster.max_circle(4), Some(1));
        assert_eq!(SlotProgression::HalfCaster.base_slots(4, 1), 0);
        assert_eq!(SlotProgression::HalfCaster.base_slots(6, 1), 1);
        assert_eq!(SlotProgression::HalfCaster.base_slots(20, 0), 0);
        assert_eq!(SlotProgression::HalfCaster.max_circle(20), Some(4));
    }

    #[test]
    fn newly_reachable_circles() {
        let circles: Vec<u8> = SlotProgression::Prepared.newly_reachable(9, 20).collect();
        assert_eq!(circles, vec![6, 7, 8, 9]);
        assert!(SlotProgression::Prepared.newly_reachable(9, 10).next().is_none());
        assert!(SlotProgression::Prepared.newly_reachable(10, 9).next().is_none());

        let from_nothing: Vec<u8> = SlotProgression::HalfCaster.newly_reachable(2, 8).collect();
        assert_eq!(from_nothing, vec![1, 2]);
    }

    #[test]
    fn circle_seven_slots_between_ten_and_fifteen() {
        assert_eq!(SlotProgression::Prepared.base_slots(15, 7), 2);
        assert_eq!(SlotProgression::Prepared.base_slots(10, 7), 0);
        assert_eq!(SlotProgression::Spontaneous.base_slots(15, 7), 4);
    }
}
