//! The hidden item that delivers bonus spell slots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ClassId, ItemId};

/// Tag identifying carrier items in any inventory.
pub const CARRIER_TAG: &str = "arcanum_slot_carrier";

/// Blueprint for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    pub tag: String,
    pub name: String,
    pub hidden: bool,
    pub droppable: bool,
}

impl ItemTemplate {
    /// Template of the hidden, non-droppable slot carrier.
    pub fn carrier() -> Self {
        Self {
            tag: CARRIER_TAG.to_string(),
            name: "Arcane Focus".to_string(),
            hidden: true,
            droppable: false,
        }
    }
}

/// One bonus spell slot of `class` at `circle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BonusSlotProperty {
    pub class: ClassId,
    pub circle: u8,
}

impl BonusSlotProperty {
    pub fn new(class: impl Into<ClassId>, circle: u8) -> Self {
        Self {
            class: class.into(),
            circle,
        }
    }
}

impl fmt::Display for BonusSlotProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bonus_slot({}, {})", self.class, self.circle)
    }
}

/// An item as seen in a character's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub tag: String,
    pub equipped: bool,
}

impl InventoryItem {
    pub fn is_carrier(&self) -> bool {
        self.tag == CARRIER_TAG
    }
}

/// Sorted copy of a property list, for order-insensitive comparison.
pub fn normalized(properties: &[BonusSlotProperty]) -> Vec<BonusSlotProperty> {
    let mut sorted = properties.to_vec();
    sorted.sort();
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_template_is_hidden_and_bound() {
        let template = ItemTemplate::carrier();
        assert_eq!(template.tag, CARRIER_TAG);
        assert!(template.hidden);
        assert!(!template.droppable);
    }

    #[test]
    fn property_lists_compare_without_order() {
        let a = vec![
            BonusSlotProperty::new("wizard", 7),
            BonusSlotProperty::new("cleric", 2),
            BonusSlotProperty::new("wizard", 7),
        ];
        let b = vec![
            BonusSlotProperty::new("wizard", 7),
            BonusSlotProperty::new("wizard", 7),
            BonusSlotProperty::new("cleric", 2),
        ];
        assert_eq!(normalized(&a), normalized(&b));
    }
}
