//! The item catalog: every ability, spell, power, and amplification the
//! character can use, with their fixed properties.
//!
//! The catalog is compiled in and immutable. Items are referenced by
//! stable string ids from the character state and the presentation layer.

use serde::Serialize;

/// What an item is, and the rule data specific to that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    /// Spends pool points when used.
    Ability { cost: u8 },
    /// Restores pool points when cast. `tier` is the spell's own level,
    /// shown to the player but irrelevant to the rules.
    Spell { tier: u8, restore_amount: u8 },
    /// Usable at no pool cost unless the power carries an explicit one.
    Power { tier: u8, cost: Option<u8> },
    /// Togglable modifier; each active one adds +1 to the next spell cast.
    Amplification,
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Ability { .. } => "ability",
            ItemKind::Spell { .. } => "spell",
            ItemKind::Power { .. } => "power",
            ItemKind::Amplification => "amplification",
        }
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Unique, stable identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Display description of what the item does.
    pub effect: String,

    /// Optional free-text usage requirements.
    pub requirements: Option<String>,

    /// Minimum character level to use the item.
    pub required_level: u8,

    /// Kind and kind-specific rule data.
    pub kind: ItemKind,
}

impl Item {
    fn new(
        id: &str,
        name: &str,
        effect: &str,
        required_level: u8,
        kind: ItemKind,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            effect: effect.to_string(),
            requirements: None,
            required_level,
            kind,
        }
    }

    /// Create an ability with a pool cost.
    pub fn ability(id: &str, name: &str, effect: &str, required_level: u8, cost: u8) -> Self {
        Self::new(id, name, effect, required_level, ItemKind::Ability { cost })
    }

    /// Create a spell that restores pool points when cast.
    pub fn spell(
        id: &str,
        name: &str,
        effect: &str,
        required_level: u8,
        tier: u8,
        restore_amount: u8,
    ) -> Self {
        Self::new(
            id,
            name,
            effect,
            required_level,
            ItemKind::Spell {
                tier,
                restore_amount,
            },
        )
    }

    /// Create a power with no pool cost.
    pub fn power(id: &str, name: &str, effect: &str, required_level: u8, tier: u8) -> Self {
        Self::new(
            id,
            name,
            effect,
            required_level,
            ItemKind::Power { tier, cost: None },
        )
    }

    /// Create an amplification.
    pub fn amplification(id: &str, name: &str, effect: &str, required_level: u8) -> Self {
        Self::new(id, name, effect, required_level, ItemKind::Amplification)
    }

    /// Set the usage-requirements prose.
    pub fn with_requirements(mut self, requirements: &str) -> Self {
        self.requirements = Some(requirements.to_string());
        self
    }

    /// Give a power an explicit pool cost. No effect on other kinds.
    pub fn with_cost(mut self, new_cost: u8) -> Self {
        if let ItemKind::Power { cost, .. } = &mut self.kind {
            *cost = Some(new_cost);
        }
        self
    }

    /// Pool cost for listing order: abilities and costed powers spend
    /// points, everything else counts as zero.
    pub fn cost_or_zero(&self) -> u8 {
        match &self.kind {
            ItemKind::Ability { cost } => *cost,
            ItemKind::Power { cost, .. } => cost.unwrap_or(0),
            ItemKind::Spell { .. } | ItemKind::Amplification => 0,
        }
    }
}

// ============================================================================
// Catalog Data
// ============================================================================

lazy_static::lazy_static! {
    /// The full item catalog for the dream discipline.
    pub static ref ITEMS: Vec<Item> = vec![
        // Abilities
        Item::ability(
            "ability-dreamshaper",
            "Dreamshaper",
            "Modify a dream spell to alter its effects or duration. This ability allows you to subtly change the nature of a dream you're influencing.",
            1,
            1,
        )
        .with_requirements("Must be used in conjunction with a dream spell"),
        Item::ability(
            "ability-dream-tinkerer",
            "Dream Tinkerer",
            "Significantly alter a dream spell, changing its fundamental nature or target. This ability allows for more drastic modifications to dreams.",
            3,
            2,
        )
        .with_requirements("Must be used in conjunction with a dream spell"),
        Item::ability(
            "ability-dream-weaver",
            "Dream Weaver",
            "Completely reshape a dream spell, potentially creating entirely new scenarios or affecting multiple dreamers simultaneously.",
            6,
            3,
        )
        .with_requirements("Must be used in conjunction with a dream spell"),

        // Spells
        Item::spell(
            "spell-detect-psychic-significance",
            "Detect Psychic Significance",
            "Sense the presence and strength of psychic auras in the immediate vicinity. This spell can reveal recent psychic activity or the presence of psychically active beings.",
            1,
            1,
            1,
        )
        .with_requirements("Requires a focus item, such as a small crystal or mirror"),
        Item::spell(
            "spell-dream-scan",
            "Dream Scan",
            "Gain surface-level information from a sleeping creature's current dream. This spell allows you to glimpse fragments of the dream without disturbing the dreamer.",
            1,
            1,
            1,
        )
        .with_requirements("Target must be asleep and within 30 feet"),
        Item::spell(
            "spell-nightmare",
            "Nightmare",
            "Induce a frightening or unsettling dream in a sleeping target. The nightmare can cause mental fatigue and potentially reveal the target's fears or anxieties.",
            3,
            2,
            2,
        )
        .with_requirements("Target must be asleep and within 60 feet"),
        Item::spell(
            "spell-dream-messenger",
            "Dream Messenger",
            "Send a short message or vision to a sleeping creature. The message appears as part of the target's dream and can be remembered upon waking.",
            5,
            3,
            3,
        )
        .with_requirements("Must know the target's name and general location"),
        Item::spell(
            "spell-dream-leech",
            "Dream Leech",
            "Siphon psychic energy from a sleeping target's dreams. This spell allows you to restore your own phrenic pool by drawing power from the target's subconscious, potentially leaving them mentally fatigued.",
            7,
            4,
            4,
        )
        .with_requirements("Target must be asleep and within 30 feet. May have negative effects on the target."),
        Item::spell(
            "spell-oneiromancy",
            "Oneiromancy",
            "Interpret dreams to gain insight into future events or hidden truths. This powerful divination spell allows you to extract meaningful information from the chaotic realm of dreams.",
            9,
            5,
            5,
        )
        .with_requirements("Requires a personal item from the target and at least an hour of uninterrupted concentration."),

        // Powers
        Item::power(
            "power-lullaby",
            "Lullaby",
            "Emit a soothing psychic melody that makes the target drowsy. This power can potentially put a target to sleep if they fail a willpower check.",
            1,
            1,
        )
        .with_requirements("Target must be within line of sight and able to hear"),
        Item::power(
            "power-sleep",
            "Sleep",
            "Directly influence a target's mind to induce sleep. This power is more potent than Lullaby but requires more focus and energy.",
            3,
            2,
        )
        .with_requirements("Target must be within 30 feet and not in combat"),
        Item::power(
            "power-dream-link",
            "Dream Link",
            "Establish a mental connection with a sleeping creature, allowing for two-way communication through dreams. This power enables more complex interactions within the dream state.",
            5,
            3,
        )
        .with_requirements("Target must be asleep and you must have previously encountered them"),
        Item::power(
            "power-mind-heist",
            "Mind Heist",
            "Infiltrate a sleeping target's mind to extract specific information or plant an idea. This advanced power allows for deep exploration of the target's subconscious and subtle manipulation of their thoughts.",
            7,
            4,
        )
        .with_requirements("Target must be in a deep sleep. Requires intense concentration and carries risks of psychic backlash."),
        Item::power(
            "power-waking-dream",
            "Waking Dream",
            "Induce a dream-like state in a conscious target, blurring the lines between reality and dreams. This power can be used to disorient enemies or to help allies access their subconscious while awake.",
            9,
            5,
        )
        .with_requirements("Target must be within line of sight. Effect lasts for a short duration and can be resisted with a strong will."),

        // Amplifications
        Item::amplification(
            "amplification-focused-reverie",
            "Focused Reverie",
            "Sharpen your concentration before casting, weaving extra intent into the next dream spell. The spell's imagery becomes more vivid and harder for the target to dismiss.",
            1,
        ),
        Item::amplification(
            "amplification-lucid-surge",
            "Lucid Surge",
            "Channel a surge of lucidity into the next spell you cast, extending its reach deeper into the target's subconscious.",
            3,
        )
        .with_requirements("Must be toggled before the spell is cast"),
        Item::amplification(
            "amplification-deep-trance",
            "Deep Trance",
            "Slip into a trance while casting, anchoring the next dream spell so firmly that even a restless sleeper cannot shake it.",
            5,
        )
        .with_requirements("You are vulnerable while entranced"),
    ];
}

/// All catalog items, in definition order.
pub fn all_items() -> &'static [Item] {
    &ITEMS
}

/// Look up an item by id.
pub fn find_item(id: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let mut seen = HashSet::new();
        for item in all_items() {
            assert!(seen.insert(&item.id), "duplicate id: {}", item.id);
        }
    }

    #[test]
    fn test_required_levels_are_valid() {
        for item in all_items() {
            assert!(item.required_level >= 1, "{} has level 0", item.id);
        }
    }

    #[test]
    fn test_find_item() {
        let item = find_item("spell-nightmare").expect("Nightmare should exist");
        assert_eq!(item.name, "Nightmare");
        assert_eq!(
            item.kind,
            ItemKind::Spell {
                tier: 2,
                restore_amount: 2
            }
        );

        assert!(find_item("spell-does-not-exist").is_none());
    }

    #[test]
    fn test_catalog_composition() {
        let count = |pred: fn(&ItemKind) -> bool| all_items().iter().filter(|i| pred(&i.kind)).count();

        assert_eq!(count(|k| matches!(k, ItemKind::Ability { .. })), 3);
        assert_eq!(count(|k| matches!(k, ItemKind::Spell { .. })), 6);
        assert_eq!(count(|k| matches!(k, ItemKind::Power { .. })), 5);
        assert_eq!(count(|k| matches!(k, ItemKind::Amplification)), 3);
    }

    #[test]
    fn test_cost_or_zero() {
        let ability = find_item("ability-dream-weaver").unwrap();
        assert_eq!(ability.cost_or_zero(), 3);

        let spell = find_item("spell-oneiromancy").unwrap();
        assert_eq!(spell.cost_or_zero(), 0);

        let costed_power = Item::power("power-test", "Test", "Test power", 1, 1).with_cost(2);
        assert_eq!(costed_power.cost_or_zero(), 2);

        let free_power = find_item("power-lullaby").unwrap();
        assert_eq!(free_power.cost_or_zero(), 0);
    }
}
