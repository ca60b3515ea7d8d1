//! Unit catalog and live battle units.
//!
//! The catalog is a closed set of kinds with compile-time stat templates,
//! indexed by the `UnitKind` discriminant. A `UnitInstance` is a deployed
//! unit whose hit points change during execution.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::Player;

/// A deployable unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum UnitKind {
    Warrior = 0,
    Guardian = 1,
    Healer = 2,
    Berserker = 3,
    Knight = 4,
    Titan = 5,
}

/// The number of unit kinds in the catalog.
pub const UNIT_KIND_COUNT: usize = 6;

/// Every unit kind, in catalog order.
pub const ALL_UNIT_KINDS: [UnitKind; UNIT_KIND_COUNT] = [
    UnitKind::Warrior,
    UnitKind::Guardian,
    UnitKind::Healer,
    UnitKind::Berserker,
    UnitKind::Knight,
    UnitKind::Titan,
];

/// Immutable stat block for a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTemplate {
    pub kind: UnitKind,
    pub id: &'static str,
    pub name: &'static str,
    pub base_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub cost: u32,
    pub tier: u8,
}

const fn template(
    kind: UnitKind,
    id: &'static str,
    name: &'static str,
    base_hp: u32,
    attack: u32,
    defense: u32,
    cost: u32,
    tier: u8,
) -> UnitTemplate {
    UnitTemplate {
        kind,
        id,
        name,
        base_hp,
        attack,
        defense,
        cost,
        tier,
    }
}

/// Stat templates indexed by `UnitKind as usize`.
pub static UNIT_CATALOG: [UnitTemplate; UNIT_KIND_COUNT] = [
    template(UnitKind::Warrior, "warrior", "Warrior", 100, 25, 5, 5, 1),
    template(UnitKind::Guardian, "guardian", "Guardian", 140, 12, 20, 7, 1),
    template(UnitKind::Healer, "healer", "Healer", 90, 10, 3, 6, 1),
    template(UnitKind::Berserker, "berserker", "Berserker", 80, 35, 2, 8, 2),
    template(UnitKind::Knight, "knight", "Knight", 160, 30, 15, 12, 2),
    template(UnitKind::Titan, "titan", "Titan", 250, 40, 25, 20, 3),
];

impl UnitKind {
    /// Returns this kind's stat template.
    pub fn template(self) -> &'static UnitTemplate {
        &UNIT_CATALOG[self as usize]
    }

    /// Returns the lowercase identifier used in protocol and config text.
    pub fn id(self) -> &'static str {
        self.template().id
    }

    /// Parses a kind from its identifier.
    pub fn from_id(s: &str) -> Option<UnitKind> {
        ALL_UNIT_KINDS.into_iter().find(|k| k.id() == s)
    }

    /// The autonomous behavior assigned to units of this kind.
    pub const fn strategy(self) -> Strategy {
        match self {
            UnitKind::Healer => Strategy::Heal,
            _ => Strategy::AttackNearest,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Closed set of per-unit behaviors used during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Mend the most wounded ally in range, otherwise close in on it.
    Heal,
    /// Strike the closest enemy, otherwise close in on it.
    AttackNearest,
}

/// Stable identity of a unit for the whole match: owner plus spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub owner: Player,
    pub spawn: u32,
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.spawn)
    }
}

/// A deployed unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInstance {
    pub kind: UnitKind,
    pub owner: Player,
    pub spawn_order: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub strategy: Strategy,
}

impl UnitInstance {
    /// Creates a full-health unit of the given kind.
    pub fn spawn(kind: UnitKind, owner: Player, spawn_order: u32) -> Self {
        let t = kind.template();
        UnitInstance {
            kind,
            owner,
            spawn_order,
            hp: t.base_hp,
            max_hp: t.base_hp,
            strategy: kind.strategy(),
        }
    }

    pub fn id(&self) -> UnitId {
        UnitId {
            owner: self.owner,
            spawn: self.spawn_order,
        }
    }

    pub fn attack(&self) -> u32 {
        self.kind.template().attack
    }

    pub fn defense(&self) -> u32 {
        self.kind.template().defense
    }

    pub fn is_wounded(&self) -> bool {
        self.hp < self.max_hp
    }

    /// Subtracts `amount` hit points, clamping at zero. Returns the remaining hp.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    /// Restores up to `amount` hit points without exceeding `max_hp`.
    /// Returns how many were actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::Strategy;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn catalog_is_indexed_by_kind() {
        for (i, kind) in ALL_UNIT_KINDS.iter().enumerate() {
            assert_eq!(UNIT_CATALOG[i].kind, *kind);
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn kind_id_roundtrip() {
        for kind in ALL_UNIT_KINDS {
            assert_eq!(UnitKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(UnitKind::from_id("dragon"), None);
    }

    #[test]
    fn serde_id_matches_catalog_id() {
        for kind in ALL_UNIT_KINDS {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn only_healer_heals() {
        for kind in ALL_UNIT_KINDS {
            let expected = if kind == UnitKind::Healer {
                Strategy::Heal
            } else {
                Strategy::AttackNearest
            };
            assert_eq!(kind.strategy(), expected);
        }
    }

    #[test]
    fn spawn_starts_at_full_health() {
        let u = UnitInstance::spawn(UnitKind::Knight, Player::P2, 3);
        assert_eq!(u.hp, 160);
        assert_eq!(u.max_hp, 160);
        assert!(!u.is_wounded());
        assert_eq!(u.id(), UnitId { owner: Player::P2, spawn: 3 });
        assert_eq!(u.id().to_string(), "p2#3");
    }

    #[test]
    fn heal_caps_at_max() {
        let mut u = UnitInstance::spawn(UnitKind::Healer, Player::P1, 0);
        u.hp = 85;
        assert_eq!(u.heal(10), 5);
        assert_eq!(u.hp, 90);
    }

    proptest! {
        #[test]
        fn prop_hp_stays_within_bounds(
            hits in proptest::collection::vec((0u32..300, any::<bool>()), 1..30)
        ) {
            let mut u = UnitInstance::spawn(UnitKind::Guardian, Player::P1, 0);
            for (amount, is_heal) in hits {
                if is_heal {
                    u.heal(amount);
                } else {
                    u.take_damage(amount);
                }
                prop_assert!(u.hp <= u.max_hp);
            }
        }
    }
}
