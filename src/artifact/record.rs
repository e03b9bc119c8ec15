//! Canonical artifact record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Equipment slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Flower,
    Plume,
    Sands,
    Goblet,
    Circlet,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::Flower,
        Position::Plume,
        Position::Sands,
        Position::Goblet,
        Position::Circlet,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Position::Flower => "flower",
            Position::Plume => "plume",
            Position::Sands => "sands",
            Position::Goblet => "goblet",
            Position::Circlet => "circlet",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Stat identifier. Flat and percentage variants of hp/atk/def are distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeId {
    #[serde(rename = "hp")]
    Hp,
    #[serde(rename = "hprate")]
    HpRate,
    #[serde(rename = "atk")]
    Atk,
    #[serde(rename = "atkrate")]
    AtkRate,
    #[serde(rename = "def")]
    Def,
    #[serde(rename = "defrate")]
    DefRate,
    #[serde(rename = "cr")]
    CritRate,
    #[serde(rename = "cd")]
    CritDamage,
    #[serde(rename = "er")]
    EnergyRecharge,
    #[serde(rename = "em")]
    ElementalMastery,
    #[serde(rename = "healing")]
    Healing,
    #[serde(rename = "phydmg")]
    PhysicalDamage,
    #[serde(rename = "admg")]
    AnemoDamage,
    #[serde(rename = "gdmg")]
    GeoDamage,
    #[serde(rename = "edmg")]
    ElectroDamage,
    #[serde(rename = "ddmg")]
    DendroDamage,
    #[serde(rename = "hdmg")]
    HydroDamage,
    #[serde(rename = "pdmg")]
    PyroDamage,
    #[serde(rename = "crdmg")]
    CryoDamage,
}

impl AttributeId {
    /// Percentage variant when the displayed value is a fraction.
    ///
    /// Flat and percentage hp/atk/def share a label and differ only in the `%`.
    pub fn corrected_for(self, value: f64) -> Self {
        if value >= 1.0 {
            return self;
        }
        match self {
            AttributeId::Hp => AttributeId::HpRate,
            AttributeId::Atk => AttributeId::AtkRate,
            AttributeId::Def => AttributeId::DefRate,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Unlocked,
    Locked,
    #[default]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAttribute {
    pub attr: AttributeId,
    pub value: f64,
}

/// A fully resolved artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Set id, e.g. `gladiator_finale`.
    pub name: String,
    pub position: Position,
    pub star: u8,
    pub level: u8,
    pub lock: LockState,
    pub main_attr: AttributeId,
    pub main_value: f64,
    pub sub_attrs: Vec<SubAttribute>,
    /// Character name, empty when unequipped.
    pub equipper: String,
}

impl ArtifactRecord {
    /// Sort key of the inventory: rarity first, then level.
    pub fn rank(&self) -> u32 {
        rank(self.star, self.level)
    }
}

pub fn rank(star: u8, level: u8) -> u32 {
    star as u32 * 100 + level as u32
}
