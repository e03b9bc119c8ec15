//! Canonical id → destination schema vocabulary.
//!
//! Each schema ships builtin tables; `<mapper_dir>/<tag>.json` may override or
//! extend any entry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::ExportFormat;
use crate::artifact::{AttributeId, Position};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaVocabulary {
    /// Set id → schema set key
    pub sets: BTreeMap<String, String>,
    pub attributes: BTreeMap<AttributeId, String>,
    pub positions: BTreeMap<Position, String>,
}

impl SchemaVocabulary {
    /// Builtin tables for `format`; empty for the pass-through format.
    pub fn builtin(format: ExportFormat) -> Self {
        match format {
            ExportFormat::None => Self::default(),
            ExportFormat::Mona => Self::from_tables(&MONA_SETS, &MONA_ATTRIBUTES, &MONA_POSITIONS),
            ExportFormat::Yuanmo => {
                Self::from_tables(&YUANMO_SETS, &YUANMO_ATTRIBUTES, &YUANMO_POSITIONS)
            }
        }
    }

    /// Builtin tables merged with `<dir>/<tag>.json` when that file exists.
    pub fn load(format: ExportFormat, dir: Option<&Path>) -> Result<Self> {
        let mut vocabulary = Self::builtin(format);
        let Some(dir) = dir else {
            return Ok(vocabulary);
        };
        if format == ExportFormat::None {
            return Ok(vocabulary);
        }

        let path = dir.join(format!("{}.json", format.tag()));
        if !path.exists() {
            debug!("No vocabulary override at {}", path.display());
            return Ok(vocabulary);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read vocabulary {}", path.display()))?;
        let overrides: SchemaVocabulary = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid vocabulary {}", path.display()))?;
        info!(
            "Loaded {} set, {} attribute and {} position overrides from {}",
            overrides.sets.len(),
            overrides.attributes.len(),
            overrides.positions.len(),
            path.display()
        );

        vocabulary.sets.extend(overrides.sets);
        vocabulary.attributes.extend(overrides.attributes);
        vocabulary.positions.extend(overrides.positions);
        Ok(vocabulary)
    }

    fn from_tables(
        sets: &[(&str, &str)],
        attributes: &[(AttributeId, &str)],
        positions: &[(Position, &str)],
    ) -> Self {
        Self {
            sets: sets
                .iter()
                .map(|(id, key)| (id.to_string(), key.to_string()))
                .collect(),
            attributes: attributes
                .iter()
                .map(|(id, key)| (*id, key.to_string()))
                .collect(),
            positions: positions
                .iter()
                .map(|(id, key)| (*id, key.to_string()))
                .collect(),
        }
    }

    pub fn set(&self, id: &str) -> Option<&str> {
        self.sets.get(id.trim()).map(String::as_str)
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&str> {
        self.attributes.get(&id).map(String::as_str)
    }

    pub fn position(&self, id: Position) -> Option<&str> {
        self.positions.get(&id).map(String::as_str)
    }
}

const MONA_POSITIONS: [(Position, &str); 5] = [
    (Position::Flower, "flower"),
    (Position::Plume, "feather"),
    (Position::Sands, "sand"),
    (Position::Goblet, "cup"),
    (Position::Circlet, "head"),
];

const MONA_ATTRIBUTES: [(AttributeId, &str); 19] = [
    (AttributeId::Hp, "lifeStatic"),
    (AttributeId::HpRate, "lifePercentage"),
    (AttributeId::Atk, "attackStatic"),
    (AttributeId::AtkRate, "attackPercentage"),
    (AttributeId::Def, "defendStatic"),
    (AttributeId::DefRate, "defendPercentage"),
    (AttributeId::CritRate, "critical"),
    (AttributeId::CritDamage, "criticalDamage"),
    (AttributeId::EnergyRecharge, "recharge"),
    (AttributeId::ElementalMastery, "elementalMastery"),
    (AttributeId::Healing, "cureEffect"),
    (AttributeId::PhysicalDamage, "physicalBonus"),
    (AttributeId::AnemoDamage, "windBonus"),
    (AttributeId::GeoDamage, "rockBonus"),
    (AttributeId::ElectroDamage, "thunderBonus"),
    (AttributeId::DendroDamage, "dendroBonus"),
    (AttributeId::HydroDamage, "waterBonus"),
    (AttributeId::PyroDamage, "fireBonus"),
    (AttributeId::CryoDamage, "iceBonus"),
];

const MONA_SETS: [(&str, &str); 42] = [
    ("vourukasha_glow", "vourukashasGlow"),
    ("nymph_dream", "nymphsDream"),
    ("desert_pavilion_chronicle", "desertPavilionChronicle"),
    ("flower_of_paradise_lost", "flowerOfParadiseLost"),
    ("deepwood_memories", "deepwoodMemories"),
    ("gilded_dreams", "gildedDreams"),
    ("vermillion_hereafter", "vermillionHereafter"),
    ("echoes_of_an_offering", "echoesOfAnOffering"),
    ("hust_of_opulent_dreams", "huskOfOpulentDreams"),
    ("ocean_hued_clam", "oceanHuedClam"),
    ("emblem_of_severed_fate", "emblemOfSeveredFate"),
    ("shimenawa_reminiscence", "shimenawaReminiscence"),
    ("tenacity_of_the_millelith", "tenacityOfTheMillelith"),
    ("archaic_petra", "archaicPetra"),
    ("noblesse_oblige", "noblesseOblige"),
    ("pale_flame", "paleFlame"),
    ("retracing_bolide", "retracingBolide"),
    ("thundering_fury", "thunderingFury"),
    ("thunder_smoother", "thunderSmoother"),
    ("crimson_witch", "crimsonWitch"),
    ("lava_walker", "lavaWalker"),
    ("viridescent_venerer", "viridescentVenerer"),
    ("maiden_beloved", "maidenBeloved"),
    ("heart_of_depth", "heartOfDepth"),
    ("blizzard_strayer", "blizzardStrayer"),
    ("wanderer_troupe", "wandererTroupe"),
    ("gladiator_finale", "gladiatorFinale"),
    ("instructor", "instructor"),
    ("berserker", "berserker"),
    ("bloodstained_chivalry", "bloodstainedChivalry"),
    ("brave_heart", "braveHeart"),
    ("defender_will", "defenderWill"),
    ("the_exile", "exile"),
    ("gambler", "gambler"),
    ("martial_artist", "martialArtist"),
    ("resolution_of_sojourner", "resolutionOfSojourner"),
    ("scholar", "scholar"),
    ("tiny_miracle", "tinyMiracle"),
    ("prayers_for_destiny_buffer", "prayersForDestiny"),
    ("prayers_for_illumination", "prayersForIllumination"),
    ("prayers_for_wisdom", "prayersForWisdom"),
    ("prayers_to_springtime", "prayersToSpringtime"),
];

const YUANMO_POSITIONS: [(Position, &str); 5] = [
    (Position::Flower, "flower"),
    (Position::Plume, "plume"),
    (Position::Sands, "sands"),
    (Position::Goblet, "goblet"),
    (Position::Circlet, "circlet"),
];

const YUANMO_ATTRIBUTES: [(AttributeId, &str); 19] = [
    (AttributeId::Hp, "flatHP"),
    (AttributeId::HpRate, "percentHP"),
    (AttributeId::Atk, "flatATK"),
    (AttributeId::AtkRate, "percentATK"),
    (AttributeId::Def, "flatDEF"),
    (AttributeId::DefRate, "percentDEF"),
    (AttributeId::CritRate, "critRate"),
    (AttributeId::CritDamage, "critDamage"),
    (AttributeId::EnergyRecharge, "energyRecharge"),
    (AttributeId::ElementalMastery, "elementalMastery"),
    (AttributeId::Healing, "healingBonus"),
    (AttributeId::PhysicalDamage, "physicalDamageBonus"),
    (AttributeId::AnemoDamage, "anemoDamageBonus"),
    (AttributeId::GeoDamage, "geoDamageBonus"),
    (AttributeId::ElectroDamage, "electroDamageBonus"),
    (AttributeId::DendroDamage, "dendroDamageBonus"),
    (AttributeId::HydroDamage, "hydroDamageBonus"),
    (AttributeId::PyroDamage, "pyroDamageBonus"),
    (AttributeId::CryoDamage, "cryoDamageBonus"),
];

const YUANMO_SETS: [(&str, &str); 42] = [
    ("vourukasha_glow", "VourukashasGlow"),
    ("nymph_dream", "NymphsDream"),
    ("desert_pavilion_chronicle", "DesertPavilionChronicle"),
    ("flower_of_paradise_lost", "FlowerOfParadiseLost"),
    ("deepwood_memories", "DeepwoodMemories"),
    ("gilded_dreams", "GildedDreams"),
    ("vermillion_hereafter", "VermillionHereafter"),
    ("echoes_of_an_offering", "EchoesOfAnOffering"),
    ("hust_of_opulent_dreams", "HuskOfOpulentDreams"),
    ("ocean_hued_clam", "OceanHuedClam"),
    ("emblem_of_severed_fate", "EmblemOfSeveredFate"),
    ("shimenawa_reminiscence", "ShimenawasReminiscence"),
    ("tenacity_of_the_millelith", "TenacityOfTheMillelith"),
    ("archaic_petra", "ArchaicPetra"),
    ("noblesse_oblige", "NoblesseOblige"),
    ("pale_flame", "PaleFlame"),
    ("retracing_bolide", "RetracingBolide"),
    ("thundering_fury", "ThunderingFury"),
    ("thunder_smoother", "Thundersoother"),
    ("crimson_witch", "CrimsonWitchOfFlames"),
    ("lava_walker", "Lavawalker"),
    ("viridescent_venerer", "ViridescentVenerer"),
    ("maiden_beloved", "MaidenBeloved"),
    ("heart_of_depth", "HeartOfDepth"),
    ("blizzard_strayer", "BlizzardStrayer"),
    ("wanderer_troupe", "WanderersTroupe"),
    ("gladiator_finale", "GladiatorsFinale"),
    ("instructor", "Instructor"),
    ("berserker", "Berserker"),
    ("bloodstained_chivalry", "BloodstainedChivalry"),
    ("brave_heart", "BraveHeart"),
    ("defender_will", "DefendersWill"),
    ("the_exile", "TheExile"),
    ("gambler", "Gambler"),
    ("martial_artist", "MartialArtist"),
    ("resolution_of_sojourner", "ResolutionOfSojourner"),
    ("scholar", "Scholar"),
    ("tiny_miracle", "TinyMiracle"),
    ("prayers_for_destiny_buffer", "PrayersForDestiny"),
    ("prayers_for_illumination", "PrayersForIllumination"),
    ("prayers_for_wisdom", "PrayersForWisdom"),
    ("prayers_to_springtime", "PrayersToSpringtime"),
];
