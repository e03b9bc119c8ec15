//! Localized reference strings for decoding the detail panel.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::record::{AttributeId, Position};

/// One reference string and the id it resolves to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry<T> {
    pub text: String,
    pub id: T,
}

/// Ordered substring table: the first entry whose text occurs in the input wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable<T> {
    entries: Vec<LookupEntry<T>>,
}

impl<T: Clone> LookupTable<T> {
    pub fn new(entries: Vec<LookupEntry<T>>) -> Self {
        Self { entries }
    }

    pub fn find(&self, input: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|e| !e.text.is_empty() && input.contains(e.text.as_str()))
            .map(|e| e.id.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn table<T: Clone>(pairs: &[(&str, T)]) -> LookupTable<T> {
    LookupTable::new(
        pairs
            .iter()
            .map(|(text, id)| LookupEntry {
                text: text.to_string(),
                id: id.clone(),
            })
            .collect(),
    )
}

/// All the game-language strings the field mapper needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    pub positions: LookupTable<Position>,
    pub attributes: LookupTable<AttributeId>,
    pub sets: LookupTable<String>,
    pub unlocked: String,
    pub locked: String,
    pub equipped_suffix: String,
    pub star_glyph: char,
}

impl Localization {
    /// Reads a full localization from JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read localization {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid localization {}", path.display()))
    }

    /// Simplified Chinese client strings.
    pub fn zh_cn() -> Self {
        use AttributeId::*;

        Self {
            positions: table(&[
                ("生之花", Position::Flower),
                ("死之羽", Position::Plume),
                ("时之沙", Position::Sands),
                ("空之杯", Position::Goblet),
                ("理之冠", Position::Circlet),
            ]),
            attributes: table(&[
                ("暴击伤害", CritDamage),
                ("暴击率", CritRate),
                ("元素充能效率", EnergyRecharge),
                ("元素精通", ElementalMastery),
                ("治疗加成", Healing),
                ("物理伤害加成", PhysicalDamage),
                ("风元素伤害加成", AnemoDamage),
                ("岩元素伤害加成", GeoDamage),
                ("雷元素伤害加成", ElectroDamage),
                ("草元素伤害加成", DendroDamage),
                ("水元素伤害加成", HydroDamage),
                ("火元素伤害加成", PyroDamage),
                ("冰元素伤害加成", CryoDamage),
                ("生命值", Hp),
                ("攻击力", Atk),
                ("防御力", Def),
            ]),
            sets: table(
                &SET_NAMES_ZH
                    .iter()
                    .map(|(zh, id)| (*zh, id.to_string()))
                    .collect::<Vec<_>>(),
            ),
            unlocked: "开的锁".to_string(),
            locked: "关的锁".to_string(),
            equipped_suffix: "已装备".to_string(),
            star_glyph: '★',
        }
    }
}

impl Default for Localization {
    fn default() -> Self {
        Self::zh_cn()
    }
}

/// Set display names and their ids.
pub const SET_NAMES_ZH: [(&str, &str); 42] = [
    ("花海甘露之光", "vourukasha_glow"),
    ("水仙之梦", "nymph_dream"),
    ("沙上楼阁史话", "desert_pavilion_chronicle"),
    ("乐园遗落之花", "flower_of_paradise_lost"),
    ("深林的记忆", "deepwood_memories"),
    ("饰金之梦", "gilded_dreams"),
    ("辰砂往生录", "vermillion_hereafter"),
    ("来歆余响", "echoes_of_an_offering"),
    ("华馆梦醒形骸记", "hust_of_opulent_dreams"),
    ("海染砗磲", "ocean_hued_clam"),
    ("绝缘之旗印", "emblem_of_severed_fate"),
    ("追忆之注连", "shimenawa_reminiscence"),
    ("千岩牢固", "tenacity_of_the_millelith"),
    ("悠古的磐岩", "archaic_petra"),
    ("昔日宗室之仪", "noblesse_oblige"),
    ("苍白之火", "pale_flame"),
    ("逆飞的流星", "retracing_bolide"),
    ("如雷的盛怒", "thundering_fury"),
    ("平息鸣雷的尊者", "thunder_smoother"),
    ("炽烈的炎之魔女", "crimson_witch"),
    ("渡过烈火的贤人", "lava_walker"),
    ("翠绿之影", "viridescent_venerer"),
    ("被怜爱的少女", "maiden_beloved"),
    ("沉沦之心", "heart_of_depth"),
    ("冰风迷途的勇士", "blizzard_strayer"),
    ("流浪大地的乐团", "wanderer_troupe"),
    ("角斗士的终幕礼", "gladiator_finale"),
    ("教官", "instructor"),
    ("战狂", "berserker"),
    ("染血的骑士道", "bloodstained_chivalry"),
    ("勇士之心", "brave_heart"),
    ("守护之心", "defender_will"),
    ("流放者", "the_exile"),
    ("赌徒", "gambler"),
    ("武人", "martial_artist"),
    ("行者之心", "resolution_of_sojourner"),
    ("学士", "scholar"),
    ("奇迹", "tiny_miracle"),
    ("祭水之人", "prayers_for_destiny_buffer"),
    ("祭火之人", "prayers_for_illumination"),
    ("祭雷之人", "prayers_for_wisdom"),
    ("祭冰之人", "prayers_to_springtime"),
];
