//! Flat export array with four fixed substat slots.

use serde::{Deserialize, Serialize};

use super::{SchemaVocabulary, Translated};

/// Type written into unused substat slots.
pub const PLACEHOLDER_SUBSTAT: &str = "critDamage";
const SUBSTAT_SLOTS: usize = 4;
/// Lock mark the destination expects on imported records.
const MARK: &str = "none";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YuanmoArtifact {
    pub as_key: String,
    pub rarity: u8,
    pub slot: String,
    pub level: u8,
    pub main_stat: String,
    pub mark: String,
    pub sub_stat1_type: String,
    pub sub_stat1_value: f64,
    pub sub_stat2_type: String,
    pub sub_stat2_value: f64,
    pub sub_stat3_type: String,
    pub sub_stat3_value: f64,
    pub sub_stat4_type: String,
    pub sub_stat4_value: f64,
}

pub(super) fn encode(records: &[Translated<'_>], vocabulary: &SchemaVocabulary) -> Vec<YuanmoArtifact> {
    records
        .iter()
        .map(|t| {
            let subs: Vec<(&str, f64)> = t
                .record
                .sub_attrs
                .iter()
                .filter_map(|sub| Some((vocabulary.attribute(sub.attr)?, sub.value)))
                .take(SUBSTAT_SLOTS)
                .collect();
            let slot = |i: usize| match subs.get(i) {
                Some((name, value)) => (name.to_string(), *value),
                None => (PLACEHOLDER_SUBSTAT.to_string(), 0.0),
            };
            let (sub_stat1_type, sub_stat1_value) = slot(0);
            let (sub_stat2_type, sub_stat2_value) = slot(1);
            let (sub_stat3_type, sub_stat3_value) = slot(2);
            let (sub_stat4_type, sub_stat4_value) = slot(3);

            YuanmoArtifact {
                as_key: t.set.to_string(),
                rarity: t.record.star,
                slot: t.position.to_string(),
                level: t.record.level,
                main_stat: t.main_attr.to_string(),
                mark: MARK.to_string(),
                sub_stat1_type,
                sub_stat1_value,
                sub_stat2_type,
                sub_stat2_value,
                sub_stat3_type,
                sub_stat3_value,
                sub_stat4_type,
                sub_stat4_value,
            }
        })
        .collect()
}
