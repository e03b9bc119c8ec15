//! Slot-bucketed export document.

use serde::{Deserialize, Serialize};

use super::{SchemaVocabulary, Translated};
use crate::artifact::Position;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonaTag {
    pub name: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonaArtifact {
    pub set_name: String,
    pub position: String,
    pub main_tag: MonaTag,
    pub normal_tags: Vec<MonaTag>,
    pub omit: bool,
    pub level: u8,
    pub star: u8,
    pub equip: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonaDocument {
    pub version: u32,
    pub flower: Vec<MonaArtifact>,
    pub feather: Vec<MonaArtifact>,
    pub sand: Vec<MonaArtifact>,
    pub cup: Vec<MonaArtifact>,
    pub head: Vec<MonaArtifact>,
}

impl Default for MonaDocument {
    fn default() -> Self {
        Self {
            version: 1,
            flower: Vec::new(),
            feather: Vec::new(),
            sand: Vec::new(),
            cup: Vec::new(),
            head: Vec::new(),
        }
    }
}

impl MonaDocument {
    pub fn len(&self) -> usize {
        self.flower.len() + self.feather.len() + self.sand.len() + self.cup.len() + self.head.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, position: Position) -> &mut Vec<MonaArtifact> {
        match position {
            Position::Flower => &mut self.flower,
            Position::Plume => &mut self.feather,
            Position::Sands => &mut self.sand,
            Position::Goblet => &mut self.cup,
            Position::Circlet => &mut self.head,
        }
    }
}

pub(super) fn encode(records: &[Translated<'_>], vocabulary: &SchemaVocabulary) -> MonaDocument {
    let mut document = MonaDocument::default();

    for t in records {
        let normal_tags = t
            .record
            .sub_attrs
            .iter()
            .filter_map(|sub| {
                Some(MonaTag {
                    name: vocabulary.attribute(sub.attr)?.to_string(),
                    value: sub.value,
                })
            })
            .collect();

        document.bucket_mut(t.record.position).push(MonaArtifact {
            set_name: t.set.to_string(),
            position: t.position.to_string(),
            main_tag: MonaTag {
                name: t.main_attr.to_string(),
                value: t.record.main_value,
            },
            normal_tags,
            omit: false,
            level: t.record.level,
            star: t.record.star,
            equip: t.record.equipper.clone(),
        });
    }

    document
}
