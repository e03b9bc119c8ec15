//! Maps recognized detail-panel text onto typed artifact fields.

use regex::Regex;

use super::parse::{NumberParser, count_stars};
use super::record::{
    ArtifactRecord, AttributeId, LockState, Position, SubAttribute, rank,
};
use super::tables::Localization;

/// Fixed boxes before the text rows: position, level, main attribute, main
/// value, star, lock, equipper.
pub const INFO_FIELDS: usize = 7;
pub const MAX_SUB_ATTRS: usize = 4;

/// Everything that could be read from one detail panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedArtifact {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub star: Option<u8>,
    pub level: Option<u8>,
    pub lock: LockState,
    pub main_attr: Option<AttributeId>,
    pub main_value: Option<f64>,
    pub sub_attrs: Vec<SubAttribute>,
    pub equipper: String,
    /// Recognized strings in box order.
    pub raw: Vec<String>,
}

impl DecodedArtifact {
    /// Rank key when both star and level were read.
    pub fn rank(&self) -> Option<u32> {
        Some(rank(self.star?, self.level?))
    }

    /// The record, if every required field resolved.
    pub fn to_record(&self) -> Option<ArtifactRecord> {
        Some(ArtifactRecord {
            name: self.name.clone()?,
            position: self.position?,
            star: self.star?,
            level: self.level?,
            lock: self.lock,
            main_attr: self.main_attr?,
            main_value: self.main_value?,
            sub_attrs: self.sub_attrs.clone(),
            equipper: self.equipper.clone(),
        })
    }
}

pub struct FieldMapper {
    loc: Localization,
    numbers: NumberParser,
    equipped: Regex,
}

impl FieldMapper {
    pub fn new(loc: Localization) -> Result<Self, regex::Error> {
        let equipped = Regex::new(&format!("(.*){}", regex::escape(&loc.equipped_suffix)))?;
        Ok(Self {
            loc,
            numbers: NumberParser::new()?,
            equipped,
        })
    }

    pub fn numbers(&self) -> &NumberParser {
        &self.numbers
    }

    /// Decodes `texts`, laid out as the calibrated layout's info boxes.
    pub fn map(&self, texts: &[String]) -> DecodedArtifact {
        let field = |i: usize| texts.get(i).map(String::as_str).unwrap_or("");

        let main_value = self.numbers.parse_float(field(3));
        let main_attr = self
            .loc
            .attributes
            .find(field(2))
            .map(|attr| match main_value {
                Some(value) => attr.corrected_for(value),
                None => attr,
            });

        let lock_text = field(5);
        let lock = if lock_text.contains(self.loc.unlocked.as_str()) {
            LockState::Unlocked
        } else if lock_text.contains(self.loc.locked.as_str()) {
            LockState::Locked
        } else {
            LockState::Unknown
        };

        let equipper = self
            .equipped
            .captures(field(6))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let (name, sub_attrs) = self.map_text_rows(texts.get(INFO_FIELDS..).unwrap_or(&[]));

        DecodedArtifact {
            name,
            position: self.loc.positions.find(field(0)),
            star: count_stars(field(4), self.loc.star_glyph),
            level: self.numbers.parse_level(field(1)),
            lock,
            main_attr,
            main_value,
            sub_attrs,
            equipper,
            raw: texts.to_vec(),
        }
    }

    /// Sub-attribute rows precede the set name; the set-bonus rows after it are ignored.
    fn map_text_rows(&self, rows: &[String]) -> (Option<String>, Vec<SubAttribute>) {
        let mut sub_attrs = Vec::new();

        for row in rows {
            if let Some(name) = self.loc.sets.find(row) {
                return (Some(name), sub_attrs);
            }
            if sub_attrs.len() == MAX_SUB_ATTRS {
                continue;
            }
            let Some(attr) = self.loc.attributes.find(row) else {
                continue;
            };
            if let Some(value) = self.numbers.parse_float(row).filter(|v| *v > 0.0) {
                sub_attrs.push(SubAttribute {
                    attr: attr.corrected_for(value),
                    value,
                });
            }
        }

        (None, sub_attrs)
    }
}
