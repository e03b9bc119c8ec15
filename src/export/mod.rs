//! Encoding of scanned records into destination schemas.
//!
//! - `none`: canonical records, unchanged
//! - `mona`: records bucketed by slot with nested main/sub tags
//! - `yuanmo`: one flat array, four substat slots per record

pub mod mona;
pub mod vocabulary;
pub mod writer;
pub mod yuanmo;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::ArtifactRecord;
pub use mona::MonaDocument;
pub use vocabulary::SchemaVocabulary;
pub use writer::write_output;
pub use yuanmo::YuanmoArtifact;

/// Rarity and level window the destination tools model.
const MIN_EXPORT_STAR: u8 = 4;
const MAX_EXPORT_LEVEL: u8 = 20;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    None,
    #[default]
    Mona,
    Yuanmo,
}

impl ExportFormat {
    /// Name used in config files and vocabulary file names.
    pub fn tag(&self) -> &'static str {
        match self {
            ExportFormat::None => "none",
            ExportFormat::Mona => "mona",
            ExportFormat::Yuanmo => "yuanmo",
        }
    }
}

/// Encoded scan result as delivered with the terminal event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportDocument {
    Canonical(Vec<ArtifactRecord>),
    Mona(MonaDocument),
    Yuanmo(Vec<YuanmoArtifact>),
}

impl ExportDocument {
    pub fn len(&self) -> usize {
        match self {
            ExportDocument::Canonical(records) => records.len(),
            ExportDocument::Mona(document) => document.len(),
            ExportDocument::Yuanmo(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record that passed the schema checks, with its required ids translated.
pub(crate) struct Translated<'a> {
    pub record: &'a ArtifactRecord,
    pub set: &'a str,
    pub position: &'a str,
    pub main_attr: &'a str,
}

fn exportable(record: &ArtifactRecord) -> bool {
    record.main_value != 0.0 && record.star >= MIN_EXPORT_STAR && record.level <= MAX_EXPORT_LEVEL
}

fn translate<'a>(
    record: &'a ArtifactRecord,
    vocabulary: &'a SchemaVocabulary,
) -> Option<Translated<'a>> {
    if !exportable(record) {
        return None;
    }
    Some(Translated {
        record,
        set: vocabulary.set(&record.name)?,
        position: vocabulary.position(record.position)?,
        main_attr: vocabulary.attribute(record.main_attr)?,
    })
}

/// Encodes `records` into `format`. Records the schema cannot express are dropped.
pub fn encode(
    records: &[ArtifactRecord],
    format: ExportFormat,
    vocabulary: &SchemaVocabulary,
) -> ExportDocument {
    if format == ExportFormat::None {
        return ExportDocument::Canonical(records.to_vec());
    }

    let translated: Vec<Translated<'_>> = records
        .iter()
        .filter_map(|record| {
            let translated = translate(record, vocabulary);
            if translated.is_none() {
                debug!(
                    "Dropping {} {}★ +{} from {} export",
                    record.name,
                    record.star,
                    record.level,
                    format.tag()
                );
            }
            translated
        })
        .collect();

    match format {
        ExportFormat::Mona => ExportDocument::Mona(mona::encode(&translated, vocabulary)),
        ExportFormat::Yuanmo => ExportDocument::Yuanmo(yuanmo::encode(&translated, vocabulary)),
        ExportFormat::None => ExportDocument::Canonical(records.to_vec()),
    }
}
