//! Artifact records and the text-to-field mapping that produces them.

pub mod mapper;
pub mod parse;
pub mod record;
pub mod tables;

pub use mapper::{DecodedArtifact, FieldMapper};
pub use record::{ArtifactRecord, AttributeId, LockState, Position, SubAttribute};
pub use tables::Localization;
