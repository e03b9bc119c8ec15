//! JSON output file.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use super::ExportDocument;

/// Writes `document` as pretty-printed UTF-8 JSON, creating parent directories.
pub fn write_output(document: &ExportDocument, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json =
        serde_json::to_string_pretty(document).context("Failed to serialize records to JSON")?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    file.write_all(json.as_bytes())
        .context("Failed to write output data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactRecord, AttributeId, LockState, Position};
    use tempfile::tempdir;

    #[test]
    fn test_write_output() {
        let document = ExportDocument::Canonical(vec![ArtifactRecord {
            name: "gladiator_finale".to_string(),
            position: Position::Flower,
            star: 5,
            level: 20,
            lock: LockState::Unlocked,
            main_attr: AttributeId::Hp,
            main_value: 4780.0,
            sub_attrs: vec![],
            equipper: "神里绫华".to_string(),
        }]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("export").join("output.json");
        write_output(&document, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"name\": \"gladiator_finale\""));
        assert!(content.contains("\"main_attr\": \"hp\""));
        assert!(content.contains("神里绫华"));
    }
}
