use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uitrack_core::prelude::{IoResultExt, RunLocation, StepId, TrackError, TrackResult};
use uitrack_model::{EvidenceKind, EvidenceMeta, EVIDENCE_META_SUFFIX};
use walkdir::WalkDir;

use crate::storage::{write_atomic, write_json};

/// What was written for a piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub run_id: String,
    pub step_id: StepId,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub file_size: u64,
    pub captured_at: DateTime<Utc>,
}

/// Evidence payload for one artifact, before it is written.
pub struct NewEvidence<'a> {
    pub kind: &'a EvidenceKind,
    pub name: &'a str,
    pub data: &'a str,
    pub metadata: Option<&'a serde_json::Value>,
}

/// Reads and writes evidence under `step-NN/evidence/` of a run.
#[derive(Debug, Default, Clone)]
pub struct EvidenceStore;

impl EvidenceStore {
    pub fn new() -> Self {
        Self
    }

    /// Write an evidence file and its `.meta.json` companion.
    ///
    /// Screenshots are copied from the absolute path given in `data`. Any other kind is written
    /// verbatim from `data`. The caller is responsible for checking that the run is still open.
    pub fn record(
        &self,
        run: &RunLocation,
        step_id: StepId,
        evidence: NewEvidence<'_>,
    ) -> TrackResult<EvidenceRecord> {
        let content = if evidence.kind.copies_from_path() {
            read_screenshot_source(evidence.data)?
        } else {
            evidence.data.as_bytes().to_vec()
        };

        let evidence_dir = run.evidence_dir(step_id);
        let file_name = format!("{}.{}", evidence.name, evidence.kind.extension());
        let path = evidence_dir.join(&file_name);
        write_atomic(&path, &content)?;

        let meta = EvidenceMeta {
            run_id: run.run_id.clone(),
            step_id,
            kind: evidence.kind.clone(),
            name: evidence.name.to_string(),
            captured_at: Utc::now(),
            file_size: content.len() as u64,
            metadata: evidence
                .metadata
                .cloned()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        };
        write_json(
            &evidence_dir.join(format!("{}{EVIDENCE_META_SUFFIX}", evidence.name)),
            &meta,
        )?;

        log::debug!(
            "Recorded {} evidence {} for run {} step {}",
            meta.kind,
            path.display(),
            run.run_id,
            step_id
        );

        Ok(EvidenceRecord {
            run_id: meta.run_id,
            step_id,
            kind: meta.kind,
            name: meta.name,
            file_name,
            path,
            file_size: meta.file_size,
            captured_at: meta.captured_at,
        })
    }

    /// Evidence file names for a step, excluding metadata files, sorted by name. A step with no
    /// evidence directory has no evidence.
    pub fn list(&self, run: &RunLocation, step_id: StepId) -> TrackResult<Vec<String>> {
        let evidence_dir = run.evidence_dir(step_id);
        if !evidence_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&evidence_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry
                .map_err(std::io::Error::from)
                .io_err("list evidence in", &evidence_dir)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(EVIDENCE_META_SUFFIX) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Absolute paths only, either Unix-rooted or with a Windows drive letter.
pub(crate) fn is_absolute_path(data: &str) -> bool {
    if data.starts_with('/') {
        return true;
    }
    let bytes = data.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn read_screenshot_source(data: &str) -> TrackResult<Vec<u8>> {
    if !is_absolute_path(data) {
        return Err(TrackError::EvidencePath(format!(
            "screenshot data must be an absolute path to an image file (e.g. /tmp/shot.png or C:\\shots\\shot.png), got `{}`",
            truncate(data, 64)
        )));
    }

    std::fs::read(data).map_err(|e| {
        TrackError::EvidencePath(format!("cannot read screenshot source {data}: {e}"))
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &s[..index]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uitrack_core::prelude::ProjectLayout;

    fn run(dir: &tempfile::TempDir) -> RunLocation {
        ProjectLayout::new(dir.path()).run_location("login", "r1")
    }

    fn step(n: u64) -> StepId {
        StepId::new(n).unwrap()
    }

    #[test]
    fn recognises_absolute_paths() {
        assert!(is_absolute_path("/tmp/shot.png"));
        assert!(is_absolute_path("C:\\shots\\shot.png"));
        assert!(is_absolute_path("d:/shots/shot.png"));
        assert!(!is_absolute_path("shot.png"));
        assert!(!is_absolute_path("./shot.png"));
        assert!(!is_absolute_path("C:shot.png"));
        assert!(!is_absolute_path("iVBORw0KGgoAAAANSUhEUg"));
    }

    #[test]
    fn writes_text_evidence_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let run = run(&dir);
        let kind = EvidenceKind::ConsoleLog;
        let metadata = serde_json::json!({"level": "warn"});

        let record = EvidenceStore::new()
            .record(
                &run,
                step(3),
                NewEvidence {
                    kind: &kind,
                    name: "console",
                    data: "héllo",
                    metadata: Some(&metadata),
                },
            )
            .unwrap();

        assert_eq!(record.file_name, "console.txt");
        assert_eq!(record.file_size, "héllo".len() as u64);
        assert_eq!(std::fs::read_to_string(&record.path).unwrap(), "héllo");

        let meta: EvidenceMeta = serde_json::from_slice(
            &std::fs::read(run.evidence_dir(step(3)).join("console.meta.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta.step_id.to_string(), "03");
        assert_eq!(meta.file_size, 6);
        assert_eq!(meta.metadata, metadata);
    }

    #[test]
    fn copies_screenshots_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let run = run(&dir);
        let source = dir.path().join("source.png");
        let bytes: Vec<u8> = (0..=255u8).collect();
        std::fs::write(&source, &bytes).unwrap();
        let kind = EvidenceKind::Screenshot;

        let record = EvidenceStore::new()
            .record(
                &run,
                step(1),
                NewEvidence {
                    kind: &kind,
                    name: "home",
                    data: source.to_str().unwrap(),
                    metadata: None,
                },
            )
            .unwrap();

        assert_eq!(record.file_name, "home.png");
        assert_eq!(record.file_size, 256);
        assert_eq!(std::fs::read(&record.path).unwrap(), bytes);
    }

    #[test]
    fn rejects_screenshot_data_that_is_not_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let kind = EvidenceKind::Screenshot;

        let err = EvidenceStore::new()
            .record(
                &run(&dir),
                step(1),
                NewEvidence {
                    kind: &kind,
                    name: "home",
                    data: "iVBORw0KGgoAAAANSUhEUg==",
                    metadata: None,
                },
            )
            .unwrap_err();

        assert_eq!(err.kind(), "EvidencePathError");
        assert!(err.to_string().contains("absolute path"), "{err}");
    }

    #[test]
    fn unreadable_screenshot_source_is_a_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let kind = EvidenceKind::Screenshot;
        let missing = dir.path().join("missing.png");

        let err = EvidenceStore::new()
            .record(
                &run(&dir),
                step(1),
                NewEvidence {
                    kind: &kind,
                    name: "home",
                    data: missing.to_str().unwrap(),
                    metadata: None,
                },
            )
            .unwrap_err();

        assert_eq!(err.kind(), "EvidencePathError");
    }

    #[test]
    fn lists_evidence_without_metadata_files() {
        let dir = tempfile::tempdir().unwrap();
        let run = run(&dir);
        let store = EvidenceStore::new();
        assert!(store.list(&run, step(2)).unwrap().is_empty());

        for (kind, name) in [(EvidenceKind::HtmlSnapshot, "page"), (EvidenceKind::Custom, "cart")] {
            store
                .record(
                    &run,
                    step(2),
                    NewEvidence {
                        kind: &kind,
                        name,
                        data: "{}",
                        metadata: None,
                    },
                )
                .unwrap();
        }

        assert_eq!(
            store.list(&run, step(2)).unwrap(),
            vec!["cart.json".to_string(), "page.html".to_string()]
        );
    }
}
