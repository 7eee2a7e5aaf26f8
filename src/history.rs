//! Snapshot persistence for the session, one JSON document under a single
//! `localStorage` key. History is a convenience, not a guarantee: every
//! failure here is logged and otherwise ignored.

use std::collections::HashMap;

use leptos::prelude::window;
use serde::{Deserialize, Serialize};
use web_sys::Storage;

use crate::gateway::FileInfo;
use crate::session::{RestoredEntry, Session};

pub const STORAGE_KEY: &str = "plume-session";
pub const SAVE_DEBOUNCE_MS: i32 = 500;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedFile {
    pub path: String,
    pub name: String,
    pub content: String,
    pub has_unsaved_changes: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub files: HashMap<String, PersistedFile>,
    pub current_file_id: Option<String>,
    pub file_order: Vec<String>,
}

/// Wire shape of the stored document. Early versions persisted `files` as a
/// bare array; the loader still accepts that and pairs entries with
/// `fileOrder` by index, so nothing past `decode` ever sees it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    files: RawFiles,
    #[serde(default)]
    current_file_id: Option<String>,
    #[serde(default)]
    file_order: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFiles {
    Map(HashMap<String, PersistedFile>),
    List(Vec<PersistedFile>),
}

impl Default for RawFiles {
    fn default() -> Self {
        Self::Map(HashMap::new())
    }
}

pub fn snapshot_of(session: &Session) -> SessionSnapshot {
    let mut files = HashMap::new();
    for file in session.files() {
        files.insert(
            file.id.to_string(),
            PersistedFile {
                path: file.path.clone(),
                name: file.name.clone(),
                content: file.content.clone(),
                has_unsaved_changes: file.has_unsaved_changes,
            },
        );
    }
    SessionSnapshot {
        files,
        current_file_id: session.current_file_id().map(|id| id.to_string()),
        file_order: session.files().iter().map(|file| file.id.to_string()).collect(),
    }
}

pub fn encode_session(session: &Session) -> String {
    serde_json::to_string(&snapshot_of(session)).unwrap_or_default()
}

/// Parses a stored document. Malformed input is treated exactly like an
/// absent one.
pub fn decode(raw: &str) -> Option<SessionSnapshot> {
    let raw: RawSnapshot = serde_json::from_str(raw).ok()?;
    let files = match raw.files {
        RawFiles::Map(map) => map,
        RawFiles::List(list) => raw.file_order.iter().cloned().zip(list).collect(),
    };
    Some(SessionSnapshot {
        files,
        current_file_id: raw.current_file_id,
        file_order: raw.file_order,
    })
}

fn storage() -> Option<Storage> {
    window().local_storage().ok().flatten()
}

pub fn write_raw(json: &str) {
    match storage() {
        Some(storage) => {
            if let Err(err) = storage.set_item(STORAGE_KEY, json) {
                leptos::logging::warn!("failed to persist session: {err:?}");
            }
        }
        None => leptos::logging::warn!("localStorage unavailable, session not persisted"),
    }
}

pub fn save_now(session: &Session) {
    write_raw(&encode_session(session));
}

pub fn load() -> Option<SessionSnapshot> {
    let raw = storage()?.get_item(STORAGE_KEY).ok().flatten()?;
    decode(&raw)
}

pub fn clear() {
    if let Some(storage) = storage() {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

/// True for records not worth restoring: never saved and nothing typed.
pub fn is_discardable(record: &PersistedFile) -> bool {
    record.path.is_empty() && record.content.trim().is_empty()
}

/// Merges a persisted record with the fresh on-disk read of its path.
/// A persisted draft (flagged unsaved, text differing from disk) survives
/// the restart; otherwise the disk text wins and the entry comes back clean.
pub fn reconcile(old_id: &str, record: &PersistedFile, on_disk: FileInfo) -> RestoredEntry {
    let keep_draft = record.has_unsaved_changes && record.content != on_disk.content;
    RestoredEntry {
        old_id: old_id.to_string(),
        path: on_disk.path,
        name: on_disk.name,
        content: if keep_draft {
            record.content.clone()
        } else {
            on_disk.content
        },
        has_unsaved_changes: keep_draft,
    }
}

/// Restores an untitled record as it was persisted.
pub fn restore_untitled(old_id: &str, record: &PersistedFile) -> RestoredEntry {
    RestoredEntry {
        old_id: old_id.to_string(),
        path: String::new(),
        name: if record.name.is_empty() {
            "Untitled".to_string()
        } else {
            record.name.clone()
        },
        content: record.content.clone(),
        has_unsaved_changes: record.has_unsaved_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, content: &str, unsaved: bool) -> PersistedFile {
        PersistedFile {
            path: path.to_string(),
            name: crate::gateway::file_name_of(path),
            content: content.to_string(),
            has_unsaved_changes: unsaved,
        }
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut session = Session::new();
        session.adopt(FileInfo::new("/notes/a.md", "alpha"));
        session.create_new_file();
        session.update_content("draft");

        let json = encode_session(&session);
        let decoded = decode(&json).unwrap();

        assert_eq!(decoded.file_order.len(), 2);
        assert_eq!(decoded.files.len(), 2);
        assert_eq!(decoded.current_file_id, decoded.file_order.get(1).cloned());

        let first = &decoded.files[&decoded.file_order[0]];
        assert_eq!(first.path, "/notes/a.md");
        assert!(!first.has_unsaved_changes);

        let second = &decoded.files[&decoded.file_order[1]];
        assert_eq!(second.path, "");
        assert_eq!(second.content, "draft");
        assert!(second.has_unsaved_changes);
    }

    #[test]
    fn snapshot_uses_the_documented_field_names() {
        let mut session = Session::new();
        session.adopt(FileInfo::new("/notes/a.md", "alpha"));
        let json = encode_session(&session);

        assert!(json.contains("\"fileOrder\""));
        assert!(json.contains("\"currentFileId\""));
        assert!(json.contains("\"hasUnsavedChanges\""));
    }

    #[test]
    fn decode_accepts_the_legacy_array_shape() {
        let legacy = r#"{
            "files": [
                {"path": "/notes/a.md", "name": "a.md", "content": "a", "hasUnsavedChanges": false},
                {"path": "", "name": "Untitled", "content": "b", "hasUnsavedChanges": true}
            ],
            "currentFileId": "f2",
            "fileOrder": ["f1", "f2"]
        }"#;

        let snapshot = decode(legacy).unwrap();
        assert_eq!(snapshot.files["f1"].path, "/notes/a.md");
        assert_eq!(snapshot.files["f2"].content, "b");
        assert_eq!(snapshot.current_file_id.as_deref(), Some("f2"));
    }

    #[test]
    fn decode_rejects_malformed_documents() {
        assert!(decode("not json").is_none());
        assert!(decode("42").is_none());
        assert!(decode(r#"{"files": 3}"#).is_none());
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let snapshot = decode("{}").unwrap();
        assert!(snapshot.files.is_empty());
        assert!(snapshot.file_order.is_empty());
        assert_eq!(snapshot.current_file_id, None);
    }

    #[test]
    fn blank_untitled_records_are_discardable() {
        assert!(is_discardable(&record("", "", false)));
        assert!(is_discardable(&record("", "  \n", true)));
        assert!(!is_discardable(&record("", "draft", false)));
        assert!(!is_discardable(&record("/notes/a.md", "", false)));
    }

    #[test]
    fn reconcile_keeps_a_differing_draft_as_unsaved() {
        let persisted = record("/notes/a.md", "edited but never saved", true);
        let entry = reconcile("f1", &persisted, FileInfo::new("/notes/a.md", "disk text"));

        assert_eq!(entry.content, "edited but never saved");
        assert!(entry.has_unsaved_changes);
        assert_eq!(entry.name, "a.md");
    }

    #[test]
    fn reconcile_drops_a_stale_unsaved_flag_when_texts_match() {
        let persisted = record("/notes/a.md", "same", true);
        let entry = reconcile("f1", &persisted, FileInfo::new("/notes/a.md", "same"));

        assert_eq!(entry.content, "same");
        assert!(!entry.has_unsaved_changes);
    }

    #[test]
    fn reconcile_prefers_disk_for_clean_records() {
        let persisted = record("/notes/a.md", "old snapshot", false);
        let entry = reconcile("f1", &persisted, FileInfo::new("/notes/a.md", "newer on disk"));

        assert_eq!(entry.content, "newer on disk");
        assert!(!entry.has_unsaved_changes);
    }

    #[test]
    fn restore_round_trip_preserves_path_content_and_flag() {
        let mut session = Session::new();
        session.adopt(FileInfo::new("/notes/a.md", "alpha"));
        session.create_new_file();
        session.update_content("draft");

        let snapshot = decode(&encode_session(&session)).unwrap();
        let mut entries = Vec::new();
        for id in &snapshot.file_order {
            let record = &snapshot.files[id];
            if is_discardable(record) {
                continue;
            }
            if record.path.is_empty() {
                entries.push(restore_untitled(id, record));
            } else {
                // Disk still holds what was last saved.
                entries.push(reconcile(
                    id,
                    record,
                    FileInfo::new(record.path.clone(), record.content.clone()),
                ));
            }
        }

        let mut restored = Session::new();
        restored.restore(entries, snapshot.current_file_id.as_deref());

        let tuples: Vec<_> = restored
            .files()
            .iter()
            .map(|f| (f.path.clone(), f.content.clone(), f.has_unsaved_changes))
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("/notes/a.md".to_string(), "alpha".to_string(), false),
                (String::new(), "draft".to_string(), true),
            ]
        );
        assert!(restored.current_file().unwrap().is_untitled());
    }
}
