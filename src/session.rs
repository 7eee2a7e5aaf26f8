//! The multi-document session: which files are open, which one is shown,
//! and which of them carry unsaved edits.
//!
//! Everything here is a synchronous state transition. The async halves of
//! open/save/load live in the shell, which resolves entries by id again
//! after every await before applying a transition.

use std::fmt;

use crate::gateway::{self, FileInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// One file held in the session. `path` is empty while the file has never
/// been saved; `content` is authoritative over the disk once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenFile {
    pub id: FileId,
    pub path: String,
    pub name: String,
    pub content: String,
    pub has_unsaved_changes: bool,
}

impl OpenFile {
    pub fn is_untitled(&self) -> bool {
        self.path.is_empty()
    }

    fn path_key(&self) -> Option<String> {
        (!self.path.is_empty()).then(|| gateway::normalize_path_key(&self.path))
    }
}

/// A file coming back from a persisted snapshot, already reconciled against
/// the disk. `old_id` is the id it carried in the snapshot; the session
/// assigns a fresh one on restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoredEntry {
    pub old_id: String,
    pub path: String,
    pub name: String,
    pub content: String,
    pub has_unsaved_changes: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    files: Vec<OpenFile>,
    current_file_id: Option<FileId>,
    last_selected_id: Option<FileId>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[OpenFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn current_file_id(&self) -> Option<FileId> {
        self.current_file_id
    }

    pub fn current_file(&self) -> Option<&OpenFile> {
        self.current_file_id.and_then(|id| self.find(id))
    }

    pub fn find(&self, id: FileId) -> Option<&OpenFile> {
        self.files.iter().find(|file| file.id == id)
    }

    fn alloc_id(&mut self) -> FileId {
        self.next_id += 1;
        FileId(self.next_id)
    }

    /// Appends a fresh untitled file and selects it.
    pub fn create_new_file(&mut self) -> FileId {
        let id = self.alloc_id();
        self.files.push(OpenFile {
            id,
            path: String::new(),
            name: "Untitled".to_string(),
            content: String::new(),
            has_unsaved_changes: false,
        });
        self.select_file(id);
        id
    }

    /// Takes in a file read from disk. A file whose path is already open is
    /// never duplicated: the existing entry is selected instead.
    pub fn adopt(&mut self, info: FileInfo) -> FileId {
        let key = gateway::normalize_path_key(&info.path);
        if let Some(existing) = self
            .files
            .iter()
            .find(|file| file.path_key().as_deref() == Some(key.as_str()))
        {
            let id = existing.id;
            self.select_file(id);
            return id;
        }

        let id = self.alloc_id();
        self.files.push(OpenFile {
            id,
            path: info.path,
            name: info.name,
            content: info.content,
            has_unsaved_changes: false,
        });
        self.select_file(id);
        id
    }

    /// Selects the open entry whose path matches `key`, if any.
    pub fn select_existing_path(&mut self, key: &str) -> bool {
        let found = self
            .files
            .iter()
            .find(|file| file.path_key().as_deref() == Some(key))
            .map(|file| file.id);
        match found {
            Some(id) => {
                self.select_file(id);
                true
            }
            None => false,
        }
    }

    /// Replaces the selected file's content. Every edit marks the file
    /// unsaved, even when the new text equals the old.
    pub fn update_content(&mut self, text: impl Into<String>) {
        let Some(id) = self.current_file_id else {
            return;
        };
        if let Some(file) = self.files.iter_mut().find(|file| file.id == id) {
            file.content = text.into();
            file.has_unsaved_changes = true;
        }
    }

    pub fn select_file(&mut self, id: FileId) {
        if self.files.iter().any(|file| file.id == id) {
            self.last_selected_id = self.current_file_id;
            self.current_file_id = Some(id);
        }
    }

    /// Records a completed save of `id` to `path`. Returns false when the
    /// entry no longer exists (it was closed while the dialog was up).
    ///
    /// If a *different* entry already holds that path, the saved entry
    /// supersedes it: the older duplicate is dropped and, if it was
    /// selected, selection moves to the survivor. Last save wins.
    pub fn apply_save(&mut self, id: FileId, path: String) -> bool {
        if !self.files.iter().any(|file| file.id == id) {
            return false;
        }

        let key = gateway::normalize_path_key(&path);
        if let Some(duplicate) = self
            .files
            .iter()
            .position(|file| file.id != id && file.path_key().as_deref() == Some(key.as_str()))
        {
            let removed = self.files.remove(duplicate);
            if self.current_file_id == Some(removed.id) {
                self.current_file_id = Some(id);
            }
            if self.last_selected_id == Some(removed.id) {
                self.last_selected_id = None;
            }
        }

        if let Some(file) = self.files.iter_mut().find(|file| file.id == id) {
            file.name = gateway::file_name_of(&path);
            file.path = path;
            file.has_unsaved_changes = false;
        }
        true
    }

    /// Removes `id` from the session. Refused (returns false) when the
    /// entry has unsaved changes and `force` is not set.
    ///
    /// When the selected file goes away, selection falls back to the
    /// previously selected file if it is still open, then to the first
    /// remaining file, then to nothing.
    pub fn close_file(&mut self, id: FileId, force: bool) -> bool {
        let Some(index) = self.files.iter().position(|file| file.id == id) else {
            return true;
        };
        if self.files[index].has_unsaved_changes && !force {
            return false;
        }

        self.files.remove(index);
        if self.last_selected_id == Some(id) {
            self.last_selected_id = None;
        }
        if self.current_file_id == Some(id) {
            self.current_file_id = self
                .last_selected_id
                .filter(|last| self.files.iter().any(|file| file.id == *last))
                .or_else(|| self.files.first().map(|file| file.id));
        }
        true
    }

    /// Repopulates the session from reconciled snapshot entries. Fresh ids
    /// are assigned in order; the persisted selection is remapped through
    /// them and falls back to the first restored entry.
    pub fn restore(&mut self, entries: Vec<RestoredEntry>, persisted_current: Option<&str>) {
        let mut remap: Vec<(String, FileId)> = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = self.alloc_id();
            self.files.push(OpenFile {
                id,
                path: entry.path,
                name: entry.name,
                content: entry.content,
                has_unsaved_changes: entry.has_unsaved_changes,
            });
            remap.push((entry.old_id, id));
        }

        self.current_file_id = persisted_current
            .and_then(|old| {
                remap
                    .iter()
                    .find(|(old_id, _)| old_id == old)
                    .map(|(_, id)| *id)
            })
            .or_else(|| self.files.first().map(|file| file.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str, content: &str) -> FileInfo {
        FileInfo::new(path, content)
    }

    #[test]
    fn new_file_is_untitled_selected_and_clean() {
        let mut session = Session::new();
        let id = session.create_new_file();

        let file = session.find(id).unwrap();
        assert!(file.is_untitled());
        assert_eq!(file.name, "Untitled");
        assert!(!file.has_unsaved_changes);
        assert_eq!(session.current_file_id(), Some(id));
    }

    #[test]
    fn adopting_a_known_path_selects_instead_of_duplicating() {
        let mut session = Session::new();
        let first = session.adopt(info("/notes/a.md", "one"));
        session.adopt(info("/notes/b.md", "two"));

        let again = session.adopt(info("/notes/a.md", "one"));
        assert_eq!(again, first);
        assert_eq!(session.files().len(), 2);
        assert_eq!(session.current_file_id(), Some(first));
    }

    #[test]
    fn adoption_dedupes_across_separator_and_case_differences() {
        let mut session = Session::new();
        let first = session.adopt(info("C:\\Notes\\Plan.md", "x"));
        let again = session.adopt(info("c:/notes/plan.md", "x"));
        assert_eq!(again, first);
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn update_content_always_marks_unsaved() {
        let mut session = Session::new();
        session.adopt(info("/notes/a.md", "same"));
        session.update_content("same");

        assert!(session.current_file().unwrap().has_unsaved_changes);
    }

    #[test]
    fn update_content_without_selection_is_a_no_op() {
        let mut session = Session::new();
        session.update_content("ignored");
        assert!(session.is_empty());
    }

    #[test]
    fn save_fixes_path_name_and_clears_unsaved() {
        let mut session = Session::new();
        let id = session.create_new_file();
        session.update_content("hello");
        assert!(session.current_file().unwrap().has_unsaved_changes);

        assert!(session.apply_save(id, "/tmp/x.md".to_string()));
        let file = session.find(id).unwrap();
        assert_eq!(file.path, "/tmp/x.md");
        assert_eq!(file.name, "x.md");
        assert!(!file.has_unsaved_changes);

        // Reopening the saved path selects the same entry.
        let again = session.adopt(info("/tmp/x.md", "hello"));
        assert_eq!(again, id);
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn save_onto_an_open_path_supersedes_the_older_entry() {
        let mut session = Session::new();
        let older = session.adopt(info("/notes/a.md", "disk"));
        let newer = session.create_new_file();
        session.update_content("draft");

        assert!(session.apply_save(newer, "/notes/a.md".to_string()));
        assert_eq!(session.files().len(), 1);
        assert!(session.find(older).is_none());

        let survivor = session.find(newer).unwrap();
        assert_eq!(survivor.content, "draft");
        assert!(!survivor.has_unsaved_changes);
        assert_eq!(session.current_file_id(), Some(newer));
    }

    #[test]
    fn save_transfers_selection_from_the_superseded_entry() {
        let mut session = Session::new();
        let newer = session.create_new_file();
        session.update_content("draft");
        let older = session.adopt(info("/notes/a.md", "disk"));
        assert_eq!(session.current_file_id(), Some(older));

        assert!(session.apply_save(newer, "/notes/a.md".to_string()));
        assert_eq!(session.current_file_id(), Some(newer));
    }

    #[test]
    fn save_of_a_closed_id_changes_nothing() {
        let mut session = Session::new();
        let id = session.create_new_file();
        session.close_file(id, true);

        assert!(!session.apply_save(id, "/tmp/x.md".to_string()));
        assert!(session.is_empty());
    }

    #[test]
    fn close_is_guarded_by_unsaved_changes() {
        let mut session = Session::new();
        let a = session.adopt(info("/notes/a.md", "one"));
        session.adopt(info("/notes/b.md", "two"));
        session.select_file(a);
        session.update_content("edited");

        assert!(!session.close_file(a, false));
        assert_eq!(session.files().len(), 2);
        assert_eq!(session.current_file_id(), Some(a));

        assert!(session.close_file(a, true));
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn closing_selected_file_falls_back_to_last_selected() {
        let mut session = Session::new();
        let a = session.adopt(info("/notes/a.md", ""));
        let b = session.adopt(info("/notes/b.md", ""));
        let c = session.adopt(info("/notes/c.md", ""));
        session.select_file(b);
        session.select_file(c);

        assert!(session.close_file(c, false));
        assert_eq!(session.current_file_id(), Some(b));
        assert!(session.find(a).is_some());
    }

    #[test]
    fn close_fallback_skips_a_last_selected_that_is_gone() {
        let mut session = Session::new();
        let a = session.adopt(info("/notes/a.md", ""));
        let b = session.adopt(info("/notes/b.md", ""));
        let c = session.adopt(info("/notes/c.md", ""));
        session.select_file(b);
        session.select_file(c);
        assert!(session.close_file(b, false));

        assert!(session.close_file(c, false));
        assert_eq!(session.current_file_id(), Some(a));
    }

    #[test]
    fn closing_the_last_file_clears_selection() {
        let mut session = Session::new();
        let id = session.create_new_file();
        assert!(session.close_file(id, false));
        assert_eq!(session.current_file_id(), None);
        assert!(session.is_empty());
    }

    #[test]
    fn closing_an_unselected_file_keeps_selection() {
        let mut session = Session::new();
        let a = session.adopt(info("/notes/a.md", ""));
        let b = session.adopt(info("/notes/b.md", ""));
        session.select_file(b);

        assert!(session.close_file(a, false));
        assert_eq!(session.current_file_id(), Some(b));
    }

    #[test]
    fn restore_remaps_the_persisted_selection() {
        let mut session = Session::new();
        session.restore(
            vec![
                RestoredEntry {
                    old_id: "file-7".to_string(),
                    path: "/notes/a.md".to_string(),
                    name: "a.md".to_string(),
                    content: "a".to_string(),
                    has_unsaved_changes: false,
                },
                RestoredEntry {
                    old_id: "file-9".to_string(),
                    path: String::new(),
                    name: "Untitled".to_string(),
                    content: "draft".to_string(),
                    has_unsaved_changes: true,
                },
            ],
            Some("file-9"),
        );

        assert_eq!(session.files().len(), 2);
        let current = session.current_file().unwrap();
        assert!(current.is_untitled());
        assert_eq!(current.content, "draft");
    }

    #[test]
    fn restore_defaults_selection_to_the_first_entry() {
        let mut session = Session::new();
        session.restore(
            vec![RestoredEntry {
                old_id: "file-3".to_string(),
                path: "/notes/a.md".to_string(),
                name: "a.md".to_string(),
                content: "a".to_string(),
                has_unsaved_changes: false,
            }],
            Some("file-404"),
        );

        assert_eq!(
            session.current_file().map(|file| file.name.as_str()),
            Some("a.md")
        );
    }

    #[test]
    fn restore_of_nothing_leaves_the_session_empty() {
        let mut session = Session::new();
        session.restore(Vec::new(), Some("file-1"));
        assert!(session.is_empty());
        assert_eq!(session.current_file_id(), None);
    }
}
