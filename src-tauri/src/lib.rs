//! Host half of the file access gateway: native dialogs, text file I/O,
//! the default notes directory, and window controls for the custom title
//! bar. Everything crosses the command boundary as `Result<_, String>`.

use std::fs;
use std::path::{Path, PathBuf};

use tauri::{AppHandle, Emitter, Manager};

const NOTES_DIR_NAME: &str = "Plume";
const WELCOME_NOTE: &str = "# Welcome to plume\n\nA quiet place for markdown notes.\n\n\
- The title bar lives at the top edge, the file list at the left edge.\n\
- **Ctrl+S** (or **Cmd+S**) saves the current file.\n\
- Files you leave open come back on the next launch.\n";

#[derive(serde::Serialize)]
struct NoteEntry {
    path: String,
    name: String,
}

fn ensure_markdown_extension(path: &str) -> String {
    if path.to_ascii_lowercase().ends_with(".md") {
        path.to_string()
    } else {
        format!("{path}.md")
    }
}

fn notes_dir_of(app: &AppHandle) -> Result<PathBuf, String> {
    let docs = app.path().document_dir().map_err(|e| e.to_string())?;
    Ok(docs.join(NOTES_DIR_NAME))
}

/// Creates the notes directory on first use, seeding it with a welcome
/// note. Idempotent; callers treat failure as non-fatal.
fn init_notes_dir(app: &AppHandle) -> Result<PathBuf, String> {
    let dir = notes_dir_of(app)?;
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
        fs::write(dir.join("Welcome.md"), WELCOME_NOTE).map_err(|e| e.to_string())?;
    }
    Ok(dir)
}

fn collect_notes(root: &Path, dir: &Path, out: &mut Vec<NoteEntry>) -> Result<(), String> {
    for entry in fs::read_dir(dir).map_err(|e| e.to_string())? {
        let entry = entry.map_err(|e| e.to_string())?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_notes(root, &path, out)?;
            continue;
        }
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            continue;
        }
        let name = path
            .strip_prefix(root)
            .map_err(|e| e.to_string())?
            .to_string_lossy()
            .replace('\\', "/");
        out.push(NoteEntry {
            path: path.to_string_lossy().into_owned(),
            name,
        });
    }
    Ok(())
}

fn launch_path() -> Option<String> {
    std::env::args().nth(1).filter(|arg| !arg.starts_with('-'))
}

#[tauri::command]
async fn pick_open_path(app: AppHandle) -> Result<Option<String>, String> {
    let mut dialog = rfd::FileDialog::new()
        .add_filter("Markdown", &["md", "markdown"])
        .add_filter("All Files", &["*"]);
    match init_notes_dir(&app) {
        Ok(dir) => dialog = dialog.set_directory(dir),
        Err(err) => eprintln!("notes directory unavailable: {err}"),
    }
    Ok(dialog.pick_file().map(|p| p.to_string_lossy().into_owned()))
}

#[tauri::command]
async fn pick_save_path(app: AppHandle) -> Result<Option<String>, String> {
    let mut dialog = rfd::FileDialog::new().add_filter("Markdown", &["md"]);
    match init_notes_dir(&app) {
        Ok(dir) => dialog = dialog.set_directory(dir),
        Err(err) => eprintln!("notes directory unavailable: {err}"),
    }
    Ok(dialog.save_file().map(|p| p.to_string_lossy().into_owned()))
}

#[tauri::command]
fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| e.to_string())
}

/// Writes `content` to `path`, enforcing the `.md` extension, and returns
/// the path actually written.
#[tauri::command]
fn write_file(path: &str, content: &str) -> Result<String, String> {
    let final_path = ensure_markdown_extension(path);
    fs::write(&final_path, content).map_err(|e| e.to_string())?;
    Ok(final_path)
}

#[tauri::command]
fn path_exists(path: &str) -> bool {
    Path::new(path).exists()
}

#[tauri::command]
fn list_notes(app: AppHandle) -> Result<Vec<NoteEntry>, String> {
    let root = notes_dir_of(&app)?;
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut notes = Vec::new();
    collect_notes(&root, &root, &mut notes)?;
    notes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(notes)
}

#[tauri::command]
fn launch_file() -> Option<String> {
    launch_path()
}

#[tauri::command]
fn window_minimize(window: tauri::WebviewWindow) -> Result<(), String> {
    window.minimize().map_err(|e| e.to_string())
}

#[tauri::command]
fn window_toggle_maximize(window: tauri::WebviewWindow) -> Result<(), String> {
    window.toggle_maximize().map_err(|e| e.to_string())
}

#[tauri::command]
fn window_close(window: tauri::WebviewWindow) -> Result<(), String> {
    window.close().map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            if let Err(err) = init_notes_dir(app.handle()) {
                eprintln!("notes directory unavailable: {err}");
            }
            if let Some(path) = launch_path() {
                if let Err(err) = app.emit("open-file", path) {
                    eprintln!("could not forward launch path: {err}");
                }
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            pick_open_path,
            pick_save_path,
            read_file,
            write_file,
            path_exists,
            list_notes,
            launch_file,
            window_minimize,
            window_toggle_maximize,
            window_close
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
