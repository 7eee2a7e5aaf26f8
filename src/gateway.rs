//! Frontend half of the file access gateway.
//!
//! Everything that touches the host file system goes through the Tauri
//! commands in `src-tauri`; this module wraps them in typed async calls so
//! the rest of the app never sees a raw `JsValue`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"], js_name = listen, catch)]
    async fn tauri_listen(event: &str, handler: &js_sys::Function) -> Result<JsValue, JsValue>;
}

#[derive(Serialize)]
struct PathArgs<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct WriteFileArgs<'a> {
    path: &'a str,
    content: &'a str,
}

/// A file as handed over by the host: its path, display name and full text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub content: String,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            content: content.into(),
        }
    }
}

/// One markdown file inside the notes directory, as listed by the host.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NoteEntry {
    pub path: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{command}: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
    #[error("unexpected reply from {command}")]
    Shape { command: &'static str },
}

async fn call(command: &'static str, args: JsValue) -> Result<JsValue, GatewayError> {
    invoke(command, args).await.map_err(|err| {
        let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
        GatewayError::Command { command, message }
    })
}

fn string_reply(command: &'static str, value: JsValue) -> Result<String, GatewayError> {
    value.as_string().ok_or(GatewayError::Shape { command })
}

fn optional_string(command: &'static str, value: JsValue) -> Result<Option<String>, GatewayError> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    value.as_string().map(Some).ok_or(GatewayError::Shape { command })
}

async fn read_text(path: &str) -> Result<String, GatewayError> {
    let args = serde_wasm_bindgen::to_value(&PathArgs { path }).unwrap();
    let reply = call("read_file", args).await?;
    string_reply("read_file", reply)
}

/// Shows the native open dialog and reads the chosen file.
/// `Ok(None)` means the user cancelled.
pub async fn pick_and_open() -> Result<Option<FileInfo>, GatewayError> {
    let reply = call("pick_open_path", JsValue::NULL).await?;
    let Some(path) = optional_string("pick_open_path", reply)? else {
        return Ok(None);
    };
    let content = read_text(&path).await?;
    Ok(Some(FileInfo::new(path, content)))
}

/// Writes `content` to `existing_path`, or to a path chosen through the
/// native save dialog. Returns the final path (the host enforces the `.md`
/// extension), or `Ok(None)` if the dialog was cancelled.
pub async fn pick_and_save(
    content: &str,
    existing_path: Option<&str>,
) -> Result<Option<String>, GatewayError> {
    let target = match existing_path {
        Some(path) => path.to_string(),
        None => {
            let reply = call("pick_save_path", JsValue::NULL).await?;
            match optional_string("pick_save_path", reply)? {
                Some(path) => path,
                None => return Ok(None),
            }
        }
    };
    let args = serde_wasm_bindgen::to_value(&WriteFileArgs {
        path: &target,
        content,
    })
    .unwrap();
    let reply = call("write_file", args).await?;
    string_reply("write_file", reply).map(Some)
}

/// Reads a file without any dialog. `Ok(None)` means the path does not exist.
pub async fn read_by_path(path: &str) -> Result<Option<FileInfo>, GatewayError> {
    let args = serde_wasm_bindgen::to_value(&PathArgs { path }).unwrap();
    let reply = call("path_exists", args).await?;
    let exists = reply.as_bool().ok_or(GatewayError::Shape {
        command: "path_exists",
    })?;
    if !exists {
        return Ok(None);
    }
    let content = read_text(path).await?;
    Ok(Some(FileInfo::new(path, content)))
}

/// Lists the markdown files under the default notes directory.
pub async fn list_notes() -> Result<Vec<NoteEntry>, GatewayError> {
    let reply = call("list_notes", JsValue::NULL).await?;
    serde_wasm_bindgen::from_value(reply).map_err(|_| GatewayError::Shape {
        command: "list_notes",
    })
}

/// The file path the process was launched with, if any.
pub async fn launch_file() -> Result<Option<String>, GatewayError> {
    let reply = call("launch_file", JsValue::NULL).await?;
    optional_string("launch_file", reply)
}

pub async fn minimize_window() -> Result<(), GatewayError> {
    call("window_minimize", JsValue::NULL).await.map(|_| ())
}

pub async fn toggle_maximize_window() -> Result<(), GatewayError> {
    call("window_toggle_maximize", JsValue::NULL).await.map(|_| ())
}

pub async fn close_window() -> Result<(), GatewayError> {
    call("window_close", JsValue::NULL).await.map(|_| ())
}

/// Subscribes `handler` to a host event. The caller keeps the closure alive.
pub async fn listen(event: &'static str, handler: &js_sys::Function) {
    if let Err(err) = tauri_listen(event, handler).await {
        leptos::logging::warn!("listen({event}) failed: {err:?}");
    }
}

/// Display name for a path: its final segment, or "Untitled" for none.
pub fn file_name_of(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Canonical key used when comparing paths: separators and ASCII case are
/// folded, the displayed path keeps its original form.
pub fn normalize_path_key(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_takes_last_segment() {
        assert_eq!(file_name_of("/home/me/notes/todo.md"), "todo.md");
        assert_eq!(file_name_of("C:\\Notes\\plan.md"), "plan.md");
        assert_eq!(file_name_of("loose.md"), "loose.md");
    }

    #[test]
    fn file_name_of_empty_path_is_untitled() {
        assert_eq!(file_name_of(""), "Untitled");
        assert_eq!(file_name_of("///"), "Untitled");
    }

    #[test]
    fn path_keys_fold_separators_and_case() {
        assert_eq!(
            normalize_path_key("C:\\Notes\\Plan.MD"),
            normalize_path_key("c:/notes/plan.md")
        );
        assert_ne!(
            normalize_path_key("/notes/a.md"),
            normalize_path_key("/notes/b.md")
        );
    }

    #[test]
    fn file_info_derives_name_from_path() {
        let info = FileInfo::new("/tmp/x.md", "hello");
        assert_eq!(info.name, "x.md");
        assert_eq!(info.content, "hello");
    }
}
