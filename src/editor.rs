//! The editing surface: a transparent textarea over a highlight overlay,
//! plus the live preview pane. The surface's whole contract with the rest
//! of the app is `content` in and `on_change` out.

use std::sync::OnceLock;

use leptos::prelude::*;
use regex::Regex;
use wasm_bindgen::JsCast;
use web_sys::{HtmlTextAreaElement, KeyboardEvent};

/// Decorates raw markdown for the overlay layer. This is presentation only:
/// the output must keep the text character-for-character so the overlay
/// stays aligned with the transparent textarea above it.
pub fn highlight_markdown(text: &str) -> String {
    static RE_HEADING: OnceLock<Regex> = OnceLock::new();
    static RE_QUOTE: OnceLock<Regex> = OnceLock::new();
    static RE_TASK: OnceLock<Regex> = OnceLock::new();
    static RE_CODE: OnceLock<Regex> = OnceLock::new();
    static RE_EMPHASIS: OnceLock<Regex> = OnceLock::new();

    let re_heading =
        RE_HEADING.get_or_init(|| Regex::new(r"(?m)^(#{1,4})[^\S\n].*$").unwrap());
    let re_quote = RE_QUOTE.get_or_init(|| Regex::new(r"(?m)^&gt;.*$").unwrap());
    let re_task =
        RE_TASK.get_or_init(|| Regex::new(r"(?m)^\s*[-*+][^\S\n]+\[(?: |x|X)\]").unwrap());
    let re_code = RE_CODE.get_or_init(|| Regex::new(r"`[^`\n]+`").unwrap());
    let re_emphasis =
        RE_EMPHASIS.get_or_init(|| Regex::new(r"\*\*[^*\n]+\*\*|\*[^*\n]+\*").unwrap());

    let mut html = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    html = re_heading
        .replace_all(&html, |caps: &regex::Captures| {
            let level = caps[1].len();
            format!("<span class=\"hl-h{level}\">{}</span>", &caps[0])
        })
        .to_string();
    html = re_quote
        .replace_all(&html, "<span class=\"hl-quote\">$0</span>")
        .to_string();
    html = re_task
        .replace_all(&html, "<span class=\"hl-task\">$0</span>")
        .to_string();
    html = re_code
        .replace_all(&html, "<span class=\"hl-code\">$0</span>")
        .to_string();
    html = re_emphasis
        .replace_all(&html, |caps: &regex::Captures| {
            let class = if caps[0].starts_with("**") {
                "hl-bold"
            } else {
                "hl-italic"
            };
            format!("<span class=\"{class}\">{}</span>", &caps[0])
        })
        .to_string();

    // Trailing sentinel keeps the overlay as tall as the textarea when the
    // text ends in a newline.
    html.push_str("\n ");
    html
}

/// Result of a programmatic edit: the new text and where the caret lands,
/// in UTF-16 units as the textarea counts them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub text: String,
    pub cursor_utf16: u32,
}

enum BlockPrefix {
    Task(String),
    Ordered { indent: String, number: u64 },
    Bullet(String),
    Quote(String),
}

fn block_prefix(line: &str) -> Option<(BlockPrefix, bool)> {
    static RE_TASK: OnceLock<Regex> = OnceLock::new();
    static RE_ORDERED: OnceLock<Regex> = OnceLock::new();
    static RE_BULLET: OnceLock<Regex> = OnceLock::new();
    static RE_QUOTE: OnceLock<Regex> = OnceLock::new();

    let re_task = RE_TASK
        .get_or_init(|| Regex::new(r"^(\s*[-*+][^\S\n]+)\[(?: |x|X)\][^\S\n]+(.*)$").unwrap());
    let re_ordered =
        RE_ORDERED.get_or_init(|| Regex::new(r"^(\s*)(\d+)\.[^\S\n]+(.*)$").unwrap());
    let re_bullet = RE_BULLET.get_or_init(|| Regex::new(r"^(\s*[-*+][^\S\n]+)(.*)$").unwrap());
    let re_quote = RE_QUOTE.get_or_init(|| Regex::new(r"^(\s*>[^\S\n]+)(.*)$").unwrap());

    if let Some(caps) = re_task.captures(line) {
        let empty = caps[2].trim().is_empty();
        return Some((BlockPrefix::Task(caps[1].to_string()), empty));
    }
    if let Some(caps) = re_ordered.captures(line) {
        let empty = caps[3].trim().is_empty();
        let number = caps[2].parse().unwrap_or(1);
        return Some((
            BlockPrefix::Ordered {
                indent: caps[1].to_string(),
                number,
            },
            empty,
        ));
    }
    if let Some(caps) = re_bullet.captures(line) {
        let empty = caps[2].trim().is_empty();
        return Some((BlockPrefix::Bullet(caps[1].to_string()), empty));
    }
    if let Some(caps) = re_quote.captures(line) {
        let empty = caps[2].trim().is_empty();
        return Some((BlockPrefix::Quote(caps[1].to_string()), empty));
    }
    None
}

/// Continues a list, task, or quote block across a newline at `cursor`.
/// Returns `None` when the cursor's line is not such a block, in which case
/// the default Enter behavior should run.
pub fn continue_block(text: &str, cursor_utf16: u32) -> Option<EditOutcome> {
    let cursor = byte_index(text, cursor_utf16);
    let (start, end) = line_bounds(text, cursor);
    let (prefix, body_is_empty) = block_prefix(&text[start..end])?;

    let insert = if body_is_empty {
        // An empty item breaks the run rather than stuttering markers.
        "\n".to_string()
    } else {
        match prefix {
            BlockPrefix::Task(lead) => format!("\n{lead}[ ] "),
            BlockPrefix::Ordered { indent, number } => {
                format!("\n{indent}{}. ", number.saturating_add(1))
            }
            BlockPrefix::Bullet(lead) | BlockPrefix::Quote(lead) => format!("\n{lead}"),
        }
    };

    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..cursor]);
    out.push_str(&insert);
    out.push_str(&text[cursor..]);
    let cursor_after = utf16_index(&out, cursor + insert.len());
    Some(EditOutcome {
        text: out,
        cursor_utf16: cursor_after,
    })
}

/// Wraps the selection in `marker` on both sides. With an empty selection
/// the caret ends up between the markers, otherwise after the closing one.
pub fn wrap_selection(text: &str, start_utf16: u32, end_utf16: u32, marker: &str) -> EditOutcome {
    let lo = byte_index(text, start_utf16.min(end_utf16));
    let hi = byte_index(text, start_utf16.max(end_utf16));

    let mut out = String::with_capacity(text.len() + marker.len() * 2);
    out.push_str(&text[..lo]);
    out.push_str(marker);
    out.push_str(&text[lo..hi]);
    out.push_str(marker);
    out.push_str(&text[hi..]);

    let cursor = if lo == hi {
        lo + marker.len()
    } else {
        hi + marker.len() * 2
    };
    EditOutcome {
        cursor_utf16: utf16_index(&out, cursor),
        text: out,
    }
}

/// Byte offset for a UTF-16 position as reported by the textarea.
fn byte_index(text: &str, utf16: u32) -> usize {
    let mut remaining = utf16 as usize;
    for (index, ch) in text.char_indices() {
        let units = ch.len_utf16();
        if remaining < units {
            return index;
        }
        remaining -= units;
    }
    text.len()
}

fn utf16_index(text: &str, byte: usize) -> u32 {
    text[..byte.min(text.len())]
        .chars()
        .map(|ch| ch.len_utf16() as u32)
        .sum()
}

fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    let clamped = pos.min(text.len());
    let start = text[..clamped].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[clamped..]
        .find('\n')
        .map(|i| clamped + i)
        .unwrap_or(text.len());
    (start, end)
}

#[component]
pub fn Writer(
    #[prop(into)] content: Signal<String>,
    #[prop(into)] on_change: Callback<String>,
    #[prop(into)] on_save: Callback<()>,
) -> impl IntoView {
    let (scroll_top, set_scroll_top) = signal(0);
    let overlay = Memo::new(move |_| highlight_markdown(&content.get()));

    let handle_keydown = move |ev: KeyboardEvent| {
        let Some(target) = ev
            .target()
            .and_then(|t| t.dyn_into::<HtmlTextAreaElement>().ok())
        else {
            return;
        };
        let chord = ev.ctrl_key() || ev.meta_key();
        let key = ev.key();

        if chord && key.eq_ignore_ascii_case("s") {
            ev.prevent_default();
            on_save.run(());
            return;
        }

        let start = target.selection_start().ok().flatten().unwrap_or(0);
        let end = target.selection_end().ok().flatten().unwrap_or(start);
        let value = target.value();

        let outcome = if chord && key.eq_ignore_ascii_case("b") {
            Some(wrap_selection(&value, start, end, "**"))
        } else if chord && key.eq_ignore_ascii_case("i") {
            Some(wrap_selection(&value, start, end, "*"))
        } else if key == "Enter" && !ev.shift_key() && start == end {
            continue_block(&value, start)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            ev.prevent_default();
            target.set_value(&outcome.text);
            let _ = target.set_selection_range(outcome.cursor_utf16, outcome.cursor_utf16);
            on_change.run(outcome.text);
        }
    };

    view! {
        <div class="writer">
            <div
                class="writer-overlay"
                inner_html=move || overlay.get()
                prop:scrollTop=move || scroll_top.get()
            ></div>
            <textarea
                class="writer-input"
                prop:value=move || content.get()
                on:input=move |ev| on_change.run(event_target_value(&ev))
                on:keydown=handle_keydown
                on:scroll=move |ev| {
                    let target: web_sys::Element = event_target(&ev);
                    set_scroll_top.set(target.scroll_top());
                }
                placeholder="Start writing markdown..."
                spellcheck="false"
            ></textarea>
        </div>
    }
}

#[component]
pub fn Preview(
    #[prop(into)] content: Signal<String>,
    #[prop(into)] dark: Signal<bool>,
) -> impl IntoView {
    let rendered = Memo::new(move |_| crate::markdown::render_preview(&content.get(), dark.get()));
    view! {
        <div class="preview markdown-body" inner_html=move || rendered.get()></div>
    }
}

#[component]
pub fn EmptyState(
    #[prop(into)] on_new: Callback<()>,
    #[prop(into)] on_open: Callback<()>,
) -> impl IntoView {
    view! {
        <div class="empty-state">
            <div class="empty-state-card">
                <h2>"No file open"</h2>
                <p>"Create a new file or open an existing one to get started"</p>
                <div class="empty-state-actions">
                    <button class="primary" on:click=move |_| on_new.run(())>
                        "New File"
                    </button>
                    <button on:click=move |_| on_open.run(())>"Open File"</button>
                </div>
            </div>
        </div>
    }
}
