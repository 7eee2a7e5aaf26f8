//! Markdown rendering for the preview pane. Parsing is pulldown-cmark;
//! fenced code blocks are run through syntect with a light or dark theme
//! depending on the effective color scheme.

use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const LIGHT_THEME: &str = "InspiredGitHub";
const DARK_THEME: &str = "base16-ocean.dark";

fn syntax_set() -> &'static SyntaxSet {
    static SET: OnceLock<SyntaxSet> = OnceLock::new();
    SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static SET: OnceLock<ThemeSet> = OnceLock::new();
    SET.get_or_init(ThemeSet::load_defaults)
}

/// Renders a markdown document to preview HTML.
pub fn render_preview(markdown: &str, dark: bool) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut events = Vec::new();
    // (language token, accumulated source) while inside a code block.
    let mut code_block: Option<(String, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_block = Some((language, String::new()));
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, source)) = code_block.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, source)) = code_block.take() {
                    events.push(Event::Html(
                        highlight_code_block(&language, &source, dark).into(),
                    ));
                }
            }
            other if code_block.is_none() => events.push(other),
            _ => {}
        }
    }

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn highlight_code_block(language: &str, source: &str, dark: bool) -> String {
    let token = language.split_whitespace().next().unwrap_or("");
    if !token.is_empty() {
        if let Some(syntax) = syntax_set().find_syntax_by_token(token) {
            let theme_name = if dark { DARK_THEME } else { LIGHT_THEME };
            if let Some(theme) = theme_set().themes.get(theme_name) {
                match highlighted_html_for_string(source, syntax_set(), syntax, theme) {
                    Ok(rendered) => return rendered,
                    Err(err) => {
                        leptos::logging::warn!("highlighting `{token}` failed: {err}");
                    }
                }
            }
        }
    }
    format!("<pre><code>{}</code></pre>\n", escape_html(source))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_blocks() {
        let html = render_preview("# Title\n\nSome *emphasis* here.", false);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn renders_gfm_tables_and_task_lists() {
        let html = render_preview(
            "| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] open\n",
            false,
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn highlights_known_fenced_languages() {
        let html = render_preview("```rust\nfn main() {}\n```\n", false);
        // syntect emits inline-styled spans; the raw source must not leak
        // through unhighlighted.
        assert!(html.contains("<pre style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn dark_and_light_themes_differ() {
        let light = render_preview("```rust\nlet x = 1;\n```\n", false);
        let dark = render_preview("```rust\nlet x = 1;\n```\n", true);
        assert_ne!(light, dark);
    }

    #[test]
    fn unknown_language_falls_back_to_escaped_plain_code() {
        let html = render_preview("```nosuchlang\na < b && c\n```\n", false);
        assert!(html.contains("<pre><code>"));
        assert!(html.contains("a &lt; b &amp;&amp; c"));
    }

    #[test]
    fn indented_code_blocks_stay_plain() {
        let html = render_preview("    let x = 1;\n", false);
        assert!(html.contains("<pre><code>let x = 1;"));
    }

    #[test]
    fn empty_input_renders_to_nothing() {
        assert_eq!(render_preview("", false), "");
    }
}
