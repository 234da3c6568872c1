use obrolan_types::escape_html;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Render markdown to HTML
///
/// Raw HTML in the source is escaped rather than passed through: model output
/// is untrusted.
pub fn render_markdown(markdown: &str) -> String {
    render(markdown, None)
}

/// Render a finished reply: like [`render_markdown`], plus every code block
/// gets a copy button and highlight.js classes
pub fn render_markdown_final(markdown: &str, copy_label: &str) -> String {
    render(markdown, Some(copy_label))
}

fn render(markdown: &str, copy_label: Option<&str>) -> String {
    let parser = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::Start(Tag::CodeBlock(kind)) => match copy_label {
            Some(label) => Event::Html(CowStr::from(code_block_open(&kind, label))),
            None => Event::Start(Tag::CodeBlock(kind)),
        },
        Event::End(TagEnd::CodeBlock) if copy_label.is_some() => {
            Event::Html(CowStr::Borrowed("</code></pre>\n"))
        }
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

fn code_block_open(kind: &CodeBlockKind<'_>, copy_label: &str) -> String {
    let class = match kind {
        CodeBlockKind::Fenced(info) => match extract_code_language(info) {
            Some(lang) => format!("hljs language-{}", lang),
            None => "hljs".to_string(),
        },
        CodeBlockKind::Indented => "hljs".to_string(),
    };
    format!(
        r#"<pre class="code-block"><button type="button" class="copy-code-btn">{}</button><code class="{}">"#,
        escape_html(copy_label),
        class
    )
}

/// Extract language from code fence info; only characters valid in a class name survive
pub fn extract_code_language(info: &str) -> Option<String> {
    let lang: String = info
        .split_whitespace()
        .next()?
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect();
    if lang.is_empty() {
        None
    } else {
        Some(lang)
    }
}
