//! Sticky-note markdown rendering.

use pulldown_cmark::{Event, Options, Parser, html};

/// Render markdown to HTML with raw HTML neutralized.
///
/// Sticky notes store markdown source; this is the sanitizing transform the
/// display side runs it through. Raw inline/block HTML events are demoted to
/// plain text (which the HTML writer escapes), so markup in note content is
/// shown, never executed.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown_renders() {
        let out = render_markdown("# Title\n\nsome *emphasis* here");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<em>emphasis</em>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let out = render_markdown("hello <script>alert('x')</script> world");
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_block_html_is_escaped() {
        let out = render_markdown("<div onclick=\"evil()\">content</div>");
        assert!(!out.contains("<div"));
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_lists_and_code() {
        let out = render_markdown("- one\n- two\n\n`inline`");
        assert!(out.contains("<li>one</li>"));
        assert!(out.contains("<code>inline</code>"));
    }
}
