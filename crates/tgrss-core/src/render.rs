//! Message text rendering: formatting-entity spans to inline HTML.

use crate::domain::{EntitySpan, SpanKind};

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `text` with its formatting spans resolved into inline markup.
///
/// Spans use character offsets, are expected ordered and non-overlapping.
/// Out-of-bounds spans are clamped to the text length; a span starting
/// before the cursor (overlap) is skipped.
pub fn render_entities(text: &str, entities: &[EntitySpan]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for span in entities {
        let start = span.offset.min(chars.len());
        let end = span.offset.saturating_add(span.length).min(chars.len());
        if start < cursor || start >= end {
            continue;
        }

        out.push_str(&escape_html(&collect(&chars[cursor..start])));

        let (open, close) = tags(&span.kind);
        out.push_str(&open);
        out.push_str(&escape_html(&collect(&chars[start..end])));
        out.push_str(close);

        cursor = end;
    }

    out.push_str(&escape_html(&collect(&chars[cursor..])));
    out
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn tags(kind: &SpanKind) -> (String, &'static str) {
    match kind {
        SpanKind::Bold => ("<b>".to_string(), "</b>"),
        SpanKind::Italic => ("<i>".to_string(), "</i>"),
        SpanKind::Underline => ("<u>".to_string(), "</u>"),
        SpanKind::Strikethrough => ("<s>".to_string(), "</s>"),
        SpanKind::Code => ("<code>".to_string(), "</code>"),
        SpanKind::Pre => ("<pre>".to_string(), "</pre>"),
        SpanKind::Link { url } => (format!(r#"<a href="{}">"#, escape_html(url)), "</a>"),
        SpanKind::Spoiler => ("<tg-spoiler>".to_string(), "</tg-spoiler>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(offset: usize, length: usize, kind: SpanKind) -> EntitySpan {
        EntitySpan { offset, length, kind }
    }

    #[test]
    fn plain_text_is_escaped() {
        assert_eq!(render_entities("a < b & c", &[]), "a &lt; b &amp; c");
    }

    #[test]
    fn bold_and_link_spans() {
        let text = "read this now";
        let spans = vec![
            span(0, 4, SpanKind::Bold),
            span(
                5,
                4,
                SpanKind::Link {
                    url: "https://example.com?a=1&b=2".to_string(),
                },
            ),
        ];
        assert_eq!(
            render_entities(text, &spans),
            r#"<b>read</b> <a href="https://example.com?a=1&amp;b=2">this</a> now"#
        );
    }

    #[test]
    fn out_of_bounds_spans_are_clamped() {
        let spans = vec![span(3, 100, SpanKind::Italic)];
        assert_eq!(render_entities("hello", &spans), "hel<i>lo</i>");
    }

    #[test]
    fn overlapping_span_is_skipped() {
        let spans = vec![span(0, 4, SpanKind::Bold), span(2, 3, SpanKind::Italic)];
        assert_eq!(render_entities("abcdef", &spans), "<b>abcd</b>ef");
    }

    #[test]
    fn offsets_are_character_based() {
        let spans = vec![span(2, 2, SpanKind::Code)];
        assert_eq!(render_entities("héllo", &spans), "hé<code>ll</code>o");
    }
}
