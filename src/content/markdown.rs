//! Markdown body reduction for similarity comparison

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Split a Markdown body into normalized text blocks.
///
/// Paragraphs, headings, list items, table cells and code blocks each
/// become one block. Markup is dropped; text is lower-cased, punctuation
/// becomes whitespace, and runs of whitespace collapse to a single space.
pub fn text_blocks(markdown: &str) -> Vec<String> {
    // YAML metadata blocks stay disabled: front matter is split off before this
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut blocks = Vec::new();
    let mut current = String::new();

    for event in parser {
        match event {
            Event::Start(
                Tag::Paragraph
                | Tag::Heading { .. }
                | Tag::CodeBlock(_)
                | Tag::Item
                | Tag::TableCell,
            )
            | Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::Item
                | TagEnd::TableCell,
            )
            | Event::Rule => flush(&mut current, &mut blocks),
            Event::Text(text) | Event::Code(text) => {
                current.push(' ');
                current.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            _ => {}
        }
    }
    flush(&mut current, &mut blocks);

    blocks
}

fn flush(current: &mut String, blocks: &mut Vec<String>) {
    let normalized = normalize(current);
    if !normalized.is_empty() {
        blocks.push(normalized);
    }
    current.clear();
}

/// Lower-case, strip punctuation and collapse whitespace
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
