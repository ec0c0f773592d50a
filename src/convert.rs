//! Markdown → terminal lines for the document pane.
//!
//! Block structure is kept (headings, paragraphs, list items, code blocks);
//! inline markup is flattened to plain text. Wrapping to the pane width
//! happens here too, since only the caller knows the width.

use std::time::Instant;

use log::debug;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::content::PatternDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Body,
    Code,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    fn blank() -> Self {
        Self::new(LineKind::Blank, "")
    }
}

/// State tracking for nested containers during conversion.
#[derive(Debug)]
enum Container {
    Heading,
    List { next: Option<u64> },
    Item,
    CodeBlock,
}

/// Convert Markdown to lines no wider than `width` columns (code excepted).
pub fn markdown_to_lines(markdown: &str, width: usize) -> Vec<Line> {
    let start = Instant::now();
    let width = width.max(8);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out: Vec<Line> = Vec::new();
    let mut stack: Vec<Container> = Vec::new();
    let mut text = String::new();
    // Prefix for the first wrapped line of the current list item.
    let mut bullet: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                stack.push(Container::Heading);
            }
            Event::End(TagEnd::Heading(_)) => {
                stack.pop();
                push_gap(&mut out);
                out.push(Line::new(LineKind::Heading, text.trim().to_string()));
                out.push(Line::blank());
                text.clear();
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                if !in_list(&stack) {
                    out.push(Line::blank());
                }
            }
            Event::Start(Tag::List(first)) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                stack.push(Container::List { next: first });
            }
            Event::End(TagEnd::List(_)) => {
                stack.pop();
                if !in_list(&stack) {
                    out.push(Line::blank());
                }
            }
            Event::Start(Tag::Item) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                let marker = match stack.last_mut() {
                    Some(Container::List { next: Some(n) }) => {
                        let m = format!("{n}. ");
                        *n += 1;
                        m
                    }
                    _ => "• ".to_string(),
                };
                bullet = Some(marker);
                stack.push(Container::Item);
            }
            Event::End(TagEnd::Item) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                stack.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
                stack.push(Container::CodeBlock);
            }
            Event::End(TagEnd::CodeBlock) => {
                stack.pop();
                for l in text.trim_end_matches('\n').lines() {
                    out.push(Line::new(LineKind::Code, format!("  {l}")));
                }
                out.push(Line::blank());
                text.clear();
            }
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => {
                flush_text(&mut out, &mut text, &stack, &mut bullet, width);
            }
            Event::Rule => {
                out.push(Line::new(LineKind::Body, "─".repeat(width)));
                out.push(Line::blank());
            }
            _ => {}
        }
    }
    flush_text(&mut out, &mut text, &stack, &mut bullet, width);
    while out.last().is_some_and(|l| l.kind == LineKind::Blank) {
        out.pop();
    }
    debug!(
        "convert: {} lines in {:.1}ms",
        out.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    out
}

/// Lay out a full pattern document: explanation, then the code listing.
pub fn document_to_lines(doc: &PatternDocument, width: usize) -> Vec<Line> {
    let mut lines = markdown_to_lines(&doc.explanation, width);
    if !doc.code.trim().is_empty() {
        push_gap(&mut lines);
        lines.push(Line::new(LineKind::Heading, "Code"));
        lines.push(Line::blank());
        for l in doc.code.lines() {
            lines.push(Line::new(LineKind::Code, format!("  {l}")));
        }
    }
    lines
}

fn in_list(stack: &[Container]) -> bool {
    stack.iter().any(|c| matches!(c, Container::List { .. }))
}

fn list_depth(stack: &[Container]) -> usize {
    stack
        .iter()
        .filter(|c| matches!(c, Container::List { .. }))
        .count()
}

fn push_gap(out: &mut Vec<Line>) {
    if out.last().is_some_and(|l| l.kind != LineKind::Blank) {
        out.push(Line::blank());
    }
}

fn flush_text(
    out: &mut Vec<Line>,
    text: &mut String,
    stack: &[Container],
    bullet: &mut Option<String>,
    width: usize,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        text.clear();
        return;
    }
    let indent = "  ".repeat(list_depth(stack).saturating_sub(1));
    let (first, rest) = match bullet.take() {
        Some(marker) => {
            let hang = " ".repeat(marker.chars().count());
            (format!("{indent}{marker}"), format!("{indent}{hang}"))
        }
        None => (indent.clone(), indent),
    };
    let opts = textwrap::Options::new(width)
        .initial_indent(&first)
        .subsequent_indent(&rest);
    for l in textwrap::wrap(trimmed, opts) {
        out.push(Line::new(LineKind::Body, l.into_owned()));
    }
    text.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn heading_then_paragraph() {
        let lines = markdown_to_lines("# Intent\n\nOne *instance* only.", 40);
        assert_eq!(texts(&lines), vec!["Intent", "", "One instance only."]);
        assert_eq!(lines[0].kind, LineKind::Heading);
        assert_eq!(lines[2].kind, LineKind::Body);
    }

    #[test]
    fn paragraphs_wrap_to_width() {
        let lines = markdown_to_lines("aaa bbb ccc ddd eee", 8);
        assert_eq!(texts(&lines), vec!["aaa bbb", "ccc ddd", "eee"]);
    }

    #[test]
    fn bullet_and_ordered_lists() {
        let lines = markdown_to_lines("- one\n- two\n\n1. first\n2. second\n", 40);
        assert_eq!(
            texts(&lines),
            vec!["• one", "• two", "", "1. first", "2. second"]
        );
    }

    #[test]
    fn heading_inside_tight_item_keeps_its_own_line() {
        let lines = markdown_to_lines("- item\n  # Title\n", 40);
        assert_eq!(texts(&lines), vec!["• item", "", "Title"]);
        assert_eq!(lines[2].kind, LineKind::Heading);
    }

    #[test]
    fn wrapped_list_item_hangs() {
        let lines = markdown_to_lines("- alpha beta gamma", 12);
        assert_eq!(texts(&lines), vec!["• alpha beta", "  gamma"]);
    }

    #[test]
    fn code_block_is_indented_and_unwrapped() {
        let md = "```ts\nclass VeryLongClassName {}\n```\n";
        let lines = markdown_to_lines(md, 10);
        assert_eq!(texts(&lines), vec!["  class VeryLongClassName {}"]);
        assert_eq!(lines[0].kind, LineKind::Code);
    }

    #[test]
    fn document_appends_code_section() {
        let doc = PatternDocument {
            id: "singleton".parse().unwrap(),
            explanation: "Only one.".into(),
            code: "class A {}\nclass B {}".into(),
        };
        let lines = document_to_lines(&doc, 40);
        assert_eq!(
            texts(&lines),
            vec!["Only one.", "", "Code", "", "  class A {}", "  class B {}"]
        );
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(markdown_to_lines("", 40).is_empty());
    }
}
