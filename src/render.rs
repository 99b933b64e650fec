//! Rendering outbound messages: Slack escaping, change-event lines, and
//! provider-markdown to mrkdwn conversion.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::ports::{BoardRef, COLOR_CLOSED, COLOR_OPEN};
use crate::snapshot::diff::ChangeEvent;
use crate::snapshot::ItemState;

/// Escapes the three characters Slack requires escaping in message text.
#[must_use]
pub fn escape(original: &str) -> String {
    original.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Attachment color for an item in the given state.
#[must_use]
pub fn state_color(state: ItemState) -> &'static str {
    match state {
        ItemState::Closed => COLOR_CLOSED,
        ItemState::Open => COLOR_OPEN,
    }
}

/// Formats one change event as a notification line.
#[must_use]
pub fn change_line(event: &ChangeEvent) -> String {
    let emoji = match event.item.state {
        ItemState::Closed => ":issue-closed:",
        ItemState::Open => ":issue:",
    };
    format!(
        "{emoji} <{}|{}> {}",
        event.item.html_url,
        escape(&event.item.title),
        event.description
    )
}

/// Footer linking back to the board.
#[must_use]
pub fn board_footer(board: &BoardRef) -> String {
    format!("Updated in project <{}|{}>", board.html_url, escape(&board.title))
}

/// Converts provider-flavored markdown into Slack mrkdwn.
///
/// Headings become bold lines (Slack has no heading markup), emphasis and
/// code spans map to their mrkdwn equivalents, links become `<url|text>`,
/// and task-list markers become ☐ / ☑︎.
#[must_use]
pub fn to_mrkdwn(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::new();
    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => out.push('*'),
                Tag::Strong => out.push('*'),
                Tag::Emphasis => out.push('_'),
                Tag::Strikethrough => out.push('~'),
                Tag::Link { dest_url, .. } => {
                    out.push('<');
                    out.push_str(&dest_url);
                    out.push('|');
                }
                Tag::CodeBlock(_) => out.push_str("```\n"),
                Tag::Item => out.push_str("- "),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => out.push_str("*\n"),
                TagEnd::Strong => out.push('*'),
                TagEnd::Emphasis => out.push('_'),
                TagEnd::Strikethrough => out.push('~'),
                TagEnd::Link => out.push('>'),
                TagEnd::CodeBlock => out.push_str("```\n"),
                TagEnd::Paragraph | TagEnd::Item => out.push('\n'),
                _ => {}
            },
            Event::Text(text) => out.push_str(&escape(&text)),
            Event::Code(code) => {
                out.push('`');
                out.push_str(&escape(&code));
                out.push('`');
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::TaskListMarker(checked) => out.push_str(if checked { "☑︎ " } else { "☐ " }),
            Event::Rule => out.push_str("---\n"),
            Event::Html(html) | Event::InlineHtml(html) => out.push_str(&escape(&html)),
            _ => {}
        }
    }
    out.trim_end().to_string()
}
