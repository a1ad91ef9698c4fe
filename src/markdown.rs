// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use maud::html;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use pulldown_cmark::html::push_html;

use crate::glossary::Fragment;
use crate::glossary::Glossary;

const WORDS_PER_MINUTE: usize = 200;

/// Which view a chapter is rendered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStyle {
    /// Everything, as written.
    Web,
    /// The chapter title is shown in the page header, so the H1 is dropped.
    Book,
    /// H1 dropped, H2/H3 get anchor ids for the outline, and glossary terms
    /// are annotated.
    Lab,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

pub fn markdown_to_html(markdown: &str, style: RenderStyle, glossary: &Glossary) -> String {
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options()).collect();
    let events = match style {
        RenderStyle::Web => events,
        RenderStyle::Book => drop_title(events),
        RenderStyle::Lab => annotate_terms(anchor_headings(drop_title(events)), glossary),
    };
    let mut html_output: String = String::new();
    push_html(&mut html_output, events.into_iter());
    html_output
}

fn drop_title(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut output = Vec::with_capacity(events.len());
    let mut in_title = false;
    for event in events {
        if matches!(
            event,
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            })
        ) {
            in_title = true;
        } else if matches!(event, Event::End(TagEnd::Heading(HeadingLevel::H1))) {
            in_title = false;
        } else if !in_title {
            output.push(event);
        }
    }
    output
}

fn anchor_headings(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut output = Vec::with_capacity(events.len());
    let mut index = 0;
    while index < events.len() {
        match &events[index] {
            Event::Start(Tag::Heading {
                level: level @ (HeadingLevel::H2 | HeadingLevel::H3),
                id: None,
                classes,
                attrs,
            }) => {
                let mut text = String::new();
                for event in &events[index + 1..] {
                    match event {
                        Event::End(TagEnd::Heading(_)) => break,
                        Event::Text(t) | Event::Code(t) => text.push_str(t),
                        _ => {}
                    }
                }
                output.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::Boxed(heading_id(&text).into_boxed_str())),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            event => output.push(event.clone()),
        }
        index += 1;
    }
    output
}

fn annotate_terms<'a>(events: Vec<Event<'a>>, glossary: &Glossary) -> Vec<Event<'a>> {
    if glossary.is_empty() {
        return events;
    }
    let mut output = Vec::with_capacity(events.len());
    // Headings, links and code keep their text as is.
    let mut depth = 0;
    for event in events {
        match &event {
            Event::Start(Tag::Heading { .. } | Tag::Link { .. } | Tag::CodeBlock(_)) => depth += 1,
            Event::End(TagEnd::Heading(_) | TagEnd::Link | TagEnd::CodeBlock) => depth -= 1,
            _ => {}
        }
        match event {
            Event::Text(text) if depth == 0 => {
                for fragment in glossary.split(&text) {
                    match fragment {
                        Fragment::Plain(plain) => {
                            output.push(Event::Text(CowStr::Boxed(plain.into())));
                        }
                        Fragment::Term { text, definition } => {
                            let markup = html! {
                                span.glossary-term title=(definition) { (text) }
                            };
                            output.push(Event::InlineHtml(CowStr::Boxed(
                                markup.into_string().into_boxed_str(),
                            )));
                        }
                    }
                }
            }
            event => output.push(event),
        }
    }
    output
}

/// The anchor id of a heading: lowercased, with runs of whitespace turned
/// into dashes.
pub fn heading_id(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// The chapter's second-level headings, for the outline.
pub fn headings(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .filter_map(|line| line.strip_prefix("## "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
        .collect()
}

/// Estimated reading time, in whole minutes.
pub fn reading_time_minutes(markdown: &str) -> usize {
    markdown.split_whitespace().count().div_ceil(WORDS_PER_MINUTE)
}
