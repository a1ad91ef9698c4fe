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

use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::ETAG;
use axum::http::header::IF_NONE_MATCH;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::mode_label;
use crate::cmd::serve::template::page_template;
use crate::cmd::serve::template::toolbar;
use crate::content::ContentError;
use crate::content::ContentStore;
use crate::error::Fallible;
use crate::markdown::RenderStyle;
use crate::markdown::heading_id;
use crate::markdown::headings;
use crate::markdown::markdown_to_html;
use crate::markdown::reading_time_minutes;
use crate::navigation::chapter_path;
use crate::navigation::switch_mode;
use crate::quiz::ChapterQuiz;
use crate::quiz::QuizSession;
use crate::types::chapter::ChapterMeta;
use crate::types::content_hash::ContentHash;
use crate::types::progress::ChapterProgress;
use crate::types::view_mode::Theme;
use crate::types::view_mode::ViewMode;

type Page = Result<(StatusCode, Html<String>), Redirect>;

/// Reader preferences that shape every page.
struct Chrome {
    theme: Theme,
    sound: bool,
}

/// Read a preference, falling back to the default if the profile can't be
/// read. Pages always render.
fn or_default<T: Default>(result: Fallible<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::error!("{e}");
            T::default()
        }
    }
}

fn chrome(state: &ServerState, visiting: Option<ViewMode>) -> Chrome {
    let mutable = state.mutable.lock().unwrap();
    if let Some(mode) = visiting {
        or_default(mutable.preferences.set_view_mode(mode));
    }
    Chrome {
        theme: or_default(mutable.preferences.theme()),
        sound: or_default(mutable.preferences.sound_enabled()),
    }
}

fn render(title: &str, chrome: &Chrome, body: Markup) -> (StatusCode, Html<String>) {
    let html = page_template(title, chrome.theme, body);
    (StatusCode::OK, Html(html.into_string()))
}

/// The chapter with this slug, or a redirect to the first chapter in the
/// same mode.
fn find_chapter(state: &ServerState, slug: &str, mode: ViewMode) -> Result<ChapterMeta, Redirect> {
    match state.book.manifest.find(slug) {
        Some((_, chapter)) => Ok(chapter.clone()),
        None => {
            log::debug!("Unknown chapter '{slug}', redirecting to the first chapter.");
            let target =
                switch_mode(&state.book.manifest, "/", mode).unwrap_or_else(|| "/".to_string());
            Err(Redirect::to(&target))
        }
    }
}

/// The reader navigated elsewhere while this chapter loaded: follow them.
fn superseded(state: &ServerState, mode: ViewMode) -> Redirect {
    let mutable = state.mutable.lock().unwrap();
    let target = match mutable.loader.target() {
        Some(slug) => chapter_path(mode, slug),
        None => "/".to_string(),
    };
    Redirect::to(&target)
}

pub async fn home_page(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let chrome = chrome(&state, None);
    let (last_mode, mastery) = {
        let mutable = state.mutable.lock().unwrap();
        let mastery = mutable
            .progress
            .aggregate_completion(state.book.manifest.len())
            .unwrap_or(0);
        (or_default(mutable.preferences.view_mode()), mastery)
    };
    let manifest = &state.book.manifest;
    let cards = [
        (ViewMode::Web, "Read each chapter as one scrolling page."),
        (ViewMode::Book, "Turn pages like a printed book."),
        (
            ViewMode::Interactive,
            "Study with quizzes, a glossary and a mastery tracker.",
        ),
    ];
    let body = html! {
        (toolbar("/", None, chrome.theme, chrome.sound))
        div.home {
            header.hero {
                h1 { "folio" }
                p { (manifest.len()) " chapters" }
            }
            div.mode-cards {
                @for (mode, blurb) in cards {
                    @let href = switch_mode(manifest, "/", mode).unwrap_or_else(|| "/".to_string());
                    a.mode-card.last[mode == last_mode] href=(href) {
                        h2 { (mode_label(mode)) }
                        p { (blurb) }
                        @if mode == ViewMode::Interactive {
                            p.mastery { (mastery) "% mastered" }
                        }
                    }
                }
            }
        }
    };
    render("Home", &chrome, body)
}

pub async fn book_index(State(state): State<ServerState>) -> Redirect {
    mode_index(&state, ViewMode::Book)
}

pub async fn lab_index(State(state): State<ServerState>) -> Redirect {
    mode_index(&state, ViewMode::Interactive)
}

fn mode_index(state: &ServerState, mode: ViewMode) -> Redirect {
    let target = switch_mode(&state.book.manifest, "/", mode).unwrap_or_else(|| "/".to_string());
    Redirect::to(&target)
}

pub async fn web_page(State(state): State<ServerState>, Path(slug): Path<String>) -> Page {
    let chapter = find_chapter(&state, &slug, ViewMode::Web)?;
    let Some(loaded) = state.load_chapter(&chapter).await else {
        return Err(superseded(&state, ViewMode::Web));
    };
    let chrome = chrome(&state, Some(ViewMode::Web));
    let manifest = &state.book.manifest;
    let content = markdown_to_html(&loaded.text, RenderStyle::Web, &state.book.glossary);
    let from = chapter_path(ViewMode::Web, &chapter.slug);
    let body = html! {
        (toolbar(&from, Some(ViewMode::Web), chrome.theme, chrome.sound))
        div.web {
            aside.toc {
                h2 { "Contents" }
                ol {
                    @for c in manifest.chapters() {
                        li.current[c.slug == chapter.slug] {
                            a href=(chapter_path(ViewMode::Web, &c.slug)) { (c.title) }
                        }
                    }
                }
            }
            article.rich-text {
                (PreEscaped(content))
            }
        }
        (chapter_links(&state, &chapter, ViewMode::Web))
    };
    Ok(render(&chapter.title, &chrome, body))
}

fn chapter_links(state: &ServerState, chapter: &ChapterMeta, mode: ViewMode) -> Markup {
    let manifest = &state.book.manifest;
    html! {
        div.chapter-nav {
            @if let Some(previous) = manifest.previous(&chapter.slug) {
                a.previous href=(chapter_path(mode, &previous.slug)) { "← " (previous.title) }
            }
            div.spacer {}
            @if let Some(next) = manifest.next(&chapter.slug) {
                a.next href=(chapter_path(mode, &next.slug)) { (next.title) " →" }
            }
        }
    }
}

pub async fn book_page(State(state): State<ServerState>, Path(slug): Path<String>) -> Page {
    let chapter = find_chapter(&state, &slug, ViewMode::Book)?;
    let Some(loaded) = state.load_chapter(&chapter).await else {
        return Err(superseded(&state, ViewMode::Book));
    };
    let chrome = chrome(&state, Some(ViewMode::Book));
    let (current_page, page_count, offset) = {
        let mut mutable = state.mutable.lock().unwrap();
        mutable.paginator.open(&chapter.slug);
        let (current_page, page_count) = match mutable.paginator.state() {
            Some(s) => (s.current_page, s.page_count),
            None => (0, 1),
        };
        (current_page, page_count, mutable.paginator.offset())
    };
    let content = markdown_to_html(&loaded.text, RenderStyle::Book, &state.book.glossary);
    let from = chapter_path(ViewMode::Book, &chapter.slug);
    let body = html! {
        (toolbar(&from, Some(ViewMode::Book), chrome.theme, chrome.sound))
        div.book {
            header.book-header {
                h1 { (chapter.title) }
            }
            div #surface .surface data-slug=(chapter.slug) {
                div #pages .pages .rich-text style=(format!("transform: translateX(-{offset}px);")) {
                    (PreEscaped(content))
                }
            }
            div.book-controls {
                button #previous-page type="button" { "‹" }
                span #page-counter {
                    "Page " (current_page + 1) " of " (page_count)
                }
                button #next-page type="button" { "›" }
            }
        }
    };
    Ok(render(&chapter.title, &chrome, body))
}

/// What the lab page needs from the shared state, read under one lock.
struct LabView {
    session: Option<QuizSession>,
    result: ChapterProgress,
    unlocked: bool,
    mastery: u32,
    completed: Vec<bool>,
}

pub async fn lab_page(State(state): State<ServerState>, Path(slug): Path<String>) -> Page {
    let chapter = find_chapter(&state, &slug, ViewMode::Interactive)?;
    let Some(loaded) = state.load_chapter(&chapter).await else {
        return Err(superseded(&state, ViewMode::Interactive));
    };
    let chrome = chrome(&state, Some(ViewMode::Interactive));
    let manifest = &state.book.manifest;
    let quiz = state.quiz(&chapter.slug);
    let view = {
        let mut mutable = state.mutable.lock().unwrap();
        let session = quiz.map(|_| mutable.quiz_session(&chapter.slug).clone());
        LabView {
            session,
            result: mutable.progress.get_result(&chapter.slug),
            unlocked: or_default(mutable.preferences.is_unlocked(&chapter.slug)),
            mastery: mutable.progress.aggregate_completion(manifest.len()).unwrap_or(0),
            completed: manifest
                .chapters()
                .iter()
                .map(|c| mutable.progress.get_result(&c.slug).completed)
                .collect(),
        }
    };
    let sandbox = quiz.and_then(|q| q.sandbox.as_deref());
    let gated = sandbox.is_some() && !view.unlocked;
    let content = markdown_to_html(&loaded.text, RenderStyle::Lab, &state.book.glossary);
    let outline = headings(&loaded.text);
    let from = chapter_path(ViewMode::Interactive, &chapter.slug);
    let body = html! {
        (toolbar(&from, Some(ViewMode::Interactive), chrome.theme, chrome.sound))
        div.lab {
            aside.syllabus {
                div.mastery {
                    span { "Mastery " (view.mastery) "%" }
                    div.mastery-bar {
                        div.mastery-fill style=(format!("width: {}%;", view.mastery)) {}
                    }
                }
                h2 { "Syllabus" }
                ol {
                    @for (c, done) in manifest.chapters().iter().zip(&view.completed) {
                        li.current[c.slug == chapter.slug].completed[*done] {
                            a href=(chapter_path(ViewMode::Interactive, &c.slug)) { (c.title) }
                            @if *done {
                                span.check { "✓" }
                            }
                        }
                    }
                }
            }
            main.lab-main {
                header {
                    h1 { (chapter.title) }
                    span.reading-time { (reading_time_minutes(&loaded.text)) " min read" }
                }
                @if let (true, Some(label)) = (gated, sandbox) {
                    div.sandbox-gate {
                        p { "This chapter is locked behind the " strong { (label) } " sandbox." }
                        form action=(from) method="post" {
                            button id="unlock" type="submit" name="action" value="Unlock" { "Unlock" }
                        }
                    }
                } @else {
                    article.rich-text {
                        (PreEscaped(content))
                    }
                    @if let (Some(quiz), Some(session)) = (quiz, &view.session) {
                        (quiz_panel(&from, quiz, session, view.result))
                    }
                }
                (chapter_links(&state, &chapter, ViewMode::Interactive))
            }
            aside.outline {
                h2 { "On this page" }
                ul {
                    @for heading in &outline {
                        li {
                            a href=(format!("#{}", heading_id(heading))) { (heading) }
                        }
                    }
                }
            }
        }
    };
    Ok(render(&chapter.title, &chrome, body))
}

fn quiz_panel(
    action: &str,
    quiz: &ChapterQuiz,
    session: &QuizSession,
    result: ChapterProgress,
) -> Markup {
    if session.is_finished() {
        return html! {
            section.quiz {
                h2 { "Quiz complete" }
                p.score { "You scored " (session.score()) " of " (quiz.total()) "." }
                @if result.is_perfect() {
                    p.perfect { "Perfect score!" }
                }
                form action=(action) method="post" {
                    input id="retake" type="submit" name="action" value="Retake";
                }
            }
        };
    }
    let step = session.step();
    let Some(question) = quiz.questions.get(step) else {
        return html! {};
    };
    let last = step + 1 == quiz.questions.len();
    html! {
        section.quiz {
            h2 { "Check your understanding" }
            @if result.completed {
                p.previous-result { "Last result: " (result.score) " of " (result.total_questions) }
            }
            div.progress { "Question " (step + 1) " of " (quiz.total()) }
            p.question { (question.question) }
            form.options action=(action) method="post" {
                input type="hidden" name="action" value="Select";
                @for (index, option) in question.options.iter().enumerate() {
                    @let class = match session.selected() {
                        None => "option",
                        Some(_) if index == question.correct => "option correct",
                        Some(chosen) if chosen == index => "option incorrect",
                        Some(_) => "option",
                    };
                    @if session.selected().is_some() {
                        button class=(class) type="submit" name="option" value=(index) disabled { (option) }
                    } @else {
                        button class=(class) type="submit" name="option" value=(index) { (option) }
                    }
                }
            }
            @if let Some(correct) = session.is_correct(quiz) {
                div.feedback {
                    p.verdict { @if correct { "Correct." } @else { "Not quite." } }
                    p.explanation { (question.explanation) }
                }
                form action=(action) method="post" {
                    @if last {
                        button id="next" type="submit" name="action" value="Next" { "Finish" }
                    } @else {
                        button id="next" type="submit" name="action" value="Next" { "Next question" }
                    }
                }
            }
        }
    }
}

/// Raw chapter text, tagged with a content hash so browsers can revalidate.
pub async fn chapter_file(
    State(state): State<ServerState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    match state.store.fetch(&format!("/chapters/{file}")).await {
        Ok(text) => {
            let etag = ContentHash::hash_bytes(text.as_bytes()).etag();
            let cached = headers
                .get(IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == etag);
            if cached {
                return (StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response();
            }
            let headers: [(HeaderName, String); 2] = [
                (CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
                (ETAG, etag),
            ];
            (StatusCode::OK, headers, text).into_response()
        }
        Err(ContentError::NotFound) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            log::error!("Could not read {file}: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
