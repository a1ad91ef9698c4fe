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

use axum::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::cmd::serve::state::ServerState;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::navigation::Route;
use crate::navigation::chapter_path;
use crate::navigation::switch_mode;
use crate::preferences::Preferences;
use crate::quiz::QuizStep;
use crate::types::view_mode::ViewMode;

#[derive(Debug, Deserialize)]
enum QuizAction {
    Select,
    Next,
    Retake,
    Unlock,
}

#[derive(Deserialize)]
pub struct QuizForm {
    action: QuizAction,
    option: Option<usize>,
}

pub async fn quiz_handler(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Form(form): Form<QuizForm>,
) -> Redirect {
    match quiz_action(&state, &slug, form) {
        Ok(_) => {}
        Err(e) => {
            log::error!("{e}");
        }
    }
    Redirect::to(&chapter_path(ViewMode::Interactive, &slug))
}

fn quiz_action(state: &ServerState, slug: &str, form: QuizForm) -> Fallible<()> {
    let Some(quiz) = state.quiz(slug) else {
        return fail(format!("chapter '{slug}' has no quiz."));
    };
    let mut mutable = state.mutable.lock().unwrap();
    match form.action {
        QuizAction::Select => {
            let Some(option) = form.option else {
                return fail("no option selected.");
            };
            let correct = mutable.quiz_session(slug).select(quiz, option)?;
            log::debug!("{slug}: option {option} is {}", if correct { "correct" } else { "wrong" });
        }
        QuizAction::Next => {
            if let QuizStep::Finished { score, total } = mutable.quiz_session(slug).next(quiz)? {
                log::debug!("{slug}: quiz finished with {score}/{total}");
                mutable.progress.record_result(slug, score, total)?;
            }
        }
        QuizAction::Retake => {
            mutable.quiz_session(slug).retake();
        }
        QuizAction::Unlock => {
            if quiz.sandbox.is_none() {
                return fail(format!("chapter '{slug}' has no sandbox."));
            }
            log::debug!("{slug}: sandbox unlocked");
            mutable.preferences.unlock(slug)?;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
enum PreferenceAction {
    ToggleTheme,
    ToggleSound,
    Cycle,
    Mode,
}

#[derive(Deserialize)]
pub struct PreferenceForm {
    action: PreferenceAction,
    /// The page the form was submitted from.
    from: Option<String>,
    /// The target of [`PreferenceAction::Mode`].
    mode: Option<String>,
}

pub async fn preferences_handler(
    State(state): State<ServerState>,
    Form(form): Form<PreferenceForm>,
) -> Redirect {
    let from = match form.from.as_deref() {
        Some(path) if is_local(path) => path.to_string(),
        _ => "/".to_string(),
    };
    match preference_action(&state, &from, &form) {
        Ok(target) => Redirect::to(&target),
        Err(e) => {
            log::error!("{e}");
            Redirect::to(&from)
        }
    }
}

/// Only redirect back to paths on this server.
fn is_local(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

/// Apply a preference change, returning where to send the reader.
fn preference_action(state: &ServerState, from: &str, form: &PreferenceForm) -> Fallible<String> {
    let mutable = state.mutable.lock().unwrap();
    let preferences = &mutable.preferences;
    match form.action {
        PreferenceAction::ToggleTheme => {
            let theme = preferences.toggle_theme()?;
            log::debug!("Theme is now {}.", theme.as_str());
            Ok(from.to_string())
        }
        PreferenceAction::ToggleSound => {
            let enabled = !preferences.sound_enabled()?;
            preferences.set_sound_enabled(enabled)?;
            Ok(from.to_string())
        }
        PreferenceAction::Cycle => {
            let current = match Route::parse(from) {
                Route::Chapter { mode, .. } | Route::ModeIndex(mode) => mode,
                Route::Home | Route::Unknown => preferences.view_mode()?,
            };
            change_mode(state, preferences, from, current.next())
        }
        PreferenceAction::Mode => {
            let Some(mode) = form.mode.as_deref() else {
                return fail("no mode given.");
            };
            let mode = ViewMode::try_from(mode)?;
            change_mode(state, preferences, from, mode)
        }
    }
}

fn change_mode(
    state: &ServerState,
    preferences: &Preferences,
    from: &str,
    mode: ViewMode,
) -> Fallible<String> {
    preferences.set_view_mode(mode)?;
    switch_mode(&state.book.manifest, from, mode)
        .ok_or_else(|| ErrorReport::new("the book has no chapters."))
}
