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

//! JSON endpoints the book view's script talks to. The browser reports
//! layout and input; the server owns the pagination state.

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::ServerState;
use crate::navigation::chapter_path;
use crate::pagination::Advance;
use crate::pagination::Direction;
use crate::pagination::Measurement;
use crate::pagination::ReaderInput;
use crate::pagination::Trigger;
use crate::types::view_mode::ViewMode;

#[derive(Deserialize)]
pub struct MeasureRequest {
    trigger: Trigger,
    #[serde(flatten)]
    measurement: Measurement,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderResponse {
    chapter: Option<String>,
    current_page: usize,
    page_count: usize,
    surface_height: Option<f64>,
    /// Leftward translation of the page strip, in pixels.
    offset: f64,
    /// Set when the reader ran off the chapter: the adjacent chapter to load.
    navigate: Option<String>,
    /// The chapter whose text was last shown, in any view.
    displayed: Option<String>,
}

impl ReaderResponse {
    fn new(mutable: &MutableState, navigate: Option<String>) -> Self {
        let paginator = &mutable.paginator;
        let displayed = mutable.loader.displayed().map(|chapter| chapter.slug.clone());
        match paginator.state() {
            Some(state) => Self {
                chapter: Some(state.chapter.clone()),
                current_page: state.current_page,
                page_count: state.page_count,
                surface_height: state.surface_height,
                offset: paginator.offset(),
                navigate,
                displayed,
            },
            None => Self {
                chapter: None,
                current_page: 0,
                page_count: 1,
                surface_height: None,
                offset: 0.0,
                navigate,
                displayed,
            },
        }
    }
}

pub async fn reader_handler(State(state): State<ServerState>) -> Json<ReaderResponse> {
    let mutable = state.mutable.lock().unwrap();
    Json(ReaderResponse::new(&mutable, None))
}

pub async fn measure_handler(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(request): Json<MeasureRequest>,
) -> Result<Json<ReaderResponse>, StatusCode> {
    let mut mutable = state.mutable.lock().unwrap();
    if !mutable.paginator.is_open(&slug) {
        log::debug!("Rejecting measurement of '{slug}', which is not open.");
        return Err(StatusCode::CONFLICT);
    }
    mutable
        .paginator
        .remeasure(request.trigger, request.measurement);
    Ok(Json(ReaderResponse::new(&mutable, None)))
}

pub async fn input_handler(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(input): Json<ReaderInput>,
) -> Result<Json<ReaderResponse>, StatusCode> {
    let mut mutable = state.mutable.lock().unwrap();
    if !mutable.paginator.is_open(&slug) {
        log::debug!("Rejecting input for '{slug}', which is not open.");
        return Err(StatusCode::CONFLICT);
    }
    let manifest = &state.book.manifest;
    let adjacent = match mutable.paginator.handle_input(&input) {
        Some(Advance::Boundary(Direction::Forward)) => manifest.next(&slug),
        Some(Advance::Boundary(Direction::Backward)) => manifest.previous(&slug),
        Some(Advance::Page(_)) | None => None,
    };
    let navigate = adjacent.map(|chapter| chapter_path(ViewMode::Book, &chapter.slug));
    Ok(Json(ReaderResponse::new(&mutable, navigate)))
}
