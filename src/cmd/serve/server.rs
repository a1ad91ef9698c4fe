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

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Redirect;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::signal::ctrl_c;
use tokio::time::sleep;

use crate::book::Book;
use crate::cmd::serve::api::input_handler;
use crate::cmd::serve::api::measure_handler;
use crate::cmd::serve::api::reader_handler;
use crate::cmd::serve::get::book_index;
use crate::cmd::serve::get::book_page;
use crate::cmd::serve::get::chapter_file;
use crate::cmd::serve::get::home_page;
use crate::cmd::serve::get::lab_index;
use crate::cmd::serve::get::lab_page;
use crate::cmd::serve::get::web_page;
use crate::cmd::serve::post::preferences_handler;
use crate::cmd::serve::post::quiz_handler;
use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::ServerState;
use crate::content::ChapterLoader;
use crate::content::ChapterSource;
use crate::content::DirectoryStore;
use crate::content::HttpStore;
use crate::error::Fallible;
use crate::pagination::Paginator;
use crate::preferences::Preferences;
use crate::progress::ProgressStore;
use crate::storage::KeyValueStore;
use crate::storage::SqliteStore;

pub async fn start_server(
    directory: Option<String>,
    port: u16,
    profile: Option<String>,
    content_url: Option<String>,
    open_browser: bool,
) -> Fallible<()> {
    let book = Book::open(directory)?;

    let store = match content_url {
        Some(url) => {
            log::debug!("Fetching chapters from {url}");
            ChapterSource::Http(HttpStore::new(&url))
        }
        None => ChapterSource::Directory(DirectoryStore::new(book.directory.clone())),
    };

    let profile = book.profile_path(profile)?;
    log::debug!("Using profile {profile}");
    let profile_store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(&profile)?);
    let progress = ProgressStore::load(profile_store.clone())?;
    let preferences = Preferences::new(profile_store);

    let mut paginator = Paginator::new(book.config.page_settings());
    paginator.subscribe(|state| {
        log::debug!(
            "{}: page {} of {}",
            state.chapter,
            state.current_page + 1,
            state.page_count
        );
    });

    let state = ServerState {
        store,
        book: Arc::new(book),
        mutable: Arc::new(Mutex::new(MutableState {
            progress,
            preferences,
            paginator,
            loader: ChapterLoader::new(),
            quiz: None,
        })),
    };
    let app = Router::new();
    let app = app.route("/", get(home_page));
    let app = app.route("/book", get(book_index));
    let app = app.route("/interactive", get(lab_index));
    let app = app.route("/book/{slug}", get(book_page));
    let app = app.route("/interactive/{slug}", get(lab_page).post(quiz_handler));
    let app = app.route("/preferences", post(preferences_handler));
    let app = app.route("/api/reader", get(reader_handler));
    let app = app.route("/api/book/{slug}/measure", post(measure_handler));
    let app = app.route("/api/book/{slug}/input", post(input_handler));
    let app = app.route("/chapters/{file}", get(chapter_file));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.route("/{slug}", get(web_page));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{port}");

    if open_browser {
        // Start a separate task to open the browser.
        let url = format!("http://{bind}/");
        let address = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&address).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    // Start the server.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::debug!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = ctrl_c().await {
        log::error!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn script(
    State(state): State<ServerState>,
) -> (StatusCode, [(HeaderName, &'static str); 1], String) {
    let settings = state.book.config.page_settings();
    let mut content = String::new();
    content.push_str(&format!("const PAGE_GAP = {};\n", settings.gap));
    content.push_str(&format!(
        "const SETTLE_DELAY_MS = {};\n",
        settings.settle_delay.as_millis()
    ));
    content.push('\n');
    content.push_str(include_str!("script.js"));
    (StatusCode::OK, [(CONTENT_TYPE, "text/javascript")], content)
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> Redirect {
    Redirect::to("/")
}
