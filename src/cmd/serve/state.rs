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

use crate::book::Book;
use crate::content::ChapterLoader;
use crate::content::ChapterSource;
use crate::content::ContentStore;
use crate::content::LoadedChapter;
use crate::pagination::Paginator;
use crate::preferences::Preferences;
use crate::progress::ProgressStore;
use crate::quiz::ChapterQuiz;
use crate::quiz::QuizSession;
use crate::types::chapter::ChapterMeta;

#[derive(Clone)]
pub struct ServerState {
    pub book: Arc<Book>,
    pub store: ChapterSource,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    pub progress: ProgressStore,
    pub preferences: Preferences,
    pub paginator: Paginator,
    pub loader: ChapterLoader,
    pub quiz: Option<QuizSession>,
}

impl MutableState {
    /// The quiz attempt for `slug`, starting a fresh one if the reader was
    /// on another chapter's quiz.
    pub fn quiz_session(&mut self, slug: &str) -> &mut QuizSession {
        let session = self.quiz.get_or_insert_with(|| QuizSession::new(slug));
        if session.slug() != slug {
            *session = QuizSession::new(slug);
        }
        session
    }
}

impl ServerState {
    /// Fetch a chapter's text. The lock is released while the fetch runs, so
    /// a navigation that starts meanwhile supersedes this one, and `None` is
    /// returned.
    pub async fn load_chapter(&self, chapter: &ChapterMeta) -> Option<LoadedChapter> {
        let ticket = {
            let mut mutable = self.mutable.lock().unwrap();
            mutable.loader.begin(&chapter.slug)
        };
        let result = self.store.fetch(&chapter.path).await;
        let mut mutable = self.mutable.lock().unwrap();
        mutable.loader.commit(ticket, result).cloned()
    }

    pub fn quiz(&self, slug: &str) -> Option<&ChapterQuiz> {
        self.book.quizzes.get(slug)
    }
}
