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

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::storage::KeyValueStore;
use crate::types::progress::ChapterProgress;

/// The storage key of the serialized progress record.
pub const PROGRESS_KEY: &str = "book_progress";

/// The persisted shape of the progress record.
#[derive(Default, Serialize, Deserialize)]
struct ProgressRecord {
    chapters: BTreeMap<String, ChapterProgress>,
}

impl ProgressRecord {
    fn inconsistent_slug(&self) -> Option<&str> {
        self.chapters
            .iter()
            .find(|(_, progress)| !progress.is_consistent())
            .map(|(slug, _)| slug.as_str())
    }
}

/// Per-chapter quiz outcomes, persisted to a profile's key/value store.
///
/// Every write replaces the chapter's record and rewrites the whole store.
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
    record: ProgressRecord,
}

impl ProgressStore {
    /// Load the progress record from the store. A missing or malformed record
    /// is treated as empty; a malformed one is overwritten on the next write.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Fallible<Self> {
        let record = match store.get(PROGRESS_KEY)? {
            None => ProgressRecord::default(),
            Some(json) => match serde_json::from_str::<ProgressRecord>(&json) {
                Ok(record) => match record.inconsistent_slug() {
                    None => record,
                    Some(slug) => {
                        log::warn!("Discarding malformed progress record: bad score for {slug}.");
                        ProgressRecord::default()
                    }
                },
                Err(e) => {
                    log::warn!("Discarding malformed progress record: {e}");
                    ProgressRecord::default()
                }
            },
        };
        Ok(Self { store, record })
    }

    /// Record a finished quiz, replacing any previous attempt.
    pub fn record_result(&mut self, slug: &str, score: u32, total_questions: u32) -> Fallible<()> {
        if total_questions == 0 {
            return fail("a quiz must have at least one question.");
        }
        if score > total_questions {
            return fail(format!(
                "score {score} exceeds the number of questions ({total_questions})."
            ));
        }
        self.record.chapters.insert(
            slug.to_string(),
            ChapterProgress::completed(score, total_questions),
        );
        self.save()
    }

    /// The chapter's record, or an incomplete zero record.
    pub fn get_result(&self, slug: &str) -> ChapterProgress {
        self.record.chapters.get(slug).copied().unwrap_or_default()
    }

    /// Number of chapters with a completed quiz.
    pub fn completed_count(&self) -> usize {
        self.record.chapters.values().filter(|c| c.completed).count()
    }

    /// Percentage of `total_chapters` with a completed quiz, rounded half up
    /// and capped at 100. Returns `None` when there are no chapters.
    pub fn aggregate_completion(&self, total_chapters: usize) -> Option<u32> {
        if total_chapters == 0 {
            return None;
        }
        let completed = self.completed_count();
        let percent = (200 * completed + total_chapters) / (2 * total_chapters);
        Some(percent.min(100) as u32)
    }

    /// All records, ordered by slug.
    pub fn chapters(&self) -> impl Iterator<Item = (&str, &ChapterProgress)> {
        self.record
            .chapters
            .iter()
            .map(|(slug, progress)| (slug.as_str(), progress))
    }

    fn save(&self) -> Fallible<()> {
        let json = serde_json::to_string(&self.record)?;
        self.store.set(PROGRESS_KEY, &json)
    }
}
