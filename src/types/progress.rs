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

use serde::Deserialize;
use serde::Serialize;

/// The outcome of a chapter's quiz.
///
/// Records are only ever replaced whole, never partially updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterProgress {
    /// Whether the chapter's quiz has been finished.
    pub completed: bool,
    /// Number of questions answered correctly.
    pub score: u32,
    /// Number of questions in the quiz. Never less than `score`.
    pub total_questions: u32,
}

impl ChapterProgress {
    pub fn completed(score: u32, total_questions: u32) -> Self {
        Self {
            completed: true,
            score,
            total_questions,
        }
    }

    /// Whether the score fits the quiz. A completed quiz has at least one
    /// question.
    pub fn is_consistent(&self) -> bool {
        self.score <= self.total_questions && (!self.completed || self.total_questions > 0)
    }

    /// A perfect score on a completed quiz.
    pub fn is_perfect(&self) -> bool {
        self.completed && self.score == self.total_questions
    }
}
