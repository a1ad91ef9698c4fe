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
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the right answer.
    pub correct: usize,
    pub explanation: String,
}

/// The quiz at the end of a chapter in the lab view.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChapterQuiz {
    /// Label of the hands-on sandbox that gates the chapter text, if any.
    #[serde(default)]
    pub sandbox: Option<String>,
    pub questions: Vec<Question>,
}

impl ChapterQuiz {
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}

/// All chapter quizzes, keyed by chapter slug.
#[derive(Debug, Default)]
pub struct QuizBank {
    quizzes: BTreeMap<String, ChapterQuiz>,
}

impl QuizBank {
    /// Load `quizzes.toml`. A missing file is an empty bank; a quiz without
    /// questions, or whose answer is out of range, is an error.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        let quizzes: BTreeMap<String, ChapterQuiz> = toml::from_str(&content)?;
        for (slug, quiz) in &quizzes {
            validate(slug, quiz)?;
        }
        Ok(Self { quizzes })
    }

    pub fn get(&self, slug: &str) -> Option<&ChapterQuiz> {
        self.quizzes.get(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.quizzes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }
}

fn validate(slug: &str, quiz: &ChapterQuiz) -> Fallible<()> {
    if quiz.questions.is_empty() {
        return fail(format!("quiz for '{slug}' has no questions."));
    }
    for (index, question) in quiz.questions.iter().enumerate() {
        if question.options.len() < 2 {
            return fail(format!(
                "question {} of '{slug}' needs at least two options.",
                index + 1
            ));
        }
        if question.correct >= question.options.len() {
            return fail(format!(
                "question {} of '{slug}' has no option {}.",
                index + 1,
                question.correct
            ));
        }
    }
    Ok(())
}

/// What the quiz shows after moving on.
#[derive(Debug, PartialEq, Eq)]
pub enum QuizStep {
    /// The question at this index.
    Question(usize),
    /// The last question was answered. Returned once per attempt, so the
    /// caller records the result exactly once.
    Finished { score: u32, total: u32 },
}

/// One attempt at a chapter's quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    slug: String,
    step: usize,
    selected: Option<usize>,
    score: u32,
    finished: bool,
}

impl QuizSession {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            step: 0,
            selected: None,
            score: 0,
            finished: false,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the chosen option of the current question is right.
    pub fn is_correct(&self, quiz: &ChapterQuiz) -> Option<bool> {
        let question = quiz.questions.get(self.step)?;
        self.selected.map(|option| option == question.correct)
    }

    /// Answer the current question. The first answer sticks: selecting again
    /// changes nothing and reports the first answer's correctness.
    pub fn select(&mut self, quiz: &ChapterQuiz, option: usize) -> Fallible<bool> {
        if self.finished {
            return fail("the quiz is already finished.");
        }
        let Some(question) = quiz.questions.get(self.step) else {
            return fail(format!("question {} does not exist.", self.step + 1));
        };
        if let Some(previous) = self.selected {
            return Ok(previous == question.correct);
        }
        if option >= question.options.len() {
            return fail(format!("option {option} does not exist."));
        }
        self.selected = Some(option);
        let correct = option == question.correct;
        if correct {
            self.score += 1;
        }
        Ok(correct)
    }

    /// Move past the answered question.
    pub fn next(&mut self, quiz: &ChapterQuiz) -> Fallible<QuizStep> {
        if self.finished {
            return fail("the quiz is already finished.");
        }
        if self.selected.is_none() {
            return fail("no option selected.");
        }
        if self.step + 1 < quiz.questions.len() {
            self.step += 1;
            self.selected = None;
            Ok(QuizStep::Question(self.step))
        } else {
            self.finished = true;
            Ok(QuizStep::Finished {
                score: self.score,
                total: quiz.total(),
            })
        }
    }

    /// Start over.
    pub fn retake(&mut self) {
        *self = Self::new(&self.slug);
    }
}
