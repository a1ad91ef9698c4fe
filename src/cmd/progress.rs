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

use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;

use crate::book::Book;
use crate::error::Fallible;
use crate::progress::ProgressStore;
use crate::storage::SqliteStore;

#[derive(ValueEnum, Clone)]
pub enum ProgressFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for ProgressFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressFormat::Text => write!(f, "text"),
            ProgressFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_progress(
    directory: Option<String>,
    profile: Option<String>,
    format: ProgressFormat,
) -> Fallible<()> {
    let report = progress_report(directory, profile)?;
    match format {
        ProgressFormat::Text => print!("{}", report.to_text()),
        ProgressFormat::Json => {
            let report_json = serde_json::to_string_pretty(&report)?;
            println!("{report_json}");
        }
    }
    Ok(())
}

fn progress_report(directory: Option<String>, profile: Option<String>) -> Fallible<ProgressReport> {
    let book = Book::open(directory)?;
    let profile = book.profile_path(profile)?;
    let store = SqliteStore::new(&profile)?;
    let progress = ProgressStore::load(Arc::new(store))?;

    let mut chapters: Vec<ChapterReport> = book
        .manifest
        .chapters()
        .iter()
        .map(|chapter| {
            let result = progress.get_result(&chapter.slug);
            ChapterReport {
                slug: chapter.slug.clone(),
                title: Some(chapter.title.clone()),
                completed: result.completed,
                score: result.score,
                total_questions: result.total_questions,
            }
        })
        .collect();
    // Results for chapters no longer in the book still count.
    for (slug, result) in progress.chapters() {
        if book.manifest.find(slug).is_none() {
            chapters.push(ChapterReport {
                slug: slug.to_string(),
                title: None,
                completed: result.completed,
                score: result.score,
                total_questions: result.total_questions,
            });
        }
    }

    Ok(ProgressReport {
        chapter_count: book.manifest.len(),
        completed_count: progress.completed_count(),
        completion_percent: progress.aggregate_completion(book.manifest.len()),
        chapters,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    chapter_count: usize,
    completed_count: usize,
    completion_percent: Option<u32>,
    chapters: Vec<ChapterReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterReport {
    slug: String,
    /// `None` for results of chapters that were removed from the book.
    title: Option<String>,
    completed: bool,
    score: u32,
    total_questions: u32,
}

impl ProgressReport {
    fn to_text(&self) -> String {
        let mut text = String::new();
        for chapter in &self.chapters {
            let mark = if chapter.completed { "x" } else { " " };
            let title = chapter.title.as_deref().unwrap_or("(removed)");
            text.push_str(&format!("[{mark}] {title} ({})", chapter.slug));
            if chapter.completed {
                text.push_str(&format!(" {}/{}", chapter.score, chapter.total_questions));
            }
            text.push('\n');
        }
        let percent = self.completion_percent.unwrap_or(0);
        text.push_str(&format!(
            "{} of {} chapters completed ({percent}%).\n",
            self.completed_count, self.chapter_count
        ));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::PROFILE_FILE;
    use crate::helper::create_tmp_copy_of_test_directory;

    #[test]
    fn test_empty_profile() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        let report = progress_report(Some(dir.display().to_string()), None)?;
        assert_eq!(report.chapter_count, 4);
        assert_eq!(report.completed_count, 0);
        assert_eq!(report.completion_percent, Some(0));
        assert_eq!(report.chapters.len(), 4);
        Ok(())
    }

    #[test]
    fn test_report() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        let profile = dir.join(PROFILE_FILE).display().to_string();
        let mut progress = ProgressStore::load(Arc::new(SqliteStore::new(&profile)?))?;
        progress.record_result("bitcoin", 2, 2)?;
        progress.record_result("ethereum", 0, 1)?;
        progress.record_result("dogecoin", 1, 3)?;

        let report = progress_report(Some(dir.display().to_string()), None)?;
        assert_eq!(report.completed_count, 3);
        // Three of four chapters, counting the removed one.
        assert_eq!(report.completion_percent, Some(75));
        assert_eq!(
            report.to_text(),
            "[ ] Preface (preface)\n\
             [x] Bitcoin (bitcoin) 2/2\n\
             [x] Ethereum (ethereum) 0/1\n\
             [ ] Solana (solana)\n\
             [x] (removed) (dogecoin) 1/3\n\
             3 of 4 chapters completed (75%).\n"
        );

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["completionPercent"], 75);
        assert_eq!(json["chapters"][1]["totalQuestions"], 2);
        assert_eq!(json["chapters"][4]["title"], serde_json::Value::Null);
        Ok(())
    }

    #[test]
    fn test_explicit_profile() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        let profile = dir.join("elsewhere.db").display().to_string();
        let mut progress = ProgressStore::load(Arc::new(SqliteStore::new(&profile)?))?;
        progress.record_result("solana", 1, 1)?;
        let report = progress_report(Some(dir.display().to_string()), Some(profile))?;
        assert_eq!(report.completed_count, 1);
        let report = progress_report(Some(dir.display().to_string()), None)?;
        assert_eq!(report.completed_count, 0);
        Ok(())
    }
}
