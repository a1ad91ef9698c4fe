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

use std::env::current_dir;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::CONFIG_FILE;
use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::glossary::Glossary;
use crate::manifest::MANIFEST_FILE;
use crate::manifest::Manifest;
use crate::quiz::QuizBank;

/// The default name of the profile database inside a book directory.
pub const PROFILE_FILE: &str = "folio.db";

/// A prepared book directory and everything read from it at startup.
pub struct Book {
    pub directory: PathBuf,
    pub manifest: Manifest,
    pub quizzes: QuizBank,
    pub glossary: Glossary,
    pub config: Config,
}

impl Book {
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory = book_directory(directory)?;

        log::debug!("Loading book...");
        let start = Instant::now();
        let manifest = Manifest::load(&directory.join(MANIFEST_FILE))?;
        let quizzes = QuizBank::load(&directory.join("quizzes.toml"))?;
        let glossary = Glossary::load(&directory.join("glossary.toml"))?;
        let config = Config::load(&directory.join(CONFIG_FILE))?;
        let duration = start.elapsed().as_millis();
        log::debug!(
            "Loaded {} chapters, {} quizzes and {} glossary terms in {duration}ms.",
            manifest.len(),
            quizzes.len(),
            glossary.len()
        );

        if manifest.is_empty() {
            return fail("the book has no chapters.");
        }

        Ok(Self {
            directory,
            manifest,
            quizzes,
            glossary,
            config,
        })
    }

    /// The profile database to use: `profile` if given, otherwise
    /// [`PROFILE_FILE`] in the book directory.
    pub fn profile_path(&self, profile: Option<String>) -> Fallible<String> {
        let path = match profile {
            Some(path) => PathBuf::from(path),
            None => self.directory.join(PROFILE_FILE),
        };
        let path = path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid profile path"))?;
        Ok(path.to_string())
    }
}

/// Resolve an optional directory argument to an absolute, existing
/// directory, defaulting to the working directory.
pub fn book_directory(directory: Option<String>) -> Fallible<PathBuf> {
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => current_dir()?,
    };
    if directory.exists() {
        Ok(directory.canonicalize()?)
    } else {
        fail("directory does not exist.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_copy_of_test_directory;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_open_test_book() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        let book = Book::open(Some(dir.display().to_string()))?;
        assert_eq!(book.manifest.len(), 4);
        assert!(book.quizzes.get("bitcoin").is_some());
        assert!(!book.glossary.is_empty());
        assert_eq!(
            book.profile_path(None)?,
            dir.join(PROFILE_FILE).display().to_string()
        );
        Ok(())
    }

    #[test]
    fn test_non_existent_directory() {
        let result = Book::open(Some("./derpherp".to_string()));
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
    }

    #[test]
    fn test_unprepared_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert!(Book::open(Some(dir.display().to_string())).is_err());
        Ok(())
    }
}
