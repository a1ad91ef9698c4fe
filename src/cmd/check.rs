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

use crate::book::Book;
use crate::content::DirectoryStore;
use crate::error::Fallible;
use crate::error::fail;

/// Load everything `serve` would load, and check that the pieces agree.
pub fn check_book(directory: Option<String>) -> Fallible<()> {
    let book = Book::open(directory)?;
    let store = DirectoryStore::new(book.directory.clone());
    for chapter in book.manifest.chapters() {
        if store.resolve(&chapter.path).is_err() {
            return fail(format!(
                "chapter '{}' is missing its file {}.",
                chapter.slug, chapter.filename
            ));
        }
    }
    for slug in book.quizzes.slugs() {
        if book.manifest.find(slug).is_none() {
            return fail(format!("quiz for unknown chapter '{slug}'."));
        }
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::remove_file;
    use std::fs::write;

    use super::check_book;
    use crate::error::Fallible;
    use crate::helper::create_tmp_copy_of_test_directory;

    #[test]
    fn test_non_existent_directory() {
        assert!(check_book(Some("./derpherp".to_string())).is_err());
    }

    #[test]
    fn test_directory() {
        assert!(check_book(Some("./test".to_string())).is_ok());
    }

    #[test]
    fn test_missing_chapter_file() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        remove_file(dir.join("chapters").join("ch03_solana.md"))?;
        let err = check_book(Some(dir.display().to_string())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error: chapter 'solana' is missing its file ch03_solana.md."
        );
        Ok(())
    }

    #[test]
    fn test_quiz_for_unknown_chapter() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        write(
            dir.join("quizzes.toml"),
            "[[dogecoin.questions]]\nquestion = \"?\"\noptions = [\"a\", \"b\"]\ncorrect = 0\nexplanation = \"\"\n",
        )?;
        let err = check_book(Some(dir.display().to_string())).unwrap_err();
        assert_eq!(err.to_string(), "error: quiz for unknown chapter 'dogecoin'.");
        Ok(())
    }

    #[test]
    fn test_malformed_config() -> Fallible<()> {
        let dir = create_tmp_copy_of_test_directory()?;
        write(dir.join("folio.toml"), "page_gap = \"wide\"\n")?;
        assert!(check_book(Some(dir.display().to_string())).is_err());
        Ok(())
    }
}
