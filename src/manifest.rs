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

use std::fs::read_to_string;
use std::path::Path;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::chapter::ChapterMeta;

/// The manifest's file name inside a book directory.
pub const MANIFEST_FILE: &str = "chapters.json";

/// The book's chapters, in reading order.
#[derive(Debug, Default, PartialEq)]
pub struct Manifest {
    chapters: Vec<ChapterMeta>,
}

impl Manifest {
    pub fn new(chapters: Vec<ChapterMeta>) -> Self {
        Self { chapters }
    }

    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return fail(format!(
                "no {MANIFEST_FILE} in the book directory (run `folio prepare` first)."
            ));
        }
        let content = read_to_string(path)?;
        let chapters: Vec<ChapterMeta> = serde_json::from_str(&content)?;
        Ok(Self { chapters })
    }

    pub fn to_json(&self) -> Fallible<String> {
        Ok(serde_json::to_string_pretty(&self.chapters)?)
    }

    pub fn chapters(&self) -> &[ChapterMeta] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn first(&self) -> Option<&ChapterMeta> {
        self.chapters.first()
    }

    /// The chapter with this slug, and its position.
    pub fn find(&self, slug: &str) -> Option<(usize, &ChapterMeta)> {
        self.chapters
            .iter()
            .enumerate()
            .find(|(_, chapter)| chapter.slug == slug)
    }

    /// The chapter with this slug, falling back to the first chapter for
    /// unknown slugs. `None` only for an empty book.
    pub fn resolve(&self, slug: &str) -> Option<&ChapterMeta> {
        self.find(slug).map(|(_, chapter)| chapter).or(self.first())
    }

    pub fn previous(&self, slug: &str) -> Option<&ChapterMeta> {
        let (index, _) = self.find(slug)?;
        index.checked_sub(1).and_then(|i| self.chapters.get(i))
    }

    pub fn next(&self, slug: &str) -> Option<&ChapterMeta> {
        let (index, _) = self.find(slug)?;
        self.chapters.get(index + 1)
    }
}

/// The title of a chapter file: its first `# ` heading, or else the file
/// name with underscores as spaces.
pub fn chapter_title(content: &str, filename: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| {
            filename
                .trim_end_matches(".md")
                .replace('_', " ")
                .trim()
                .to_string()
        })
}

/// The slug of a chapter file: `_preface.md` is `preface`, otherwise the
/// file stem without a `chNN_` prefix.
pub fn chapter_slug(filename: &str) -> String {
    if filename == "_preface.md" {
        return "preface".to_string();
    }
    let stem = filename.trim_end_matches(".md");
    if let Some(rest) = stem.strip_prefix("ch") {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            if let Some(slug) = rest[digits..].strip_prefix('_') {
                return slug.to_string();
            }
        }
    }
    stem.to_string()
}

/// Reading order of chapter files: the preface, then by name.
pub fn sort_chapter_files(files: &mut [String]) {
    files.sort_by(|a, b| {
        let a_preface = a == "_preface.md";
        let b_preface = b == "_preface.md";
        b_preface.cmp(&a_preface).then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_directory;

    fn make_manifest() -> Manifest {
        Manifest::new(vec![
            ChapterMeta::new(0, "preface", "Preface", "_preface.md"),
            ChapterMeta::new(1, "bitcoin", "Bitcoin", "ch01_bitcoin.md"),
            ChapterMeta::new(2, "ethereum", "Ethereum", "ch02_ethereum.md"),
        ])
    }

    #[test]
    fn test_find_and_resolve() {
        let manifest = make_manifest();
        assert_eq!(manifest.find("bitcoin").map(|(i, _)| i), Some(1));
        assert_eq!(manifest.resolve("ethereum").unwrap().slug, "ethereum");
        assert_eq!(manifest.resolve("dogecoin").unwrap().slug, "preface");
        assert_eq!(Manifest::default().resolve("bitcoin"), None);
    }

    #[test]
    fn test_neighbours() {
        let manifest = make_manifest();
        assert_eq!(manifest.previous("preface"), None);
        assert_eq!(manifest.previous("bitcoin").unwrap().slug, "preface");
        assert_eq!(manifest.next("bitcoin").unwrap().slug, "ethereum");
        assert_eq!(manifest.next("ethereum"), None);
        assert_eq!(manifest.next("dogecoin"), None);
    }

    #[test]
    fn test_load_round_trip() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.join(MANIFEST_FILE);
        assert!(Manifest::load(&path).is_err());
        let manifest = make_manifest();
        std::fs::write(&path, manifest.to_json()?)?;
        assert_eq!(Manifest::load(&path)?, manifest);
        Ok(())
    }

    #[test]
    fn test_chapter_title() {
        assert_eq!(chapter_title("intro\n# Bitcoin Basics \ntext", "x.md"), "Bitcoin Basics");
        assert_eq!(
            chapter_title("## Only a subheading", "ch03_l1_blockchains.md"),
            "ch03 l1 blockchains"
        );
    }

    #[test]
    fn test_chapter_slug() {
        assert_eq!(chapter_slug("_preface.md"), "preface");
        assert_eq!(chapter_slug("ch01_bitcoin.md"), "bitcoin");
        assert_eq!(chapter_slug("ch12_stablecoins_rwas.md"), "stablecoins_rwas");
        assert_eq!(chapter_slug("chapter.md"), "chapter");
        assert_eq!(chapter_slug("appendix.md"), "appendix");
    }

    #[test]
    fn test_sort_chapter_files() {
        let mut files = vec![
            "ch02_ethereum.md".to_string(),
            "_preface.md".to_string(),
            "ch01_bitcoin.md".to_string(),
        ];
        sort_chapter_files(&mut files);
        assert_eq!(files, vec!["_preface.md", "ch01_bitcoin.md", "ch02_ethereum.md"]);
    }
}
