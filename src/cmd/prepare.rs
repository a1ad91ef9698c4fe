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

use std::collections::HashSet;
use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use walkdir::WalkDir;

use crate::error::Fallible;
use crate::error::fail;
use crate::manifest::MANIFEST_FILE;
use crate::manifest::Manifest;
use crate::manifest::chapter_slug;
use crate::manifest::chapter_title;
use crate::manifest::sort_chapter_files;
use crate::types::chapter::ChapterMeta;

/// Turn a directory of chapter files into a book: copy the top-level `.md`
/// files into `<directory>/chapters` and write the manifest.
pub fn prepare_book(source: String, directory: Option<String>) -> Fallible<()> {
    let source = PathBuf::from(source);
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let manifest = prepare(&source, &directory)?;
    println!(
        "Prepared {} chapters in {}.",
        manifest.len(),
        directory.display()
    );
    Ok(())
}

fn prepare(source: &Path, directory: &Path) -> Fallible<Manifest> {
    if !source.is_dir() {
        return fail("source directory does not exist.");
    }

    let start = Instant::now();
    let mut files: Vec<String> = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                files.push(name.to_string());
            }
        }
    }
    if files.is_empty() {
        return fail("no chapter files in the source directory.");
    }
    sort_chapter_files(&mut files);

    let chapters_dir = directory.join("chapters");
    create_dir_all(&chapters_dir)?;
    let mut slugs: HashSet<String> = HashSet::new();
    let mut chapters: Vec<ChapterMeta> = Vec::new();
    for (index, filename) in files.iter().enumerate() {
        let content = read_to_string(source.join(filename))?;
        let title = chapter_title(&content, filename);
        let slug = chapter_slug(filename);
        if !slugs.insert(slug.clone()) {
            return fail(format!("two chapter files have the slug '{slug}'."));
        }
        write(chapters_dir.join(filename), &content)?;
        log::debug!("{filename} -> {slug} ({title})");
        chapters.push(ChapterMeta::new(index, &slug, &title, filename));
    }

    let manifest = Manifest::new(chapters);
    write(directory.join(MANIFEST_FILE), manifest.to_json()?)?;
    let duration = start.elapsed().as_millis();
    log::debug!("Prepared {} chapters in {duration}ms.", manifest.len());
    Ok(manifest)
}
