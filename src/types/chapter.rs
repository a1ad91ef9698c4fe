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

/// Identifies one chapter of the book. Created once from the manifest and
/// never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMeta {
    /// Opaque identifier, of the form `chapter-<index>`.
    pub id: String,
    /// URL-friendly name used for addressing the chapter.
    pub slug: String,
    /// Display title, taken from the chapter's first heading.
    pub title: String,
    /// Name of the chapter file.
    pub filename: String,
    /// Content reference, resolved by a content store.
    pub path: String,
}

impl ChapterMeta {
    pub fn new(index: usize, slug: &str, title: &str, filename: &str) -> Self {
        Self {
            id: format!("chapter-{index}"),
            slug: slug.to_string(),
            title: title.to_string(),
            filename: filename.to_string(),
            path: format!("/chapters/{filename}"),
        }
    }
}
