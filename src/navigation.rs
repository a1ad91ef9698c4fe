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

use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;

use crate::manifest::Manifest;
use crate::types::view_mode::ViewMode;

/// Characters escaped in a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A view of the reader, as addressed by a URL path.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/<slug>`, `/book/<slug>` or `/interactive/<slug>`.
    Chapter { mode: ViewMode, slug: String },
    /// `/book` or `/interactive` with no chapter.
    ModeIndex(ViewMode),
    /// Anything else.
    Unknown,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["book"] => Route::ModeIndex(ViewMode::Book),
            ["interactive"] => Route::ModeIndex(ViewMode::Interactive),
            [slug] => Route::Chapter {
                mode: ViewMode::Web,
                slug: decode(slug),
            },
            ["book", slug] => Route::Chapter {
                mode: ViewMode::Book,
                slug: decode(slug),
            },
            ["interactive", slug] => Route::Chapter {
                mode: ViewMode::Interactive,
                slug: decode(slug),
            },
            _ => Route::Unknown,
        }
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// The path of a chapter in a view mode.
pub fn chapter_path(mode: ViewMode, slug: &str) -> String {
    let slug = utf8_percent_encode(slug, SEGMENT);
    match mode {
        ViewMode::Web => format!("/{slug}"),
        ViewMode::Book => format!("/book/{slug}"),
        ViewMode::Interactive => format!("/interactive/{slug}"),
    }
}

/// Where to go when switching to `mode` from `current_path`: the same
/// chapter in the new mode, or the first chapter if the current path
/// doesn't name a known one. `None` for an empty book.
pub fn switch_mode(manifest: &Manifest, current_path: &str, mode: ViewMode) -> Option<String> {
    let slug = match Route::parse(current_path) {
        Route::Chapter { slug, .. } => slug,
        _ => String::new(),
    };
    let chapter = manifest.resolve(&slug)?;
    Some(chapter_path(mode, &chapter.slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chapter::ChapterMeta;

    fn make_manifest() -> Manifest {
        Manifest::new(vec![
            ChapterMeta::new(0, "preface", "Preface", "_preface.md"),
            ChapterMeta::new(1, "bitcoin", "Bitcoin", "ch01_bitcoin.md"),
        ])
    }

    #[test]
    fn test_parse() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(
            Route::parse("/bitcoin"),
            Route::Chapter {
                mode: ViewMode::Web,
                slug: "bitcoin".to_string()
            }
        );
        assert_eq!(
            Route::parse("/book/bitcoin/"),
            Route::Chapter {
                mode: ViewMode::Book,
                slug: "bitcoin".to_string()
            }
        );
        assert_eq!(
            Route::parse("/interactive/l1%20chains?x=1"),
            Route::Chapter {
                mode: ViewMode::Interactive,
                slug: "l1 chains".to_string()
            }
        );
        assert_eq!(Route::parse("/book"), Route::ModeIndex(ViewMode::Book));
        assert_eq!(Route::parse("/a/b/c"), Route::Unknown);
        assert_eq!(Route::parse("/web/bitcoin"), Route::Unknown);
    }

    #[test]
    fn test_chapter_path() {
        assert_eq!(chapter_path(ViewMode::Web, "bitcoin"), "/bitcoin");
        assert_eq!(chapter_path(ViewMode::Book, "l1 chains"), "/book/l1%20chains");
        assert_eq!(
            chapter_path(ViewMode::Interactive, "defi"),
            "/interactive/defi"
        );
    }

    #[test]
    fn test_switch_mode_keeps_chapter() {
        let manifest = make_manifest();
        assert_eq!(
            switch_mode(&manifest, "/bitcoin", ViewMode::Book),
            Some("/book/bitcoin".to_string())
        );
        assert_eq!(
            switch_mode(&manifest, "/book/bitcoin", ViewMode::Interactive),
            Some("/interactive/bitcoin".to_string())
        );
    }

    #[test]
    fn test_switch_mode_falls_back_to_first_chapter() {
        let manifest = make_manifest();
        assert_eq!(
            switch_mode(&manifest, "/", ViewMode::Book),
            Some("/book/preface".to_string())
        );
        assert_eq!(
            switch_mode(&manifest, "/book", ViewMode::Web),
            Some("/preface".to_string())
        );
        assert_eq!(
            switch_mode(&manifest, "/dogecoin", ViewMode::Interactive),
            Some("/interactive/preface".to_string())
        );
        assert_eq!(switch_mode(&Manifest::default(), "/", ViewMode::Web), None);
    }
}
