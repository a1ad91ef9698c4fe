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
use std::future::Future;
use std::path::Component;
use std::path::PathBuf;

use reqwest::StatusCode;

/// Markdown shown in place of a chapter that could not be fetched.
pub const PLACEHOLDER: &str = "# Error Loading Chapter\n\nCould not fetch the chapter content.\n";

/// Why chapter text could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentError {
    /// Nothing exists at the content reference.
    NotFound,
    /// The content exists but could not be read or transferred.
    Unavailable(String),
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentError::NotFound => write!(f, "not found"),
            ContentError::Unavailable(reason) => write!(f, "unavailable: {reason}"),
        }
    }
}

/// Serves raw chapter text by content reference (a [`ChapterMeta`] path).
///
/// [`ChapterMeta`]: crate::types::chapter::ChapterMeta
pub trait ContentStore: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ContentError>> + Send;
}

/// Chapter files under a book directory.
///
/// Content references come from clients, so paths that could escape the
/// directory are rejected.
#[derive(Clone)]
pub struct DirectoryStore {
    /// Absolute path to the book directory.
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: PathBuf) -> Self {
        assert!(root.is_absolute());
        Self { root }
    }

    /// The file a content reference points to, if it is a regular file
    /// inside the book directory.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ContentError> {
        let relative = PathBuf::from(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(ContentError::NotFound);
        }
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ContentError::NotFound);
        }
        let full = self.root.join(relative);
        if full.is_symlink() || !full.is_file() {
            return Err(ContentError::NotFound);
        }
        Ok(full)
    }
}

impl ContentStore for DirectoryStore {
    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))
    }
}

/// Chapter files served by a remote host.
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ContentStore for HttpStore {
    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ContentError::NotFound),
            status if !status.is_success() => Err(ContentError::Unavailable(status.to_string())),
            _ => response
                .text()
                .await
                .map_err(|e| ContentError::Unavailable(e.to_string())),
        }
    }
}

/// Where the server reads chapter text from: the book directory, or a
/// remote copy of its `chapters/` files.
#[derive(Clone)]
pub enum ChapterSource {
    Directory(DirectoryStore),
    Http(HttpStore),
}

impl ContentStore for ChapterSource {
    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        match self {
            ChapterSource::Directory(store) => store.fetch(path).await,
            ChapterSource::Http(store) => store.fetch(path).await,
        }
    }
}

/// Chapter text ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedChapter {
    pub slug: String,
    pub text: String,
    /// Whether `text` is the placeholder standing in for a failed fetch.
    pub placeholder: bool,
}

/// A fetch in flight, for the chapter that was current when it started.
#[derive(Debug)]
pub struct LoadTicket {
    slug: String,
}

/// Tracks which chapter the reader is waiting for, so that a fetch which
/// resolves after the reader has moved on is thrown away instead of
/// replacing the newer chapter.
#[derive(Default)]
pub struct ChapterLoader {
    target: Option<String>,
    displayed: Option<LoadedChapter>,
}

impl ChapterLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `slug`, making it the current target.
    pub fn begin(&mut self, slug: &str) -> LoadTicket {
        self.target = Some(slug.to_string());
        LoadTicket {
            slug: slug.to_string(),
        }
    }

    /// The chapter currently being waited for or shown.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Finish a fetch. Returns `None` if the ticket is stale. Failures are
    /// replaced by [`PLACEHOLDER`].
    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        result: Result<String, ContentError>,
    ) -> Option<&LoadedChapter> {
        if self.target.as_deref() != Some(ticket.slug.as_str()) {
            log::debug!("Discarding stale fetch of {}.", ticket.slug);
            return None;
        }
        let chapter = match result {
            Ok(text) => LoadedChapter {
                slug: ticket.slug,
                text,
                placeholder: false,
            },
            Err(e) => {
                log::debug!("Could not load {}: {e}", ticket.slug);
                LoadedChapter {
                    slug: ticket.slug,
                    text: PLACEHOLDER.to_string(),
                    placeholder: true,
                }
            }
        };
        self.displayed = Some(chapter);
        self.displayed.as_ref()
    }

    pub fn displayed(&self) -> Option<&LoadedChapter> {
        self.displayed.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir_all;
    use std::fs::write;

    use super::*;
    use crate::error::Fallible;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_commit_current() {
        let mut loader = ChapterLoader::new();
        let ticket = loader.begin("bitcoin");
        let loaded = loader.commit(ticket, Ok("# Bitcoin".to_string())).cloned();
        assert_eq!(
            loaded,
            Some(LoadedChapter {
                slug: "bitcoin".to_string(),
                text: "# Bitcoin".to_string(),
                placeholder: false,
            })
        );
        assert_eq!(loader.displayed(), loaded.as_ref());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut loader = ChapterLoader::new();
        let ethereum = loader.begin("ethereum");
        let solana = loader.begin("solana");
        assert!(loader.commit(solana, Ok("# Solana".to_string())).is_some());
        assert!(loader.commit(ethereum, Ok("# Ethereum".to_string())).is_none());
        let displayed = loader.displayed().unwrap();
        assert_eq!(displayed.slug, "solana");
        assert_eq!(displayed.text, "# Solana");
    }

    #[test]
    fn test_stale_fetch_resolving_first_is_discarded() {
        let mut loader = ChapterLoader::new();
        let ethereum = loader.begin("ethereum");
        let solana = loader.begin("solana");
        assert!(loader.commit(ethereum, Ok("# Ethereum".to_string())).is_none());
        assert!(loader.displayed().is_none());
        loader.commit(solana, Ok("# Solana".to_string()));
        assert_eq!(loader.displayed().unwrap().slug, "solana");
    }

    #[test]
    fn test_failure_becomes_placeholder() {
        let mut loader = ChapterLoader::new();
        let ticket = loader.begin("defi");
        let loaded = loader.commit(ticket, Err(ContentError::NotFound)).unwrap();
        assert!(loaded.placeholder);
        assert_eq!(loaded.text, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_directory_store() -> Fallible<()> {
        let root = create_tmp_directory()?;
        create_dir_all(root.join("chapters"))?;
        write(root.join("chapters/ch01_bitcoin.md"), "# Bitcoin\n")?;
        let store = DirectoryStore::new(root);
        assert_eq!(
            store.fetch("/chapters/ch01_bitcoin.md").await,
            Ok("# Bitcoin\n".to_string())
        );
        assert_eq!(
            store.fetch("/chapters/missing.md").await,
            Err(ContentError::NotFound)
        );
        assert_eq!(store.fetch("/chapters").await, Err(ContentError::NotFound));
        Ok(())
    }

    #[test]
    fn test_directory_store_rejects_traversal() -> Fallible<()> {
        let root = create_tmp_directory()?;
        let store = DirectoryStore::new(root);
        assert_eq!(
            store.resolve("/chapters/../../../../etc/passwd"),
            Err(ContentError::NotFound)
        );
        assert_eq!(store.resolve("//etc/passwd"), Err(ContentError::NotFound));
        assert_eq!(store.resolve(""), Err(ContentError::NotFound));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_store_rejects_symlinks() -> Fallible<()> {
        let root = create_tmp_directory()?;
        let outside = create_tmp_directory()?;
        write(outside.join("secret.md"), "secret")?;
        create_dir_all(root.join("chapters"))?;
        std::os::unix::fs::symlink(outside.join("secret.md"), root.join("chapters/link.md"))?;
        let store = DirectoryStore::new(root);
        assert_eq!(
            store.resolve("/chapters/link.md"),
            Err(ContentError::NotFound)
        );
        Ok(())
    }
}
