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

/// A fingerprint of a chapter's raw text, used as an entity tag so browsers
/// can revalidate chapter files.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContentHash {
    inner: blake3::Hash,
}

impl ContentHash {
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        Self {
            inner: blake3::hash(bytes),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    /// The quoted, shortened form used in `ETag` headers.
    pub fn etag(self) -> String {
        format!("\"{}\"", &self.to_hex()[..16])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_hash() {
        let a = ContentHash::hash_bytes(b"# Bitcoin");
        let b = ContentHash::hash_bytes(b"# Bitcoin");
        let c = ContentHash::hash_bytes(b"# Ethereum");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_etag() {
        let etag = ContentHash::hash_bytes(b"").etag();
        assert_eq!(etag.len(), 18);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
    }
}
