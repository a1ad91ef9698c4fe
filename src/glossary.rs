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

use crate::error::Fallible;

/// Terms that the lab view annotates with their definitions.
#[derive(Default, Debug)]
pub struct Glossary {
    /// Lowercased terms and their definitions, longest first so that
    /// "Smart Contract" wins over "Smart".
    terms: Vec<(String, String)>,
}

/// A piece of text split by [`Glossary::split`].
#[derive(Debug, PartialEq)]
pub enum Fragment<'a> {
    Plain(&'a str),
    Term {
        /// The text as it appears in the chapter.
        text: &'a str,
        definition: &'a str,
    },
}

impl Glossary {
    /// Load `glossary.toml` (a table of term to definition). A missing file
    /// is an empty glossary.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        let entries: BTreeMap<String, String> = toml::from_str(&content)?;
        Ok(Self::new(entries))
    }

    pub fn new(entries: BTreeMap<String, String>) -> Self {
        let mut terms: Vec<(String, String)> = entries
            .into_iter()
            .filter(|(term, _)| !term.trim().is_empty())
            .map(|(term, definition)| (term.to_ascii_lowercase(), definition))
            .collect();
        terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Split `text` around whole-word, case-insensitive occurrences of
    /// glossary terms.
    pub fn split<'a>(&'a self, text: &'a str) -> Vec<Fragment<'a>> {
        let mut fragments = Vec::new();
        if self.terms.is_empty() {
            fragments.push(Fragment::Plain(text));
            return fragments;
        }
        let lower = text.to_ascii_lowercase();
        let mut plain_start = 0;
        let mut cursor = 0;
        while cursor < text.len() {
            let at_boundary = cursor == 0 || !is_word_char(text[..cursor].chars().next_back());
            let found = if at_boundary {
                self.terms.iter().find(|(needle, _)| {
                    let end = cursor + needle.len();
                    lower[cursor..].starts_with(needle.as_str())
                        && (end == text.len() || !is_word_char(text[end..].chars().next()))
                })
            } else {
                None
            };
            match found {
                Some((needle, definition)) => {
                    if plain_start < cursor {
                        fragments.push(Fragment::Plain(&text[plain_start..cursor]));
                    }
                    let end = cursor + needle.len();
                    fragments.push(Fragment::Term {
                        text: &text[cursor..end],
                        definition,
                    });
                    cursor = end;
                    plain_start = end;
                }
                None => {
                    cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        if plain_start < text.len() {
            fragments.push(Fragment::Plain(&text[plain_start..]));
        }
        fragments
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_directory;

    fn make_glossary() -> Glossary {
        let mut entries = BTreeMap::new();
        entries.insert("PoW".to_string(), "Proof of Work.".to_string());
        entries.insert("Smart Contract".to_string(), "Self-executing code.".to_string());
        entries.insert("Smart".to_string(), "Clever.".to_string());
        Glossary::new(entries)
    }

    #[test]
    fn test_split() {
        let glossary = make_glossary();
        let fragments = glossary.split("Bitcoin uses pow, not a smart contract.");
        assert_eq!(
            fragments,
            vec![
                Fragment::Plain("Bitcoin uses "),
                Fragment::Term {
                    text: "pow",
                    definition: "Proof of Work."
                },
                Fragment::Plain(", not a "),
                Fragment::Term {
                    text: "smart contract",
                    definition: "Self-executing code."
                },
                Fragment::Plain("."),
            ]
        );
    }

    #[test]
    fn test_whole_words_only() {
        let glossary = make_glossary();
        assert_eq!(
            glossary.split("Powerful smartness"),
            vec![Fragment::Plain("Powerful smartness")]
        );
    }

    #[test]
    fn test_unicode_text() {
        let glossary = make_glossary();
        let fragments = glossary.split("Ünïcode — PoW");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], Fragment::Plain("Ünïcode — "));
    }

    #[test]
    fn test_empty_glossary() {
        let glossary = Glossary::default();
        assert!(glossary.is_empty());
        assert_eq!(glossary.split("PoW"), vec![Fragment::Plain("PoW")]);
    }

    #[test]
    fn test_load() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.join("glossary.toml");
        assert!(Glossary::load(&path)?.is_empty());
        std::fs::write(&path, "PoS = \"Proof of Stake.\"\n\"Hash Rate\" = \"Mining power.\"\n")?;
        let glossary = Glossary::load(&path)?;
        assert_eq!(glossary.len(), 2);
        Ok(())
    }
}
