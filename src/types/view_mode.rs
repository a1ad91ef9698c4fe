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

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// The three presentations of a chapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Continuous scroll.
    #[default]
    Web,
    /// Paginated spread.
    Book,
    /// Quizzes and sandboxes alongside the text.
    Interactive,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Web => "web",
            ViewMode::Book => "book",
            ViewMode::Interactive => "interactive",
        }
    }

    /// The mode after this one when cycling.
    pub fn next(self) -> Self {
        match self {
            ViewMode::Web => ViewMode::Book,
            ViewMode::Book => ViewMode::Interactive,
            ViewMode::Interactive => ViewMode::Web,
        }
    }
}

impl TryFrom<&str> for ViewMode {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "web" => Ok(ViewMode::Web),
            "book" => Ok(ViewMode::Book),
            "interactive" => Ok(ViewMode::Interactive),
            _ => fail(format!("invalid view mode: {value}")),
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl TryFrom<&str> for Theme {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => fail(format!("invalid theme: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle() {
        let mode = ViewMode::Web;
        assert_eq!(mode.next(), ViewMode::Book);
        assert_eq!(mode.next().next(), ViewMode::Interactive);
        assert_eq!(mode.next().next().next(), ViewMode::Web);
    }

    #[test]
    fn test_parse() {
        assert_eq!(ViewMode::try_from("book"), Ok(ViewMode::Book));
        assert!(ViewMode::try_from("kindle").is_err());
        assert_eq!(Theme::try_from("dark"), Ok(Theme::Dark));
        assert!(Theme::try_from("").is_err());
    }

    #[test]
    fn test_toggle_theme() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
    }
}
