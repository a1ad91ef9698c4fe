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
use std::time::Duration;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::pagination::DEFAULT_PAGE_GAP;
use crate::pagination::DEFAULT_SETTLE_DELAY;
use crate::pagination::DEFAULT_SWIPE_THRESHOLD;
use crate::pagination::PageSettings;
use crate::pagination::Rounding;

/// The config file's name inside a book directory.
pub const CONFIG_FILE: &str = "folio.toml";

/// Per-book settings from `folio.toml`. Every field is optional.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Pixels between adjacent pages in the book view.
    pub page_gap: f64,
    /// Milliseconds to wait after content loads before measuring again.
    pub settle_delay_ms: u64,
    /// Minimum swipe travel, in logical pixels.
    pub swipe_threshold: f64,
    pub rounding: Rounding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_gap: DEFAULT_PAGE_GAP,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            rounding: Rounding::default(),
        }
    }
}

impl Config {
    /// Load the config file, or the defaults if there is none.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if !config.page_gap.is_finite() || config.page_gap < 0.0 {
            return fail(format!(
                "page_gap must be a non-negative number, got {}.",
                config.page_gap
            ));
        }
        Ok(config)
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            gap: self.page_gap,
            rounding: self.rounding,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            swipe_threshold: self.swipe_threshold,
        }
    }
}
