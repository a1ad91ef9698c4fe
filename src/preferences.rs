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

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Fallible;
use crate::storage::KeyValueStore;
use crate::types::view_mode::Theme;
use crate::types::view_mode::ViewMode;

const VIEW_MODE_KEY: &str = "viewMode";
const THEME_KEY: &str = "theme";
const SOUND_KEY: &str = "soundEnabled";
const UNLOCKED_KEY: &str = "unlockedSandboxes";

/// Reader preferences, stored in the same profile as progress. Stored values
/// that can't be parsed fall back to the defaults.
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The last-selected presentation mode.
    pub fn view_mode(&self) -> Fallible<ViewMode> {
        let value = self.store.get(VIEW_MODE_KEY)?;
        Ok(value
            .and_then(|v| ViewMode::try_from(v.as_str()).ok())
            .unwrap_or_default())
    }

    pub fn set_view_mode(&self, mode: ViewMode) -> Fallible<()> {
        self.store.set(VIEW_MODE_KEY, mode.as_str())
    }

    pub fn theme(&self) -> Fallible<Theme> {
        let value = self.store.get(THEME_KEY)?;
        Ok(value
            .and_then(|v| Theme::try_from(v.as_str()).ok())
            .unwrap_or_default())
    }

    /// Flip the theme, returning the new one.
    pub fn toggle_theme(&self) -> Fallible<Theme> {
        let theme = self.theme()?.toggle();
        self.store.set(THEME_KEY, theme.as_str())?;
        Ok(theme)
    }

    pub fn sound_enabled(&self) -> Fallible<bool> {
        let value = self.store.get(SOUND_KEY)?;
        Ok(value.as_deref() == Some("true"))
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> Fallible<()> {
        self.store
            .set(SOUND_KEY, if enabled { "true" } else { "false" })
    }

    /// Whether the chapter's sandbox gate has been opened.
    pub fn is_unlocked(&self, slug: &str) -> Fallible<bool> {
        Ok(self.unlocked()?.contains(slug))
    }

    pub fn unlock(&self, slug: &str) -> Fallible<()> {
        let mut unlocked = self.unlocked()?;
        if unlocked.insert(slug.to_string()) {
            let json = serde_json::to_string(&unlocked)?;
            self.store.set(UNLOCKED_KEY, &json)?;
        }
        Ok(())
    }

    fn unlocked(&self) -> Fallible<BTreeSet<String>> {
        let value = self.store.get(UNLOCKED_KEY)?;
        let unlocked = match value {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Discarding malformed sandbox record: {e}");
                BTreeSet::new()
            }),
            None => BTreeSet::new(),
        };
        Ok(unlocked)
    }
}
