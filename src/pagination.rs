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

//! Splitting a chapter's flowed text into fixed-width pages.
//!
//! The browser lays the chapter out in columns as tall as the reading
//! surface and reports the resulting natural width. From that width we work
//! out how many surface-wide pages the chapter spans, and which horizontal
//! offset shows a given page.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Horizontal space between adjacent pages, in pixels.
pub const DEFAULT_PAGE_GAP: f64 = 64.0;

/// How long after content loads to measure again, to pick up late reflows
/// from fonts and images.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Minimum horizontal travel of a swipe, in logical pixels.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// Sub-pixel overshoot tolerated by [`Rounding::Ceil`].
const CEIL_TOLERANCE: f64 = 1.0;

/// How a fractional page count becomes a whole one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Round to the nearest page. Absorbs layout noise, but may hide a
    /// nearly empty trailing page.
    #[default]
    Nearest,
    /// Round up, so trailing content is never cut off.
    Ceil,
}

/// Tunables of the paginated view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSettings {
    pub gap: f64,
    pub rounding: Rounding,
    pub settle_delay: Duration,
    pub swipe_threshold: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            gap: DEFAULT_PAGE_GAP,
            rounding: Rounding::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
        }
    }
}

/// Layout dimensions reported by the rendering surface.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Natural width of the content once flowed into surface-high columns.
    pub content_width: f64,
    pub surface_width: f64,
    pub surface_height: f64,
}

/// Result of a successful measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub page_count: usize,
    pub surface_height: f64,
}

/// Compute the page layout for a measurement.
///
/// Returns `None` when the surface isn't mounted yet (zero or invalid width
/// or height), in which case callers keep their previous layout. Empty
/// content still occupies one page.
pub fn measure(measurement: Measurement, gap: f64, rounding: Rounding) -> Option<PageLayout> {
    let Measurement {
        content_width,
        surface_width,
        surface_height,
    } = measurement;
    if !(surface_width.is_finite() && surface_width > 0.0) {
        return None;
    }
    if !(surface_height.is_finite() && surface_height > 0.0) {
        return None;
    }
    let content_width = if content_width.is_finite() {
        content_width.max(0.0)
    } else {
        0.0
    };
    let gap = gap.max(0.0);
    let pages = match rounding {
        Rounding::Nearest => ((content_width + gap) / (surface_width + gap)).round(),
        Rounding::Ceil => ((content_width + gap - CEIL_TOLERANCE) / (surface_width + gap)).ceil(),
    };
    let page_count = if pages < 1.0 { 1 } else { pages as usize };
    Some(PageLayout {
        page_count,
        surface_height,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// The result of moving one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to this page of the same chapter.
    Page(usize),
    /// Ran off the chapter in this direction; the caller moves to the
    /// adjacent chapter.
    Boundary(Direction),
}

/// Pagination of the chapter open in the book view.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginationState {
    pub chapter: String,
    /// Zero-based.
    pub current_page: usize,
    /// Always at least one.
    pub page_count: usize,
    /// Height of the reading surface, once a valid measurement arrived.
    pub surface_height: Option<f64>,
    surface_width: Option<f64>,
}

impl PaginationState {
    pub fn new(chapter: &str) -> Self {
        Self {
            chapter: chapter.to_string(),
            current_page: 0,
            page_count: 1,
            surface_height: None,
            surface_width: None,
        }
    }

    /// Replace the page count and surface size with a fresh layout. The
    /// current page is pulled back if the chapter got shorter.
    pub fn apply(&mut self, layout: PageLayout, surface_width: f64) {
        self.page_count = layout.page_count.max(1);
        self.surface_height = Some(layout.surface_height);
        self.surface_width = Some(surface_width);
        if self.current_page >= self.page_count {
            self.current_page = self.page_count - 1;
        }
    }

    pub fn advance(&mut self, direction: Direction) -> Advance {
        match direction {
            Direction::Forward => {
                if self.current_page + 1 < self.page_count {
                    self.current_page += 1;
                    Advance::Page(self.current_page)
                } else {
                    Advance::Boundary(Direction::Forward)
                }
            }
            Direction::Backward => {
                if self.current_page > 0 {
                    self.current_page -= 1;
                    Advance::Page(self.current_page)
                } else {
                    Advance::Boundary(Direction::Backward)
                }
            }
        }
    }

    /// Leftward translation, in pixels, that brings the current page into
    /// view.
    pub fn offset(&self, gap: f64) -> f64 {
        match self.surface_width {
            Some(width) => self.current_page as f64 * (width + gap),
            None => 0.0,
        }
    }
}

/// An input event on the reading surface.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReaderInput {
    /// A click or tap at horizontal position `x` on a surface `width` wide.
    Tap { x: f64, width: f64 },
    /// A key press, named as in DOM `KeyboardEvent.key`.
    Key { key: String },
    /// A touch that started and ended at these horizontal positions.
    Swipe {
        #[serde(rename = "startX")]
        start_x: f64,
        #[serde(rename = "endX")]
        end_x: f64,
    },
    /// The previous/next buttons.
    Step { direction: Direction },
}

impl ReaderInput {
    /// The page direction this input asks for, if any.
    pub fn direction(&self, swipe_threshold: f64) -> Option<Direction> {
        match self {
            ReaderInput::Tap { x, width } => {
                if *width <= 0.0 {
                    None
                } else if *x < width / 3.0 {
                    Some(Direction::Backward)
                } else if *x > width * 2.0 / 3.0 {
                    Some(Direction::Forward)
                } else {
                    None
                }
            }
            ReaderInput::Key { key } => match key.as_str() {
                "ArrowRight" => Some(Direction::Forward),
                "ArrowLeft" => Some(Direction::Backward),
                _ => None,
            },
            ReaderInput::Swipe { start_x, end_x } => {
                let travel = start_x - end_x;
                if travel.abs() <= swipe_threshold {
                    None
                } else if travel > 0.0 {
                    Some(Direction::Forward)
                } else {
                    Some(Direction::Backward)
                }
            }
            ReaderInput::Step { direction } => Some(*direction),
        }
    }
}

/// Why a measurement was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    ContentLoaded,
    Settled,
    Resized,
}

type Listener = Box<dyn FnMut(&PaginationState) + Send>;

/// Owns the pagination of the open chapter and tells subscribers about
/// every change to it.
pub struct Paginator {
    settings: PageSettings,
    state: Option<PaginationState>,
    listeners: Vec<Listener>,
}

impl Paginator {
    pub fn new(settings: PageSettings) -> Self {
        Self {
            settings,
            state: None,
            listeners: Vec::new(),
        }
    }

    /// Register a callback that runs after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&PaginationState) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> Option<&PaginationState> {
        self.state.as_ref()
    }

    pub fn is_open(&self, chapter: &str) -> bool {
        self.state.as_ref().is_some_and(|s| s.chapter == chapter)
    }

    /// Show `chapter`. Opening a different chapter starts over at its first
    /// page; reopening the current one keeps the position.
    pub fn open(&mut self, chapter: &str) {
        if self.is_open(chapter) {
            return;
        }
        self.state = Some(PaginationState::new(chapter));
        self.notify();
    }

    /// Apply a new measurement of the open chapter. Measurements of an
    /// unmounted surface are skipped and the previous layout kept.
    pub fn remeasure(
        &mut self,
        trigger: Trigger,
        measurement: Measurement,
    ) -> Option<&PaginationState> {
        let layout = measure(measurement, self.settings.gap, self.settings.rounding);
        let state = self.state.as_mut()?;
        match layout {
            Some(layout) => {
                let before = state.clone();
                state.apply(layout, measurement.surface_width);
                if *state != before {
                    log::debug!(
                        "{}: {} pages after {trigger:?}",
                        state.chapter,
                        state.page_count
                    );
                    self.notify();
                }
            }
            None => {
                log::debug!("Skipping {trigger:?} measurement of an unmounted surface.");
            }
        }
        self.state.as_ref()
    }

    /// Move one page. `None` if no chapter is open.
    pub fn advance(&mut self, direction: Direction) -> Option<Advance> {
        let state = self.state.as_mut()?;
        let advance = state.advance(direction);
        if let Advance::Page(_) = advance {
            self.notify();
        }
        Some(advance)
    }

    /// Route an input event to [`Paginator::advance`]. `None` if the input
    /// doesn't move pages or no chapter is open.
    pub fn handle_input(&mut self, input: &ReaderInput) -> Option<Advance> {
        let direction = input.direction(self.settings.swipe_threshold)?;
        self.advance(direction)
    }

    /// Offset of the current page, in pixels.
    pub fn offset(&self) -> f64 {
        self.state
            .as_ref()
            .map(|s| s.offset(self.settings.gap))
            .unwrap_or(0.0)
    }

    fn notify(&mut self) {
        if let Some(state) = &self.state {
            for listener in self.listeners.iter_mut() {
                listener(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;

    fn measurement(content_width: f64) -> Measurement {
        Measurement {
            content_width,
            surface_width: 600.0,
            surface_height: 800.0,
        }
    }

    fn open_paginator(pages: usize) -> Paginator {
        let mut paginator = Paginator::new(PageSettings::default());
        paginator.open("bitcoin");
        let width = pages as f64 * 664.0 - 64.0;
        paginator.remeasure(Trigger::ContentLoaded, measurement(width));
        paginator
    }

    #[test]
    fn test_measure_two_pages() {
        let layout = measure(measurement(1200.0), 64.0, Rounding::Nearest).unwrap();
        assert_eq!(layout.page_count, 2);
        assert_eq!(layout.surface_height, 800.0);
    }

    #[test]
    fn test_measure_empty_content_is_one_page() {
        let layout = measure(measurement(0.0), 64.0, Rounding::Nearest).unwrap();
        assert_eq!(layout.page_count, 1);
        let layout = measure(measurement(0.0), 64.0, Rounding::Ceil).unwrap();
        assert_eq!(layout.page_count, 1);
    }

    #[test]
    fn test_measure_unmounted_surface() {
        let mut m = measurement(1200.0);
        m.surface_width = 0.0;
        assert_eq!(measure(m, 64.0, Rounding::Nearest), None);
        let mut m = measurement(1200.0);
        m.surface_height = 0.0;
        assert_eq!(measure(m, 64.0, Rounding::Nearest), None);
    }

    #[test]
    fn test_measure_absorbs_overshoot() {
        // Three pages plus a few sub-pixels of overshoot.
        let width = 3.0 * 664.0 - 64.0 + 0.6;
        let nearest = measure(measurement(width), 64.0, Rounding::Nearest).unwrap();
        assert_eq!(nearest.page_count, 3);
        let ceil = measure(measurement(width), 64.0, Rounding::Ceil).unwrap();
        assert_eq!(ceil.page_count, 3);
    }

    #[test]
    fn test_rounding_policies_differ_on_short_trailing_page() {
        // Two full pages and a sliver of a third.
        let width = 2.0 * 664.0 + 100.0;
        let nearest = measure(measurement(width), 64.0, Rounding::Nearest).unwrap();
        let ceil = measure(measurement(width), 64.0, Rounding::Ceil).unwrap();
        assert_eq!(nearest.page_count, 2);
        assert_eq!(ceil.page_count, 3);
    }

    #[test]
    fn test_measure_is_idempotent() {
        let a = measure(measurement(5000.0), 64.0, Rounding::Nearest);
        let b = measure(measurement(5000.0), 64.0, Rounding::Nearest);
        assert_eq!(a, b);
    }

    #[test]
    fn test_advance_and_boundaries() {
        let mut state = PaginationState::new("bitcoin");
        state.page_count = 3;
        assert_eq!(state.advance(Direction::Backward), Advance::Boundary(Direction::Backward));
        assert_eq!(state.advance(Direction::Forward), Advance::Page(1));
        assert_eq!(state.advance(Direction::Forward), Advance::Page(2));
        assert_eq!(state.advance(Direction::Forward), Advance::Boundary(Direction::Forward));
        assert_eq!(state.current_page, 2);
        assert_eq!(state.advance(Direction::Backward), Advance::Page(1));
    }

    #[test]
    fn test_round_trip_returns_to_first_page() {
        let mut paginator = open_paginator(5);
        let mut steps = 0;
        while let Some(Advance::Page(_)) = paginator.advance(Direction::Forward) {
            steps += 1;
        }
        assert_eq!(steps, 4);
        for _ in 0..steps {
            paginator.advance(Direction::Backward);
        }
        assert_eq!(paginator.state().unwrap().current_page, 0);
    }

    #[test]
    fn test_unmounted_measurement_keeps_previous_state() {
        let mut paginator = open_paginator(4);
        let before = paginator.state().cloned();
        let mut m = measurement(1200.0);
        m.surface_width = 0.0;
        paginator.remeasure(Trigger::Resized, m);
        assert_eq!(paginator.state().cloned(), before);
    }

    #[test]
    fn test_latest_measurement_wins() {
        let mut paginator = open_paginator(4);
        paginator.remeasure(Trigger::Settled, measurement(1200.0));
        paginator.remeasure(Trigger::Resized, measurement(3.0 * 664.0 - 64.0));
        assert_eq!(paginator.state().unwrap().page_count, 3);
    }

    #[test]
    fn test_shrinking_clamps_current_page() {
        let mut paginator = open_paginator(4);
        paginator.advance(Direction::Forward);
        paginator.advance(Direction::Forward);
        paginator.advance(Direction::Forward);
        assert_eq!(paginator.state().unwrap().current_page, 3);
        paginator.remeasure(Trigger::Resized, measurement(1200.0));
        let state = paginator.state().unwrap();
        assert_eq!(state.page_count, 2);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_opening_another_chapter_resets() {
        let mut paginator = open_paginator(4);
        paginator.advance(Direction::Forward);
        paginator.open("bitcoin");
        assert_eq!(paginator.state().unwrap().current_page, 1);
        paginator.open("ethereum");
        let state = paginator.state().unwrap();
        assert_eq!(state.chapter, "ethereum");
        assert_eq!(state.current_page, 0);
        assert_eq!(state.page_count, 1);
        assert_eq!(state.surface_height, None);
    }

    #[test]
    fn test_nothing_open() {
        let mut paginator = Paginator::new(PageSettings::default());
        assert_eq!(paginator.advance(Direction::Forward), None);
        assert!(paginator.remeasure(Trigger::Settled, measurement(10.0)).is_none());
        assert_eq!(paginator.offset(), 0.0);
    }

    #[test]
    fn test_offset() {
        let mut paginator = open_paginator(3);
        assert_eq!(paginator.offset(), 0.0);
        paginator.advance(Direction::Forward);
        assert_eq!(paginator.offset(), 664.0);
    }

    #[test]
    fn test_tap_zones() {
        let tap = |x: f64| ReaderInput::Tap { x, width: 900.0 }.direction(50.0);
        assert_eq!(tap(100.0), Some(Direction::Backward));
        assert_eq!(tap(450.0), None);
        assert_eq!(tap(800.0), Some(Direction::Forward));
    }

    #[test]
    fn test_keys() {
        let key = |k: &str| ReaderInput::Key { key: k.to_string() }.direction(50.0);
        assert_eq!(key("ArrowRight"), Some(Direction::Forward));
        assert_eq!(key("ArrowLeft"), Some(Direction::Backward));
        assert_eq!(key("Enter"), None);
    }

    #[test]
    fn test_swipe_threshold() {
        let swipe =
            |start_x: f64, end_x: f64| ReaderInput::Swipe { start_x, end_x }.direction(50.0);
        assert_eq!(swipe(300.0, 250.0), None);
        assert_eq!(swipe(300.0, 249.0), Some(Direction::Forward));
        assert_eq!(swipe(100.0, 200.0), Some(Direction::Backward));
    }

    #[test]
    fn test_deserialize_input() {
        let input: ReaderInput =
            serde_json::from_str(r#"{"kind":"swipe","startX":10,"endX":90}"#).unwrap();
        assert_eq!(input, ReaderInput::Swipe { start_x: 10.0, end_x: 90.0 });
        let input: ReaderInput =
            serde_json::from_str(r#"{"kind":"step","direction":"backward"}"#).unwrap();
        assert_eq!(input.direction(50.0), Some(Direction::Backward));
    }

    #[test]
    fn test_listeners_see_changes() {
        let seen: Arc<Mutex<Vec<(String, usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut paginator = Paginator::new(PageSettings::default());
        let sink = seen.clone();
        paginator.subscribe(move |state| {
            sink.lock()
                .unwrap()
                .push((state.chapter.clone(), state.current_page, state.page_count));
        });
        paginator.open("solana");
        paginator.remeasure(Trigger::ContentLoaded, measurement(1200.0));
        // Same layout again: no change, no notification.
        paginator.remeasure(Trigger::Settled, measurement(1200.0));
        paginator.advance(Direction::Forward);
        // Boundary: no change.
        paginator.advance(Direction::Forward);
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("solana".to_string(), 0, 1),
                ("solana".to_string(), 0, 2),
                ("solana".to_string(), 1, 2),
            ]
        );
    }
}
