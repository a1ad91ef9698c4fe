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

use maud::DOCTYPE;
use maud::Markup;
use maud::html;

use crate::types::view_mode::Theme;
use crate::types::view_mode::ViewMode;

const MODES: [ViewMode; 3] = [ViewMode::Web, ViewMode::Book, ViewMode::Interactive];

pub fn page_template(title: &str, theme: Theme, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" data-theme=(theme.as_str()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | folio" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                (body)
                script src="/script.js" {};
            }
        }
    }
}

/// The bar at the top of every page: mode switcher and preference toggles.
/// `from` is the path of the current page, so the server can send the
/// reader back to the same chapter.
pub fn toolbar(from: &str, current: Option<ViewMode>, theme: Theme, sound: bool) -> Markup {
    html! {
        nav.toolbar {
            a.brand href="/" { "folio" }
            div.modes {
                @for mode in MODES {
                    form action="/preferences" method="post" {
                        input type="hidden" name="from" value=(from);
                        input type="hidden" name="mode" value=(mode.as_str());
                        @if current == Some(mode) {
                            button.mode.active type="submit" name="action" value="Mode" { (mode_label(mode)) }
                        } @else {
                            button.mode type="submit" name="action" value="Mode" { (mode_label(mode)) }
                        }
                    }
                }
                form action="/preferences" method="post" {
                    input type="hidden" name="from" value=(from);
                    button id="cycle" type="submit" name="action" value="Cycle" title="Next mode" { "⟳" }
                }
            }
            div.spacer {}
            form action="/preferences" method="post" {
                input type="hidden" name="from" value=(from);
                button id="theme" type="submit" name="action" value="ToggleTheme" {
                    @match theme {
                        Theme::Light => { "Dark" }
                        Theme::Dark => { "Light" }
                    }
                }
                button id="sound" type="submit" name="action" value="ToggleSound" {
                    @if sound { "Sound on" } @else { "Sound off" }
                }
            }
        }
    }
}

pub fn mode_label(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Web => "Web",
        ViewMode::Book => "Book",
        ViewMode::Interactive => "Lab",
    }
}
