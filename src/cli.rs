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

use clap::Parser;

use crate::cmd::check::check_book;
use crate::cmd::prepare::prepare_book;
use crate::cmd::progress::ProgressFormat;
use crate::cmd::progress::print_progress;
use crate::cmd::serve::server::start_server;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve a book in the browser.
    Serve {
        /// Path to the book directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The port to use for the web server. Default is 8000.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Path to the profile database. By default, `folio.db` in the book directory.
        #[arg(long)]
        profile: Option<String>,
        /// Fetch chapter files from this base URL instead of the book directory.
        #[arg(long)]
        content_url: Option<String>,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
    /// Build a book directory from a directory of chapter files.
    Prepare {
        /// Directory containing the chapter markdown files.
        source: String,
        /// Path to the book directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print reading progress.
    Progress {
        /// Path to the book directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Path to the profile database. By default, `folio.db` in the book directory.
        #[arg(long)]
        profile: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = ProgressFormat::Text)]
        format: ProgressFormat,
    },
    /// Check the integrity of a book.
    Check {
        /// Path to the book directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            directory,
            port,
            profile,
            content_url,
            no_open,
        } => start_server(directory, port, profile, content_url, !no_open).await,
        Command::Prepare { source, directory } => prepare_book(source, directory),
        Command::Progress {
            directory,
            profile,
            format,
        } => print_progress(directory, profile, format),
        Command::Check { directory } => check_book(directory),
    }
}
