//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Datamk.
//! The Datamk project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Command-line driver for Datamk.
//!
//! # Usage Examples
//!
//! ```bash
//! # Generate with a clock seed, rows to stdout
//! datamk people.xml
//!
//! # Reproducible run
//! datamk --seed 42 people.xml
//!
//! # Validate the script without generating
//! datamk --check people.xml
//!
//! # Generate (so cross references resolve) but write nothing
//! datamk --gen-only --log-level info people.xml
//! ```

use std::path::PathBuf;

use clap::Parser;
use datamk::context::{DmRunConfig, DmRunMode, DmSeed, DmSession};
use datamk::logging::{self, DmLogConfig};
use datamk::manager::DmModelManager;

const USAGE: &str = "usage: datamk [flags] script.xml";

#[derive(Parser)]
#[command(name = "datamk", version, about = "Generate CSV test data from XML scripts")]
struct Cli {
    /// Random seed: an integer, or `time` for a clock seed
    #[arg(long, alias = "rn", value_name = "SEED")]
    seed: Option<String>,

    /// Build and validate the script only
    #[arg(long, conflicts_with = "gen_only")]
    check: bool,

    /// Generate with all output suppressed
    #[arg(long)]
    gen_only: bool,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write log records as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Append log records to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,

    /// Generation script
    scripts: Vec<PathBuf>,
}

impl Cli {
    fn mode(&self) -> DmRunMode {
        if self.check {
            DmRunMode::CheckOnly
        } else if self.gen_only {
            DmRunMode::GenOnly
        } else {
            DmRunMode::GenForm
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let [script] = cli.scripts.as_slice() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let seed: DmSeed = cli.seed.as_deref().unwrap_or("time").parse()?;
    let config = DmRunConfig::new()
        .seed(seed)
        .mode(cli.mode())
        .log(
            DmLogConfig::new()
                .level(cli.log_level.as_str())
                .json(cli.log_json)
                .file_path(cli.log_file.clone()),
        );
    logging::init(&config.log)?;

    let mut manager = DmModelManager::new();
    manager.add_model_from_file(script, config.mode)?;
    let mut session = DmSession::from_config(&config);
    log::info!("running {} with seed {}", script.display(), session.rng.seed());
    manager.run_models(&mut session)?;
    Ok(())
}
