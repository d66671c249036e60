// apiseed
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the sample service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use apiseed_core::config::{Config, ConfigResult, MergePolicy};
use apiseed_core::fatal;
use apiseed_core::logger::{self, Logger, LoggerOptions};
use apiseed_example::serve;
use apiseed_example::settings::{self, Settings, candidate_files};
use clap::Parser;
use log::{error, info};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

/// Sample key/value store served over HTTP.
#[derive(Debug, Parser)]
#[command(name = settings::SHORTNAME, version, about, long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// IP address to listen on.
    #[arg(short, long)]
    ip: Option<String>,

    /// Configuration file to load before the default locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increases verbosity: once for DEBUG, twice for TRACE.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppresses console output.
    #[arg(short, long)]
    quiet: bool,

    /// File to which to append log lines.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// JSON file that backs the key/value store.
    #[arg(short, long)]
    database_file: Option<PathBuf>,

    /// Processes the configuration and exits without serving.
    #[arg(short = 'N', long)]
    no_run: bool,
}

impl Args {
    /// Overrides the options in `config` with the values given on the command line.
    fn apply(&self, config: &mut Config) -> ConfigResult<()> {
        if let Some(port) = self.port {
            config.set("port", port)?;
        }
        if let Some(ip) = &self.ip {
            config.set("ip_address", ip.as_str())?;
        }
        match self.verbose {
            0 => (),
            1 => config.set("log_level", "DEBUG")?,
            _ => config.set("log_level", "TRACE")?,
        }
        if self.quiet {
            config.set("quiet", true)?;
        }
        if let Some(log_file) = &self.log_file {
            config.set("log_file", log_file.to_string_lossy().into_owned())?;
        }
        if let Some(database_file) = &self.database_file {
            config.set("database_file", database_file.to_string_lossy().into_owned())?;
        }
        Ok(())
    }
}

/// Installs the process-wide logger configured with `opts`.
fn install_logger(opts: LoggerOptions) {
    if let Err(e) = logger::install(Logger::new(opts)) {
        eprintln!("Cannot install logger: {}", e);
        process::exit(1);
    }
}

/// Resolves the address to listen on from the `settings`.
fn listen_address(settings: &Settings) -> Result<IpAddr, String> {
    settings
        .ip_address()
        .parse::<IpAddr>()
        .map_err(|_| format!("Invalid IP address: {}", settings.ip_address()))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = Config::new(settings::schema());
    let loaded =
        config.load(&candidate_files(args.config.as_deref()), MergePolicy::FirstMatch, None);
    let overridden = args.apply(&mut config);

    let settings = match config.deserialize::<Settings>() {
        Ok(settings) => settings,
        Err(e) => {
            install_logger(LoggerOptions::default());
            fatal!("{}", e);
        }
    };

    let (opts, level_error) = settings.logger_options();
    install_logger(opts);
    if let Some(e) = level_error {
        error!("{}; using INFO", e);
    }

    match loaded {
        Ok(files) => {
            for file in files {
                info!("Loaded configuration file {}", file.display());
            }
        }
        Err(e) => fatal!("{}", e),
    }
    if let Err(e) = overridden {
        fatal!("{}", e);
    }

    let ip_address = match listen_address(&settings) {
        Ok(ip_address) => ip_address,
        Err(e) => fatal!("{}", e),
    };

    if args.no_run {
        info!("Configuration is valid; not serving as requested");
        logger::flush();
        return;
    }

    if let Err(e) = serve(&settings, ip_address).await {
        fatal!("{}", e);
    }
    logger::flush();
}
