// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use stationcheck::{
    FetchLimits, NoopReporter, Resolution, ResolveEvent, ResolveReporter, ResolverOptions,
    SharedResolveReporter, Station, StationResolver,
};

// Emoji with fallback for terminals without Unicode support
static RADIO: Emoji<'_, '_> = Emoji("📻 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static REPEAT: Emoji<'_, '_> = Emoji("🔁 ", "[=] ");

/// Resolve radio station addresses into playable streams
#[derive(Parser, Debug)]
#[command(name = "stationcheck")]
#[command(about = "Resolve radio station addresses into playable streams")]
#[command(version)]
struct Args {
    /// Station addresses (stream URLs or M3U/PLS playlists), resolved in order
    #[arg(required = true)]
    addresses: Vec<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10", env = "STATIONCHECK_TIMEOUT")]
    timeout: u64,

    /// Maximum number of playlist lines to read
    #[arg(long, default_value_t = stationcheck::playlist::MAX_PLAYLIST_LINES)]
    max_lines: usize,

    /// Maximum number of characters kept per playlist line
    #[arg(long, default_value_t = stationcheck::playlist::MAX_LINE_CHARS)]
    max_line_length: usize,

    /// Print stations as JSON
    #[arg(long)]
    json: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// The spinner is off in JSON mode, so notices go straight to stderr
    fn notices_on_stderr(&self) -> bool {
        self.json && !self.quiet
    }

    fn resolver_options(&self) -> ResolverOptions {
        let defaults = ResolverOptions::default();
        let timeout = Duration::from_secs(self.timeout.max(1));

        ResolverOptions {
            timeout,
            connect_timeout: defaults.connect_timeout.min(timeout),
            limits: FetchLimits {
                max_lines: self.max_lines,
                max_line_chars: self.max_line_length,
            },
        }
    }
}

/// Progress reporter using an indicatif spinner for terminal output
struct SpinnerReporter {
    spinner: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}")
        {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ResolveReporter for SpinnerReporter {
    fn report(&self, event: ResolveEvent) {
        match event {
            ResolveEvent::Probing { address } => {
                self.spinner
                    .set_message(format!("{SEARCH}Probing {}", address.cyan()));
            }

            ResolveEvent::Classified { .. } | ResolveEvent::Resolved { .. } => {}

            ResolveEvent::FetchingPlaylist { url } => {
                self.spinner
                    .set_message(format!("{DOWNLOAD}Downloading playlist {}", url.cyan()));
            }

            ResolveEvent::PlaylistParsed {
                lines, stations, ..
            } => {
                self.spinner.println(format!(
                    "  {} lines read, {} playable",
                    lines.to_string().cyan(),
                    stations.to_string().green()
                ));
            }

            ResolveEvent::DuplicateAddress { address } => {
                self.spinner.println(format!(
                    "{REPEAT}{} {}",
                    "Already resolved:".yellow(),
                    address.dimmed()
                ));
            }

            ResolveEvent::InvalidStation { address } => {
                self.spinner.println(format!(
                    "{FAILURE}{} {}",
                    "Not a valid station:".red().bold(),
                    address
                ));
            }
        }
    }
}

fn print_station(station: &Station) {
    println!(
        "{SUCCESS}{} [{}]",
        station.name.bold().green(),
        station.stream_content_type.to_string().cyan()
    );
    for uri in &station.stream_uris {
        println!("    {}", uri.dimmed());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let show_progress = !args.quiet && !args.json;

    if show_progress {
        println!("\n{}{}\n", RADIO, "stationcheck".bold().magenta());
    }

    let spinner = show_progress.then(|| Arc::new(SpinnerReporter::new()));
    let reporter: SharedResolveReporter = match &spinner {
        Some(spinner) => spinner.clone() as SharedResolveReporter,
        None => NoopReporter::shared(),
    };

    let resolver = StationResolver::from_options(&args.resolver_options())
        .context("Failed to create HTTP client")?
        .with_reporter(reporter);

    let mut stations = Vec::new();
    let mut failures = 0;

    for address in &args.addresses {
        match resolver.resolve(address).await {
            Ok(Resolution::Stations(found)) => stations.extend(found),
            Ok(Resolution::Unsupported { address }) => {
                if args.notices_on_stderr() {
                    eprintln!("{FAILURE}{} {}", "Not a valid station:".red().bold(), address);
                }
            }
            Err(e) => {
                failures += 1;
                if !args.quiet {
                    eprintln!("{FAILURE}{}", e.to_string().red());
                }
            }
        }
    }

    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    if args.json {
        let json =
            serde_json::to_string_pretty(&stations).context("Failed to serialize stations")?;
        println!("{json}");
    } else if !args.quiet {
        stations.iter().for_each(print_station);
        println!(
            "\n{} station(s) found",
            stations.len().to_string().green().bold()
        );
    }

    if failures > 0 && failures == args.addresses.len() {
        std::process::exit(1);
    }

    Ok(())
}
