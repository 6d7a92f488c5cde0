// ABOUTME: Velobridge CLI: watch a drop directory, convert one file, upload, setup, inspect
// ABOUTME: Thin clap front end over the library; all conversion logic lives in the lib
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
//!
//! Usage:
//! ```bash
//! # Watch the configured directory and convert everything that arrives
//! velobridge watch
//!
//! # Watch an explicit directory without uploading
//! velobridge watch --dir /veloMonitor --no-upload
//!
//! # Convert a single file
//! velobridge convert ride.pwx --out-dir ./converted
//!
//! # Upload a finished artifact
//! velobridge upload converted/2025-12-03_05-48-22.fit
//!
//! # One-time Strava credential bootstrap
//! velobridge setup
//!
//! # Sanity-check a FIT artifact
//! velobridge inspect converted/2025-12-03_05-48-22.fit
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use velobridge::config::{strava_credentials_from_env, Config};
use velobridge::convert::{convert_file, ConvertOptions};
use velobridge::models::{RideMode, RideSummary};
use velobridge::upload::strava::{authorization_url, exchange_authorization_code};
use velobridge::upload::{
    wait_for_activity, StravaUploader, UploadOutcome, UploadSink, UploadStatus,
};
use velobridge::{fit, monitor};

#[derive(Parser)]
#[command(
    name = "velobridge",
    about = "PWX to FIT/TCX converter with Strava upload",
    long_about = "Watches a drop directory for Velotron PWX workout exports, converts them to FIT and TCX, and optionally uploads the result to Strava."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Watch the drop directory and convert files as they arrive
    Watch {
        /// Base directory (overrides MONITOR_PATH and the default mounts)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Poll interval in seconds (overrides POLL_INTERVAL)
        #[arg(long)]
        interval: Option<u64>,

        /// Label TCX output as a virtual ride
        #[arg(long)]
        virtual_ride: bool,

        /// Skip the FIT artifact
        #[arg(long)]
        no_fit: bool,

        /// Skip the TCX artifact
        #[arg(long)]
        no_tcx: bool,

        /// Convert only, never upload
        #[arg(long)]
        no_upload: bool,
    },

    /// Convert a single PWX file
    Convert {
        /// Source PWX document
        input: PathBuf,

        /// Output directory (defaults to the source's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Label TCX output as a virtual ride
        #[arg(long)]
        virtual_ride: bool,

        /// Skip the FIT artifact
        #[arg(long)]
        no_fit: bool,

        /// Skip the TCX artifact
        #[arg(long)]
        no_tcx: bool,
    },

    /// Upload a finished FIT or TCX artifact to Strava
    Upload {
        /// Artifact to upload
        file: PathBuf,
    },

    /// One-time Strava OAuth bootstrap: prints the refresh token to configure
    Setup,

    /// Print a structural overview of a FIT file
    Inspect {
        /// FIT file to inspect
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Watch {
            dir,
            interval,
            virtual_ride,
            no_fit,
            no_tcx,
            no_upload,
        } => {
            let mut config = Config::from_env(dir);
            if let Some(seconds) = interval {
                config.poll_interval = Duration::from_secs(seconds.max(1));
            }
            config.options = build_options(virtual_ride, no_fit, no_tcx)?;
            let sink: Option<Box<dyn UploadSink + Send>> = if no_upload {
                None
            } else {
                config
                    .strava
                    .clone()
                    .map(|creds| Box::new(StravaUploader::new(creds)) as Box<dyn UploadSink + Send>)
            };
            monitor::run(&config, sink).await?;
        }

        Command::Convert {
            input,
            out_dir,
            virtual_ride,
            no_fit,
            no_tcx,
        } => {
            let options = build_options(virtual_ride, no_fit, no_tcx)?;
            let out_dir = out_dir
                .or_else(|| input.parent().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            let output = convert_file(&input, &out_dir, &options)?;
            for path in [output.fit_path.as_ref(), output.tcx_path.as_ref()]
                .into_iter()
                .flatten()
            {
                println!("wrote {}", path.display());
            }
            print_summary(&output.summary);
        }

        Command::Upload { file } => {
            let credentials = strava_credentials_from_env()
                .context("strava credentials not fully configured in the environment")?;
            let extension = file
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase();
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("artifact has no usable file name")?
                .to_string();
            let bytes = std::fs::read(&file)
                .with_context(|| format!("could not read {}", file.display()))?;

            let mut uploader = StravaUploader::new(credentials);
            match uploader.upload(&file_name, &extension, &bytes).await? {
                UploadOutcome::Duplicate => println!("already on Strava (duplicate), nothing to do"),
                UploadOutcome::Accepted(handle) => {
                    println!("upload accepted (id {}), waiting for processing...", handle.0);
                    match wait_for_activity(&mut uploader, handle, 10, Duration::from_secs(2))
                        .await?
                    {
                        UploadStatus::Ready { activity_id } => {
                            println!("done: https://www.strava.com/activities/{activity_id}");
                        }
                        UploadStatus::Pending => {
                            println!("still processing; check Strava in a minute");
                        }
                        UploadStatus::Failed { message } => bail!("strava rejected it: {message}"),
                    }
                }
            }
        }

        Command::Setup => run_setup().await?,

        Command::Inspect { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            let overview = fit::inspect(&bytes)?;
            println!("--- {} ---", file.display());
            println!(
                "protocol {}.{}, profile {}",
                overview.protocol_version >> 4,
                overview.protocol_version & 0x0F,
                overview.profile_version
            );
            println!("data size {} bytes", overview.data_size);
            println!("crc {}", if overview.crc_ok { "ok" } else { "MISMATCH" });
            for (global, count) in &overview.message_counts {
                println!("  {:>4} x {}", count, fit::mesg_name(*global));
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "velobridge=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_options(virtual_ride: bool, no_fit: bool, no_tcx: bool) -> Result<ConvertOptions> {
    if no_fit && no_tcx {
        bail!("nothing to do with both --no-fit and --no-tcx");
    }
    Ok(ConvertOptions {
        fit: !no_fit,
        tcx: !no_tcx,
        mode: if virtual_ride {
            RideMode::VirtualRide
        } else {
            RideMode::Ride
        },
    })
}

fn print_summary(summary: &RideSummary) {
    let miles = summary.total_distance_m * 0.000_621_371;
    let feet = summary.total_ascent_m * 3.280_84;
    let total = summary.total_elapsed_s.round() as i64;
    println!("--------------------");
    println!("Distance:  {miles:.2} miles");
    println!(
        "Duration:  {}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    );
    println!("Elevation: {feet:.0} feet");
    println!("--------------------");
}

async fn run_setup() -> Result<()> {
    println!("--- Strava API Setup ---");
    println!("You need your Client ID and Secret from https://www.strava.com/settings/api");
    let client_id = prompt("Client ID: ")?;
    let client_secret = prompt("Client Secret: ")?;
    if client_id.is_empty() || client_secret.is_empty() {
        bail!("client id and secret are required");
    }

    let url = authorization_url(&client_id, "http://localhost")?;
    println!("\n1. Open this URL in a browser and authorize the app:\n\n{url}\n");
    println!("2. You will be redirected to http://localhost/?state=&code=AUTHORIZATION_CODE&...");
    let code = prompt("\nPaste the AUTHORIZATION_CODE here: ")?;
    if code.is_empty() {
        bail!("authorization code is required");
    }

    let grant = exchange_authorization_code(&client_id, &client_secret, &code).await?;
    if grant.refresh_token.is_empty() {
        warn!("strava returned no refresh token; check the app's scope settings");
    }
    println!("\n--- Success ---");
    println!("Configure these environment variables (keep them secret):");
    println!("STRAVA_CLIENT_ID={client_id}");
    println!("STRAVA_CLIENT_SECRET={client_secret}");
    println!("STRAVA_REFRESH_TOKEN={}", grant.refresh_token);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
