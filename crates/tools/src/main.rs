use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tools::{SimulateOptions, inspect, load_map, simulate};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and exercise dot-map asset directories")]
struct Args {
    /// Scene config overriding the one named by the manifest
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print hotspot bindings, connectors and the content hash of an asset directory
    Inspect {
        /// Directory holding manifest.json (or the conventional file layout)
        dir: PathBuf,
    },

    /// Hover one hotspot headlessly, release it, and report how the field settled
    Simulate {
        dir: PathBuf,

        /// Hotspot id to hover; defaults to the first bound hotspot
        #[arg(long)]
        hotspot: Option<String>,

        /// Frames to hold the cursor on the hotspot
        #[arg(long, default_value_t = 60)]
        frames: u32,

        /// Give up waiting for the field to settle after this many frames
        #[arg(long, default_value_t = 1000)]
        max_settle_frames: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = args.config.as_deref();

    match args.command {
        Command::Inspect { dir } => {
            let map = load_map(&dir, config).map_err(|e| e.to_string())?;
            let report = inspect(&map).map_err(|e| e.to_string())?;
            print_json(&report)
        }
        Command::Simulate {
            dir,
            hotspot,
            frames,
            max_settle_frames,
        } => {
            let map = load_map(&dir, config).map_err(|e| e.to_string())?;
            let hotspot = match hotspot {
                Some(id) => id,
                None => map
                    .scene()
                    .hotspots()
                    .first()
                    .map(|h| h.id.clone())
                    .ok_or_else(|| "map has no bound hotspots".to_string())?,
            };
            let options = SimulateOptions {
                hotspot,
                hover_frames: frames,
                max_settle_frames,
            };
            let report = simulate(map.scene(), &map.config, &options).map_err(|e| e.to_string())?;
            print_json(&report)?;
            if report.settle_frames.is_none() {
                return Err(format!(
                    "field did not settle within {max_settle_frames} frames"
                ));
            }
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}
