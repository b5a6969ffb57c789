//! vtmux headless runner
//!
//! Feeds a captured byte stream through the emulator and prints every
//! display operation and event it produces.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vtmux::{Config, Emulator, Event, RecordingScreen, ScreenOp, ScreenSize};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut size = ScreenSize::default();
    let mut input_file: Option<String> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut output_format = OutputFormat::Text;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--cols" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    size.columns = value.parse().unwrap_or(80);
                }
            }
            "-r" | "--rows" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    size.lines = value.parse().unwrap_or(24);
                }
            }
            "--config" => {
                i += 1;
                config_file = args.get(i).map(PathBuf::from);
            }
            "-j" | "--json" => output_format = OutputFormat::Json,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            arg => {
                if input_file.is_none() && !arg.starts_with('-') {
                    input_file = Some(arg.to_string());
                }
            }
        }
        i += 1;
    }

    let config = match &config_file {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let input = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        }
    };

    let mut emulator = Emulator::with_config(config);
    let mut screen = RecordingScreen::new(size);
    emulator.receive(&mut screen, &String::from_utf8_lossy(&input));

    let output = Output {
        ops: screen.take_ops(),
        events: emulator.drain_events(),
    };

    match output_format {
        OutputFormat::Text => {
            println!("Screen {}x{}", size.columns, size.lines);
            println!("--- ops ({})", output.ops.len());
            for op in &output.ops {
                println!("{:?}", op);
            }
            println!("--- events ({})", output.events.len());
            for event in &output.events {
                println!("{:?}", event);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

#[derive(Serialize)]
struct Output {
    ops: Vec<ScreenOp>,
    events: Vec<Event>,
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn print_help() {
    println!("vtmux headless runner");
    println!();
    println!("Usage: vtmux-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>       Set terminal width (default: 80)");
    println!("  -r, --rows <N>       Set terminal height (default: 24)");
    println!("      --config <PATH>  Load a JSON configuration");
    println!("  -j, --json           Print operations and events as JSON");
    println!("  -h, --help           Show this help message");
    println!();
    println!("If no input file is specified, reads from stdin.");
    println!();
    println!("Examples:");
    println!("  printf 'Hello\\033[31mWorld\\033[0m' | vtmux-headless");
    println!("  vtmux-headless -c 132 -r 50 capture.bin");
}
