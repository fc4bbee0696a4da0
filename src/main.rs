// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use keys::audio::{self, AudioOutput, NotePlayer, SampleBank, SamplePlayer, SilentPlayer};
use keys::config::PianoConfig;
use keys::playback::PlaybackSpeed;
use keys::recording::load_file;
use keys::session::Session;
use keys::ui::App;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("KEYS - Terminal Virtual Piano");
    println!();
    println!("Usage: keys [--config <FILE>] [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>         Read settings from a YAML or TOML file");
    println!("  --play <FILE> [SPEED]   Open a recording in prepared mode");
    println!("  --validate <FILE>       Check a recording file and print a summary");
    println!("  --list-audio            List available audio output devices");
    println!("  --test-note <PITCH>     Play one note, e.g. C4 or F#3");
    println!("  --help                  Show this help message");
    println!();
    println!("With no options the piano starts in interactive mode.");
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keys=info"))
}

/// Log to stderr for one-shot commands
fn init_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Log to a file while the terminal UI owns the screen
fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Start the sample player, falling back to silence without a device
fn start_audio(config: &PianoConfig) -> (Arc<dyn NotePlayer>, Option<AudioOutput>) {
    let bank = SampleBank::load_dir(&config.samples_dir);
    if bank.is_empty() {
        warn!(dir = %config.samples_dir.display(), "no samples loaded, notes will be silent");
    }

    match SamplePlayer::start(bank, config.max_voices) {
        Ok((player, output)) => {
            info!(device = output.device_name(), "audio started");
            (Arc::new(player), Some(output))
        }
        Err(e) => {
            warn!(error = %e, "audio unavailable, continuing without sound");
            (Arc::new(SilentPlayer), None)
        }
    }
}

fn run_piano(config: &PianoConfig, recording: Option<&str>) -> Result<()> {
    init_file_logging(&config.log_file)?;

    let runtime = Runtime::new().context("Failed to start runtime")?;
    let (player, _output) = start_audio(config);
    let (session, events) = Session::new(config, player, runtime.handle().clone())?;

    let mut app = App::new(session, events)?;
    if let Some(path) = recording {
        app.open(path);
    }
    app.run()
}

fn validate_file(path: &str) -> bool {
    match load_file(path) {
        Ok(recording) => {
            println!("Name:     {}", recording.name);
            println!("Notes:    {}", recording.len());
            println!("Duration: {:.3}s", recording.total_duration.as_secs_f64());
            true
        }
        Err(e) => {
            println!("Rejected: {}", e);
            false
        }
    }
}

fn list_audio() {
    let devices = audio::list_devices();
    if devices.is_empty() {
        println!("No audio output devices found");
        return;
    }

    let default = audio::output::default_device_name();
    println!("Audio output devices:");
    for (i, name) in devices.iter().enumerate() {
        let marker = if default.as_deref() == Some(name.as_str()) { " (default)" } else { "" };
        println!("  {}: {}{}", i, name, marker);
    }
}

fn play_test_note(config: &PianoConfig, pitch: &str) -> Result<()> {
    let (player, output) = start_audio(config);
    if output.is_none() {
        anyhow::bail!("No audio output available");
    }

    println!("Playing {}...", pitch);
    player.play_named(pitch);
    thread::sleep(Duration::from_millis(1500));
    println!("Test complete!");
    Ok(())
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();

    let config = if args.len() >= 3 && args[1] == "--config" {
        let config = PianoConfig::load(&args[2])?;
        args.drain(1..3);
        config
    } else if args.len() == 2 && args[1] == "--config" {
        eprintln!("Error: --config requires a file");
        std::process::exit(1);
    } else {
        PianoConfig::default()
    };

    if args.len() < 2 {
        return run_piano(&config, None);
    }

    match args[1].as_str() {
        "--play" => {
            if args.len() < 3 {
                eprintln!("Error: --play requires a recording file");
                std::process::exit(1);
            }
            let mut config = config;
            if let Some(speed) = args.get(3) {
                let factor: f64 = speed
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid speed: {}", speed))?;
                config.default_speed = PlaybackSpeed::new(factor).factor();
            }
            run_piano(&config, Some(args[2].as_str()))?;
        }
        "--validate" => {
            if args.len() < 3 {
                eprintln!("Error: --validate requires a recording file");
                std::process::exit(1);
            }
            init_console_logging();
            if !validate_file(&args[2]) {
                std::process::exit(1);
            }
        }
        "--list-audio" => {
            list_audio();
        }
        "--test-note" => {
            if args.len() < 3 {
                eprintln!("Error: --test-note requires a pitch such as C4");
                std::process::exit(1);
            }
            init_console_logging();
            play_test_note(&config, &args[2])?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
