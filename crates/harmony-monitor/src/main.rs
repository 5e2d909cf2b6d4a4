//! Harmony Monitor - prints the pitch classes heard on the microphone
//!
//! Turns a capture session on, polls it at the configured tick rate and logs
//! every change of the candidate selection, the active notes, the melody
//! and the level. The session is turned off again after `--seconds`.
//!
//! ## Command line flags
//!
//! - `--seconds N`: run for N seconds (default 10)
//! - `--config PATH`: load settings from PATH instead of the default location
//! - `--list-devices`: print available input devices and exit
//! - `--write-default-config`: write the default settings to the config path and exit

mod config;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use config::MonitorConfig;
use harmony_core::audio::{get_input_devices, CpalCaptureBackend};
use harmony_core::config::{default_config_path, load_config, save_config, try_load_config};
use harmony_core::types::{pitch_classes, PitchMask};
use harmony_core::{Session, SessionState};

const DEFAULT_SECONDS: u64 = 10;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, PartialEq)]
struct Args {
    seconds: u64,
    config_path: Option<PathBuf>,
    list_devices: bool,
    write_default_config: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        seconds: DEFAULT_SECONDS,
        config_path: None,
        list_devices: false,
        write_default_config: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => {
                let value = args.next().context("--seconds needs a value")?;
                parsed.seconds = value
                    .parse()
                    .with_context(|| format!("Invalid --seconds value: {}", value))?;
            }
            "--config" => {
                let value = args.next().context("--config needs a path")?;
                parsed.config_path = Some(PathBuf::from(value));
            }
            "--list-devices" => parsed.list_devices = true,
            "--write-default-config" => parsed.write_default_config = true,
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

/// "C E G" style listing of a mask, "-" when empty
fn note_names(mask: PitchMask) -> String {
    let names: Vec<&str> = pitch_classes(mask).map(|pc| NOTE_NAMES[pc.index()]).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(" ")
    }
}

/// Nearest note name and octave of a melody semitone (semitone 0 = C0)
fn melody_name(semitone: f32) -> Option<String> {
    if !semitone.is_finite() {
        return None;
    }
    let rounded = semitone.round() as i32;
    let name = NOTE_NAMES[rounded.rem_euclid(12) as usize];
    Some(format!("{}{}", name, rounded.div_euclid(12)))
}

fn list_devices() -> Result<()> {
    for device in get_input_devices()? {
        println!(
            "{}  ({} ch, {:?} Hz{})",
            device.label(),
            device.max_channels,
            device.sample_rates,
            if device.supports_f32 { "" } else { ", no f32" }
        );
    }
    Ok(())
}

fn run(config: MonitorConfig, seconds: u64) -> Result<()> {
    let tick = config.display.tick_interval();
    let stats_every = Duration::from_secs(config.display.stats_interval_secs.into());

    let mut session = Session::new(CpalCaptureBackend::new(), config.session);
    if session.toggle() != SessionState::Running {
        match session.last_error() {
            Some(e) => bail!("Could not start session: {}", e),
            None => bail!("Could not start session ({})", session.state()),
        }
    }

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_stats = Instant::now();
    let mut selection: PitchMask = 0;
    let mut highlight: PitchMask = 0;
    let mut melody: Option<String> = None;

    while Instant::now() < deadline && session.state().is_running() {
        if session.tick().is_some() {
            let consumer = session.consumer();

            if consumer.candidate_delta().has_changes() {
                selection = consumer.merge_candidates(selection);
                log::info!("Candidates: {}", note_names(selection));
            }
            if consumer.stimulus_delta().has_changes() {
                highlight = consumer.merge_stimuli(highlight);
                log::info!("Active:     {}", note_names(highlight));
            }

            let current = melody_name(consumer.mean_semitone());
            if current != melody {
                log::info!(
                    "Melody:     {} (rms {:.3})",
                    current.as_deref().unwrap_or("-"),
                    consumer.rms()
                );
                melody = current;
            }
        }

        if !stats_every.is_zero() && last_stats.elapsed() >= stats_every {
            let atomics = session.atomics();
            log::debug!(
                "Frames: {} produced, {} dropped",
                atomics.frames_produced(),
                atomics.frames_dropped()
            );
            last_stats = Instant::now();
        }

        std::thread::sleep(tick);
    }

    if session.state() == SessionState::Failed {
        if let Some(e) = session.last_error() {
            bail!("Session failed: {}", e);
        }
    }

    session.toggle();
    println!("Final selection: {}", note_names(selection));
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    if args.list_devices {
        return list_devices();
    }

    if args.write_default_config {
        let path = args.config_path.unwrap_or_else(default_config_path);
        save_config(&MonitorConfig::default(), &path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // An explicitly named file must load; the default location may be absent or broken
    let config: MonitorConfig = match &args.config_path {
        Some(path) => try_load_config(path)?,
        None => load_config(&default_config_path()),
    };
    log::info!(
        "harmony-monitor: listening for {}s at {} ticks/s",
        args.seconds,
        config.display.tick_hz
    );
    run(config, args.seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.seconds, DEFAULT_SECONDS);
        assert!(parsed.config_path.is_none());
        assert!(!parsed.list_devices);
    }

    #[test]
    fn test_parse_all_flags() {
        let parsed = args(&["--seconds", "3", "--config", "/tmp/h.yaml", "--list-devices"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                seconds: 3,
                config_path: Some(PathBuf::from("/tmp/h.yaml")),
                list_devices: true,
                write_default_config: false,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&["--seconds"]).is_err());
        assert!(args(&["--seconds", "ten"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_names(0), "-");
        assert_eq!(note_names(0b0000_1001_0001), "C E G");
        assert_eq!(note_names(1 << 10), "A#");
    }

    #[test]
    fn test_melody_name() {
        assert_eq!(melody_name(f32::NAN), None);
        assert_eq!(melody_name(0.2).as_deref(), Some("C0"));
        assert_eq!(melody_name(31.02).as_deref(), Some("G2"));
        // 440Hz against the default C2 reference
        assert_eq!(melody_name(57.0).as_deref(), Some("A4"));
    }
}
