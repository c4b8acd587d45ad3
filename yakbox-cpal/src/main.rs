//! yakbox - record short voice clips from the default input and reverse them
//!
//! This is the command-line entry point.

mod cli;

use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use yakbox_core::{
    load_recording, save_recording, CaptureSession, DeviceArbiter, RecorderConfig, RecordingResult, SampleBuffer,
    WaveFile,
};
use yakbox_cpal::{CpalCaptureProvider, DeviceEnumerator};

use cli::{Args, Command, RecordArgs};

/// How often `record` reports progress while capturing.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Devices => list_devices(),
        Command::Record(record_args) => record(config, record_args),
        Command::Reverse { input, output } => reverse(&input, &output),
        Command::Info { file } => show_info(&file),
        Command::ScratchToWav {
            scratch,
            output,
            rate,
            seconds,
        } => scratch_to_wav(&config, &scratch, &output, rate, seconds),
    }
}

fn load_config(path: Option<&Path>) -> Result<RecorderConfig> {
    let Some(path) = path else {
        return Ok(RecorderConfig::default());
    };
    let json = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
    let config: RecorderConfig =
        serde_json::from_str(&json).with_context(|| format!("failed to parse config {}", path.display()))?;
    if let Err(reason) = config.validate() {
        bail!("invalid config {}: {}", path.display(), reason);
    }
    Ok(config)
}

fn list_devices() -> Result<()> {
    let devices = DeviceEnumerator::new().list_input_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {}", marker, device.name);
    }
    Ok(())
}

fn record(mut config: RecorderConfig, args: RecordArgs) -> Result<()> {
    if let Some(seconds) = args.seconds {
        config.max_record_seconds = seconds;
    }
    let max_seconds = config.max_record_seconds;

    let provider = match args.device {
        Some(name) => CpalCaptureProvider::with_device(name),
        None => CpalCaptureProvider::default_device(),
    };
    let arbiter = Arc::new(DeviceArbiter::with_config(provider, config)?);
    let mut session =
        CaptureSession::new(Arc::clone(&arbiter), max_seconds).context("failed to acquire input device")?;

    println!(
        "Recording from {} at {} Hz for up to {}s. Press Enter to stop.",
        arbiter.input_source().name,
        session.sample_rate(),
        max_seconds
    );

    let completion = session.start()?;
    let stop = session.stop_handle();
    // Left detached; a closed stdin must not end the recording early.
    thread::spawn(move || {
        let mut line = String::new();
        if matches!(std::io::stdin().lock().read_line(&mut line), Ok(n) if n > 0) {
            stop.stop();
        }
    });

    let outcome = loop {
        if let Some(outcome) = completion.wait_timeout(PROGRESS_INTERVAL)? {
            break outcome;
        }
        let captured = session.samples_captured();
        info!(
            "Recording... {:.1}s / {}s",
            captured as f64 / session.sample_rate() as f64,
            max_seconds
        );
    };
    session.join();
    if outcome.reason.is_error() {
        log::warn!("Capture ended early: {:?}", outcome.reason);
    }

    let sample_rate = session.sample_rate();
    let mut clip = SampleBuffer::new(session.capacity());
    session.read(&mut clip);
    session.release();

    if args.reverse {
        clip.reverse();
    }
    if let Some(ref scratch) = args.scratch {
        clip.save_to_file(scratch)
            .with_context(|| format!("failed to write scratch file {}", scratch.display()))?;
        info!("Wrote scratch file {}", scratch.display());
    }

    let result = save_recording(&WaveFile::from_buffer(&clip, sample_rate), &args.out, args.reverse)?;
    print_saved(&result);
    Ok(())
}

fn reverse(input: &Path, output: &Path) -> Result<()> {
    let (wave, metadata) = load_recording(input).with_context(|| format!("failed to load {}", input.display()))?;

    let mut clip = SampleBuffer::new(wave.num_frames());
    wave.copy_into(&mut clip);
    clip.reverse();

    let reversed = !metadata.map(|m| m.reversed).unwrap_or(false);
    let result = save_recording(&WaveFile::from_buffer(&clip, wave.sample_rate()), output, reversed)?;
    print_saved(&result);
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let (wave, metadata) = load_recording(file).with_context(|| format!("failed to load {}", file.display()))?;

    println!("File:        {}", file.display());
    println!("Format:      {} Hz, {}-bit, {} channel(s)", wave.sample_rate(), wave.bit_depth(), wave.channels());
    println!("Frames:      {}", wave.num_frames());
    println!("Duration:    {:.2}s", wave.duration_secs());

    match metadata {
        Some(meta) => {
            println!("Id:          {}", meta.id);
            println!("Created:     {}", meta.created_at);
            println!("Reversed:    {}", meta.reversed);
            println!("Checksum:    {} (verified)", meta.checksum);
        }
        None => println!("Metadata:    none"),
    }
    Ok(())
}

fn scratch_to_wav(config: &RecorderConfig, scratch: &Path, output: &Path, rate: u32, seconds: Option<u32>) -> Result<()> {
    if rate == 0 {
        bail!("sample rate must be positive");
    }
    let seconds = seconds.unwrap_or(config.max_record_seconds);
    let mut clip = SampleBuffer::new(rate as usize * seconds as usize);
    clip.load_from_file(scratch)
        .with_context(|| format!("failed to read scratch file {}", scratch.display()))?;

    let result = save_recording(&WaveFile::from_buffer(&clip, rate), output, false)?;
    print_saved(&result);
    Ok(())
}

fn print_saved(result: &RecordingResult) {
    println!(
        "Saved {} ({} frames, {:.2}s)",
        result.file_path.display(),
        result.metadata.num_frames,
        result.metadata.duration_secs
    );
}
