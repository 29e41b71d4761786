//! audio-sender: capture a microphone and stream it as raw little-endian
//! f32 frames to a TCP or UDP listener until Ctrl+C.

mod cli;

use std::process::ExitCode;

use clap::Parser;

use audio_stream_core::{
    new_transport, AudioCapture, AudioDeviceDescriptor, SessionSummary, StopSignal, StreamError,
    StreamingSession,
};

use cli::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("audio-sender: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StreamError> {
    let backend = cli.backend();
    let capture = backend.create();
    log::debug!("Capture backend: {}", backend);

    if cli.list_devices {
        return print_devices(&capture.list_input_devices(), cli.json);
    }

    let config = cli.session_config();
    config.validate()?;
    log::info!(
        "Audio sender starting: {} over {}, {} Hz, {} ch",
        config.target(),
        config.protocol,
        config.capture.sample_rate,
        config.capture.channel_count
    );

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.trigger()) {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }

    let transport = new_transport(config.protocol);
    let mut session = StreamingSession::new(capture, transport, config).with_stop_signal(stop);

    session.start()?;
    log::info!("Recording started. Press Ctrl+C to stop.");
    session.run_until_stopped();
    let summary = session.shutdown();

    print_summary(&summary, cli.json)
}

fn print_devices(devices: &[AudioDeviceDescriptor], json: bool) -> Result<(), StreamError> {
    if json {
        let out = serde_json::to_string_pretty(devices)
            .map_err(|e| StreamError::Configuration(format!("cannot encode device list: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!("{:-<50}", "");
    for (index, device) in devices.iter().enumerate() {
        println!("{:2}. {}", index + 1, device.name);
        if device.sample_rate > 0 {
            println!(
                "     Sample rate: {} Hz, Channels: {}",
                device.sample_rate, device.channel_count
            );
        }
    }
    println!();
    println!("Select one with --device \"<part of the name>\".");
    Ok(())
}

fn print_summary(summary: &SessionSummary, json: bool) -> Result<(), StreamError> {
    if json {
        let out = serde_json::to_string_pretty(summary)
            .map_err(|e| StreamError::Configuration(format!("cannot encode summary: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    println!(
        "Session {} on '{}' to {} ({}): {} frames sent, {} dropped, {} bytes in {:.1}s",
        summary.session_id,
        summary.device_name,
        summary.target,
        summary.protocol,
        summary.stats.frames_sent,
        summary.stats.frames_dropped,
        summary.stats.bytes_sent,
        summary.duration_secs
    );
    Ok(())
}
