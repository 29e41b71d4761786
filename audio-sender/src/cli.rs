//! Command-line arguments.

use clap::{Parser, ValueEnum};

use audio_stream_core::{CaptureConfig, Protocol, SessionConfig};
use audio_stream_platform::Backend;

#[derive(Debug, Parser)]
#[command(name = "audio-sender")]
#[command(version)]
#[command(about = "Stream microphone audio to a TCP or UDP listener", long_about = None)]
pub struct Cli {
    /// Server host name or address
    #[arg(short, long, default_value = "localhost")]
    pub server: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Wire protocol
    #[arg(long, value_enum, default_value_t = ProtocolArg::Tcp)]
    pub protocol: ProtocolArg,

    /// Input device name, or part of it (use --list-devices to see available)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 16000)]
    pub sample_rate: u32,

    /// Number of audio channels
    #[arg(short, long, default_value_t = 1)]
    pub channels: u16,

    /// Frames per transmitted buffer
    #[arg(short, long, default_value_t = 4096)]
    pub buffer_size: u32,

    /// List available audio input devices and exit
    #[arg(short, long)]
    pub list_devices: bool,

    /// Print the device listing and the session summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Capture backend (defaults to the preferred one for this host)
    #[arg(long)]
    pub backend: Option<Backend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Tcp,
    Udp,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Tcp => Protocol::Tcp,
            ProtocolArg::Udp => Protocol::Udp,
        }
    }
}

impl Cli {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::detect)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            host: self.server.clone(),
            port: self.port,
            protocol: self.protocol.into(),
            capture: CaptureConfig {
                device_name: self.device.clone(),
                sample_rate: self.sample_rate,
                channel_count: self.channels,
                buffer_size: self.buffer_size,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("audio-sender").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(!cli.list_devices);
        assert!(!cli.json);
        assert_eq!(cli.backend(), Backend::detect());
        assert_eq!(cli.session_config(), SessionConfig::default());
    }

    #[test]
    fn short_flags() {
        let cli = parse(&[
            "-s", "192.168.1.20", "-p", "9000", "-d", "USB", "-r", "48000", "-c", "2", "-b", "480",
        ]);
        let config = cli.session_config();

        assert_eq!(config.host, "192.168.1.20");
        assert_eq!(config.port, 9000);
        assert_eq!(config.capture.device_name.as_deref(), Some("USB"));
        assert_eq!(config.capture.sample_rate, 48000);
        assert_eq!(config.capture.channel_count, 2);
        assert_eq!(config.capture.buffer_size, 480);
    }

    #[test]
    fn protocol_flag() {
        let cli = parse(&["--protocol", "udp"]);
        assert_eq!(cli.session_config().protocol, Protocol::Udp);

        let bad = Cli::try_parse_from(["audio-sender", "--protocol", "sctp"]);
        assert!(bad.is_err());
    }

    #[test]
    fn list_devices_with_json() {
        let cli = parse(&["-l", "--json"]);
        assert!(cli.list_devices);
        assert!(cli.json);
    }

    #[test]
    fn backend_by_name() {
        let cli = parse(&["--backend", "silent"]);
        assert_eq!(cli.backend(), Backend::Silent);

        assert!(Cli::try_parse_from(["audio-sender", "--backend", "jack"]).is_err());
    }

    #[test]
    fn huge_buffer_parses_but_fails_validation() {
        let cli = parse(&["-b", "4294967295", "-c", "65535"]);
        assert!(matches!(
            cli.session_config().validate(),
            Err(audio_stream_core::StreamError::Configuration(_))
        ));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Cli::try_parse_from(["audio-sender", "-p", "70000"]).is_err());
    }
}
