pub mod audio_capture;
pub mod transport;
