pub mod frame_codec;
pub mod period_buffer;
pub mod sample_format;
