pub mod stats;
pub mod stop_signal;
pub mod streaming;
