pub mod silent;

pub use silent::SilentCapture;
