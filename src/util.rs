mod shutdown_signal;
mod track;

pub use shutdown_signal::shutdown_signal;
pub use track::track;
