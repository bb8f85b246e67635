//! Process lifecycle: signal handling and graceful shutdown.

pub mod shutdown;

pub use shutdown::Shutdown;
