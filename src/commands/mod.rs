pub mod book;
pub mod export;
pub mod log;

// Re-export all commands
pub use book::*;
pub use export::*;
pub use log::*;
