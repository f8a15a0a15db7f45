//! Process-level helpers shared by the commands.

pub mod logging;
pub mod pid;

pub use logging::initialize_logging;
