//! Command implementations for sitredctl.

mod start;
mod stop;

pub use start::execute as start;
pub use stop::execute as stop;
