pub mod env;
pub mod logging;

pub use env::{Environment, StaticEnvironment, SystemEnvironment};
pub use logging::{FileLogger, Logger, MemoryLogger, MultiLogger, StderrLogger};
