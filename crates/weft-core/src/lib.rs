pub mod config;
pub mod error;
pub mod logging;
pub mod value;

pub use error::{WeftError, WeftResult};
