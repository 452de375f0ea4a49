pub mod config;
pub mod consts;
pub mod error;

pub use error::{Error, FatalKind, RecoverableKind, Result};
