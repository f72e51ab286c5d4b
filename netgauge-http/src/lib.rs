#![forbid(unsafe_code)]

mod client;
mod error;
mod types;

pub use client::HttpClient;
pub use error::{Error, Result, TransferErrorKind};
pub use types::Transfer;
