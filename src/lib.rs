pub mod config;
pub mod error;
pub mod filter;
pub mod http_client;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod source;
pub mod stats;
pub mod store;

pub use error::{IngestError, Result};
