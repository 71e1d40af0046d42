pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod output;
pub mod types;

pub use client::WsClient;
pub use config::{Config, Settings};
pub use error::Error;
pub use identity::{IdentityConfig, IdentityManager, Token};
pub use types::{Device, Location, Room};
