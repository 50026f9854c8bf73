// Library exports for the PUMA arm simulator

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::SimConfig;
pub use error::SimError;
pub use protocol::{error_line, handle_request, respond_to_line, Request, Response};
pub use server::{handle_client, run, serve, SharedArm, MAX_LINE_LENGTH};
