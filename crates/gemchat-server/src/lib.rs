pub mod config_cmd;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{create_router, run_server, ServerSettings};
pub use state::AppState;
