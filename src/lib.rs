pub mod config;
pub mod cursor;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{AppError, AppResult};
pub use state::AppState;
