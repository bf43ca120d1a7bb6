pub mod app;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use app::config::Config;
pub use app::router::{build_router, AppState};
