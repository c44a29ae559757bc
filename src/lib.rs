pub mod app_state;
pub mod books;
pub mod collection;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod middleware_auth;
pub mod models;
pub mod profile;
pub mod router;
pub mod session;
pub mod store;
pub mod utils;

pub use app_state::AppState;
pub use config::Config;
pub use errors::*;
pub use models::*;
pub use session::{AuthState, Session};
pub use utils::*;
