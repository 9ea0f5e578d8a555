//! Web layer for the radio station directory.
//!
//! JSON endpoints feed the map; HTML pages cover the station list,
//! favourites and accounts.

mod dto;
mod routes;
mod session;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use session::{SESSION_COOKIE, Session, current_user, safe_redirect};
pub use state::AppState;
pub use templates::*;
