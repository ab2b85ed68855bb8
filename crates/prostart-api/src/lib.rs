pub mod auth;
pub mod conversations;
pub mod error;
pub mod handoff;
pub mod mentors;
pub mod messenger;
pub mod middleware;
pub mod profile;
pub mod tasks;

mod ids;

pub use error::{ApiError, ApiResult};
