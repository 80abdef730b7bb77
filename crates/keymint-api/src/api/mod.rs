// Public API module
//
// Shared DTOs and validation; the route handlers live in auth::routes.

pub mod common;
pub mod validation;

pub use common::{DataResponse, ErrorResponse};
