//! Bookshelf HTTP API
//!
//! Thin axum layer over `bookshelf-core`: list books by status, add a book
//! by ISBN or title, move a book to another status, delete a book.

pub mod cors;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
