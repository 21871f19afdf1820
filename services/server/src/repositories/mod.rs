//! Repositories for database operations

pub mod photo;
pub mod session;
pub mod user;

pub use photo::PhotoRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
