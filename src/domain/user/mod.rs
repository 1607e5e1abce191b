//! User aggregate
//!
//! Alumni accounts. Only the fields the authentication flows touch are
//! modelled; profile data is owned by the wider backend.

pub mod model;
pub mod repository;

mod dto_create;

pub use dto_create::CreateUserDto;
pub use model::User;
pub use repository::UserRepositoryInterface;
