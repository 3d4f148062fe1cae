//! Domain entities - the core business objects.

mod account;
mod category;
mod generation;
mod post;

pub use account::{Account, DEFAULT_ROLE, MIN_PASSWORD_LEN};
pub use category::Category;
pub use generation::{DEFAULT_MODEL, GenerationRequest};
pub use post::{Generated, Post, PostEdit, Visibility, word_count};

/// Entities addressable by a primary key.
pub trait Identifiable<ID> {
    fn id(&self) -> ID;
}
