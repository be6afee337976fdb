//! Auth-domain identifiers, scope helpers, tokens, and identity records.

pub mod id;
pub mod scope;
pub mod token;
pub mod user;

pub use id::*;
pub use scope::*;
pub use token::{record::*, secret::*};
pub use user::*;
