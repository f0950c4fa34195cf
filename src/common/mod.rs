//! Miscellaneous common structs used throughout the library.

mod id;
mod info;
pub mod messages;
mod node;

pub use id::*;
pub use info::*;
pub use messages::*;
pub use node::*;
