pub mod imports;
pub mod names;

pub use names::{NameResolver, Scope};
