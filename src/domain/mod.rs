mod sort;
mod types;

pub use sort::*;
pub use types::*;
