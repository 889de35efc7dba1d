pub mod finance;
pub mod kit;
pub mod types;

pub use finance::*;
pub use kit::*;
pub use types::*;
