pub mod health;
pub mod presence;
pub mod catalog;
pub mod diagnostics;

pub use health::*;
pub use presence::*;
pub use catalog::*;
pub use diagnostics::*;
