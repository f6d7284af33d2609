pub mod health;
pub mod error;
pub mod diagnostics;
pub mod presence;
pub mod messages;
pub mod item;

pub use health::*;
pub use error::*;
pub use diagnostics::*;
pub use presence::*;
pub use messages::*;
pub use item::*;
