pub mod presence;
pub mod health;
pub mod diagnostics;
pub mod error;

pub use presence::*;
pub use health::*;
pub use diagnostics::*;
pub use error::*;
