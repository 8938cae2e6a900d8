pub mod health;
pub mod presence_publish;
pub mod presence_subscribe;
pub mod diagnostics;

pub use health::*;
pub use presence_publish::*;
pub use presence_subscribe::*;
pub use diagnostics::*;
