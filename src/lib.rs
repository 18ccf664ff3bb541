pub mod config;
#[cfg(feature = "device")]
pub mod device;
pub mod error;
pub mod fade;
pub mod instrument;
pub mod melody;
pub mod notes;
pub mod output;
pub mod rhythm;
pub mod session;
pub mod signal;
pub mod transition;
pub mod trigger;

pub use config::*;
pub use error::*;
pub use fade::*;
pub use instrument::*;
pub use melody::*;
pub use notes::*;
pub use output::*;
pub use rhythm::*;
pub use session::*;
pub use signal::*;
pub use transition::*;
pub use trigger::*;
