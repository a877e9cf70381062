pub mod deadline;
pub mod frame;
pub mod notify;

pub use deadline::*;
pub use frame::*;
pub use notify::*;
