pub mod recording;
pub mod signal;
pub mod surface;

pub use recording::*;
pub use signal::*;
pub use surface::*;
