pub mod bounds;
pub mod color;
pub mod ids;
pub mod states;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use ids::*;
pub use states::*;
pub use time::*;
