pub mod demographics;
pub mod error;
pub mod fetch;
pub mod model;
pub mod scores;
pub mod selection;

pub use demographics::*;
pub use error::*;
pub use fetch::*;
pub use model::*;
pub use scores::*;
pub use selection::*;
