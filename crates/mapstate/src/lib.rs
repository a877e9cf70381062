pub mod choropleth;
pub mod hover;
pub mod lifecycle;
pub mod symbology;
pub mod sync;
pub mod viewport;

pub use choropleth::*;
pub use hover::*;
pub use lifecycle::*;
pub use symbology::*;
pub use sync::*;
pub use viewport::*;
