pub mod error;
pub mod news;
pub mod normalize;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::*;
pub use news::NewsNormalizer;
pub use traits::*;
pub use types::*;
