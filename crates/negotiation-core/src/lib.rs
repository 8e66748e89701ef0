pub mod cache;
pub mod error;
pub mod score;
pub mod traits;
pub mod types;

pub use cache::{fingerprint, TtlCache};
pub use error::*;
pub use traits::*;
pub use types::*;
