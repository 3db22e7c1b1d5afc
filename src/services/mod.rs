pub mod error;
pub mod identity;
pub mod insight;
pub mod traits;

pub use error::*;
pub use identity::InMemoryIdentity;
pub use insight::{InsightResponse, InsightRetryPolicy, InsightService, SuggestedChange};
pub use traits::*;
