mod search;

pub use search::{SocialSearchConfig, SocialSearchSource};
