pub mod results_feed;

pub use results_feed::{FeedResult, ResultsFeedClient};
