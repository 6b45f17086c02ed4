mod query;
mod types;

pub use query::search_items;
pub use types::*;
