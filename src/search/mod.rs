pub mod context;
pub mod opensearch_client;
pub mod search_interface;

pub use context::*;
pub use opensearch_client::*;
pub use search_interface::*;
