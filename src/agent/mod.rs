pub mod agent_client;
pub mod agent_interface;
pub mod error;
pub mod input_types;
pub mod payload;

pub use agent_client::*;
pub use agent_interface::*;
pub use error::*;
pub use input_types::*;
