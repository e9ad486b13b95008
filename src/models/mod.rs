pub mod messages;
pub mod utils;

pub use messages::*;
pub use utils::*;
