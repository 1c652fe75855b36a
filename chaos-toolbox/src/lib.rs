pub mod logging;
pub mod referenda;
pub mod rewards;
pub mod utils;
