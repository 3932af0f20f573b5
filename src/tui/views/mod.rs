pub mod help;
pub mod log;
pub mod main;

pub use help::*;
pub use log::*;
pub use main::*;
