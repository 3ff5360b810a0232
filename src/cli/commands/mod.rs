pub mod check;
mod command_result;
mod context;
pub mod init;
pub mod merge;

pub use command_result::*;
