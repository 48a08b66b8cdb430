pub mod runner;

pub use runner::{split_command, CommandRunner, ProcessOutput};
