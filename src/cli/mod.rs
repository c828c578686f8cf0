mod extract;
mod root;
mod run;

pub use root::Cli;
