mod cli;
pub mod runner;
