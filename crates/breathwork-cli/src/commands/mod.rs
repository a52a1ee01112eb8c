pub mod config;
pub mod pattern;
pub mod run;
pub mod stage;
