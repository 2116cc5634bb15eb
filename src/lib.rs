pub mod board;
pub mod cli;
pub mod db;
pub mod logging;
pub mod settings;
pub mod types;
