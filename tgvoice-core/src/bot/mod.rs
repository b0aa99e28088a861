pub mod commands;
pub mod handler;
pub mod keyboard;
pub mod runner;

pub use handler::BotHandler;
pub use runner::BotRunner;
