pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod images;
pub mod openai;
pub mod state;
