pub mod config_text;
pub mod dashboard;
pub mod display;
pub mod logging;
pub mod records;
pub mod render;
pub mod series;
pub mod server;
pub mod settings;
pub mod source;
