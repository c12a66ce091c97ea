pub mod application;
pub mod config;
pub mod http;
pub mod infrastructure;
pub mod use_cases;
