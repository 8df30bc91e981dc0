pub mod logger;
pub mod types;
