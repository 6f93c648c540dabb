pub mod dates;
pub mod error;
pub mod formatting;
pub mod mapping;
pub mod models;
pub mod settings;
pub mod stats;
