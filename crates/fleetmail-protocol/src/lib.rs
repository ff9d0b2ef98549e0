pub mod config;
pub mod events;
pub mod model;
pub mod template;
