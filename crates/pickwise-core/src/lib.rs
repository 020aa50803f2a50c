// Library root: the draft session engine plus the configuration and catalog
// loaders that feed it.

pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod recommend;
