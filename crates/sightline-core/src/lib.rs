pub mod cli;
pub mod composer;
pub mod config;
pub mod context;
pub mod dom;
pub mod inspector;
pub mod record;
pub mod roles;
pub mod scoring;
pub mod session;
pub mod synthesis;
pub mod tracker;

pub use sightline_common::formatter;
pub use sightline_common::protocol;
