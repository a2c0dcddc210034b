//! Subcommand implementations.

pub mod apps;
pub mod info;
pub mod markets;
pub mod prices;
