// Library exports for the Blueprint CLI
// This allows testing of internal modules

pub mod commands;
pub mod context;
pub mod output;
pub mod set_parser;
