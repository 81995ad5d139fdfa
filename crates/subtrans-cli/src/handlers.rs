//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod translate_subtree;

pub use completions::handle_completions;
pub use translate_subtree::handle_translate_subtree;
