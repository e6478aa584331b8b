//! Command handlers, one per binary.

mod build;
mod fetch;
mod rules;

pub use build::run_build;
pub use fetch::run_fetch;
pub use rules::{render_rules, run_rules};

#[cfg(test)]
pub(crate) use fetch::entries_to_fetch;
