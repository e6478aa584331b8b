//! CLI parse tests and command handler error paths.
