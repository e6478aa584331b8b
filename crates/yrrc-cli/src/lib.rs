//! Command-line front ends for the yrrc tools: `yrrc`, `yrrc-build` and `yrrc-fetch`.

pub mod cli;
