pub mod config;
pub mod logging;

// Build side: working copy sync and the bootstrap/configure/make driver.
pub mod build;
pub mod process;
pub mod repo;

// Fetch side: hashes file, sample cache, API key, concurrent downloader.
pub mod cache;
pub mod credential;
pub mod fetcher;
pub mod hashes;

// Rules side: collect expected hashes from rule metadata, scan cached samples.
pub mod rules;
