//! Tracklist matching library: parse DJ setlists and match entries against a
//! track catalog. Shared by all binaries.

pub mod catalog;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod parse;
pub mod progress;
pub mod ranking;
pub mod safety;
pub mod scoring;
pub mod segment;
pub mod similarity;
