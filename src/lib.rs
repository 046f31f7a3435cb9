// CyberShield: multilingual cyberbullying detection
//
// This is the library root. Each module corresponds to a part of the
// analyze -> store -> report flow.

pub mod classifier;
pub mod config;
pub mod models;
pub mod output;
pub mod session;
pub mod stats;
pub mod store;
