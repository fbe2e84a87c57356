// Quiz session core plus the host-shell plumbing around it.

pub mod answer;
pub mod autocomplete;
pub mod backend;
pub mod config;
pub mod console;
pub mod normalize;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod timer;
pub mod types;
