//! Headless host integration: a JSON-lines command bridge over the stores.

pub mod contract;
pub mod handler;
pub mod stdio;
