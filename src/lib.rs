//! Courier library exports for testing

pub mod backend;
pub mod client;
pub mod core;
pub mod repl;

#[cfg(test)]
pub mod test_support;
