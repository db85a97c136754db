pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;
pub mod standalone;

#[cfg(test)]
pub mod test_helpers;
