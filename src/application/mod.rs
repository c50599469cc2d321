//! Application layer - Ports and the services that implement world use cases

pub mod ports;
pub mod services;
