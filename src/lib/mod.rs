#[macro_use]
extern crate lazy_static;
extern crate tracing;

pub mod bridge;
pub mod cli;
pub mod logger;
pub mod sensors;
pub mod server;
