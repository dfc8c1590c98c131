//! vpnstat agent: samples the host and pushes one report per tick.

pub mod activity_file;
pub mod config;
pub mod sampler;
pub mod transport;
