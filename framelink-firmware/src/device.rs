//! Device configuration generated from device.toml
//!
//! The build script validates device.toml and emits the constants below.

include!(concat!(env!("OUT_DIR"), "/device.rs"));
