//! Token deployment toolkit for the Soroban token factory.
//!
//! Everything the deployment form does, as a library: field validation
//! ([`validation`]), logo image validation ([`logo`]), pinning-gateway
//! uploads with progress reporting ([`upload`]), and the deployment call
//! itself ([`deploy`]). The binary in `src/main.rs` is a thin clap front-end
//! over these modules.

pub mod commands;
pub mod config;
pub mod deploy;
pub mod logo;
pub mod upload;
pub mod validation;
pub mod wizard;
