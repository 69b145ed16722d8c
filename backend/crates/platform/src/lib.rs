//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, constant-time comparison)
//! - Bounded retry policies for RPC-facing loops

pub mod crypto;
pub mod retry;
