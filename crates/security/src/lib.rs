//! Security module for AgentForge: secret encryption and leakage scanning.
//!
//! Provider API keys are write-only: stored encrypted at rest, decrypted
//! only at the moment a provider or auth header needs them, and never
//! serialized, logged, or echoed in error payloads.

pub mod secrets;

pub use secrets::{KeyVault, SecretError};
