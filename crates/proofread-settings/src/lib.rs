//! # proofread-settings
//!
//! Configuration for the proofreading service, loaded from three layers
//! (in priority order):
//! 1. **Compiled defaults** — [`ProofreadSettings::default()`]
//! 2. **Config file** — a JSON document deep-merged over the defaults
//! 3. **Environment variables** — `PROOFREAD_*` overrides (highest priority)
//!
//! A missing config source is valid: the defaults leave the ID service
//! disabled.
//!
//! ```json
//! {
//!   "id_service_url": "http://localhost:5555/ids",
//!   "client_url": "127.0.0.1:9001",
//!   "solver_url": "ws://127.0.0.1:9001"
//! }
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_str};
pub use types::*;
