//! # fsmcrypt
//!
//! Experimental substitution cipher built on per-letter finite automata.
//!
//! Every letter of a small plaintext alphabet gets its own randomly
//! generated finite-state machine. Encrypting a text replaces each letter
//! with a random word accepted by that letter's machine; the fragments are
//! concatenated, followed by one extra fragment encoding the plaintext's
//! length parity. Decryption backtracks through the ciphertext, testing
//! trailing fragments against every machine that could have produced them,
//! pruned by a per-machine bracket-balance predicate and the parity check.
//!
//! This is a puzzle, not vetted cryptography.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fsmcrypt::prelude::*;
//!
//! let config = CipherConfig {
//!     seed: Some(42),
//!     ..CipherConfig::default()
//! };
//! let machines = Generator::from_config(&config).generate(
//!     &config.source_alphabet,
//!     &config.cipher_alphabet,
//!     config.num_states,
//! )?;
//!
//! let mut engine = CipherEngine::new(machines, &config)?;
//! let ciphertext = engine.encrypt("fade bead")?;
//! assert_eq!(engine.decrypt(&ciphertext)?, "fade bead");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod machine;
pub mod sampler;

#[cfg(feature = "serialization")]
pub mod serialization;

/// CLI interface and utilities
#[cfg(feature = "cli")]
pub mod cli;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::config::{ensure_in_alphabet, CipherConfig, ConfigError};
    pub use crate::engine::{CipherEngine, CipherError, WordStore};
    pub use crate::machine::{
        AcceptingCell, Balancing, GenerateError, Generator, Machine, MachineSet, StateId,
        Transition,
    };
    pub use crate::sampler::{SampleError, WordSampler};

    #[cfg(feature = "serialization")]
    pub use crate::serialization::{
        render_html, BincodeKeySerializer, JsonKeySerializer, KeyMaterial, KeySerializer,
        SerializationError,
    };
}
