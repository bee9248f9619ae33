//! CLI interface for fsmcrypt
//!
//! Key generation, encryption, decryption, and round-trip checking from
//! the command line. Input text is validated against the configured
//! alphabets here, before the cipher core ever sees it.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::run;
