//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parsed command line.
#[derive(Parser)]
#[command(name = "fsmcrypt")]
#[command(about = "Substitution cipher over per-letter random finite automata")]
#[command(version)]
pub struct Cli {
    /// Key material file
    #[arg(short, long, global = true, default_value = "keys.json")]
    pub keys: PathBuf,

    /// Seed for reproducible key generation and sampling
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Chatty progress output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Cipher operations exposed on the command line.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fresh machine set and persist it as JSON
    NewKeys {
        /// Also write an HTML rendering of the machines next to the keys
        #[arg(long)]
        html: bool,
    },

    /// Encrypt plaintext with the persisted keys
    Encrypt {
        /// Text over the plaintext alphabet
        text: String,
    },

    /// Decrypt ciphertext with the persisted keys
    Decrypt {
        /// Text over the cipher alphabet
        text: String,
    },

    /// Encrypt, decrypt back, and compare
    RoundTrip {
        /// Text over the plaintext alphabet
        text: String,
    },
}
