//! Cipher configuration.
//!
//! Defaults describe a small working setup: a seven-letter plaintext
//! alphabet (`a`–`f` plus space), the lowercase latin cipher alphabet, four
//! operational states per machine, and fragments of at least three symbols.

use thiserror::Error;

/// Errors from configuration and input validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Plaintext alphabet too small for the parity-marker scheme.
    #[error("plaintext alphabet needs at least two letters, got {0}")]
    SourceAlphabetTooSmall(usize),
    /// Cipher alphabet is empty.
    #[error("cipher alphabet is empty")]
    CipherAlphabetEmpty,
    /// An alphabet repeats a symbol.
    #[error("alphabet repeats symbol '{symbol}'")]
    DuplicateSymbol {
        /// The repeated symbol.
        symbol: char,
    },
    /// Machines need at least one operational state.
    #[error("machine state count must be at least one")]
    NoStates,
    /// Word length bounds are empty or inverted.
    #[error("word length bounds are invalid: min {min}, max {max}")]
    WordLengthBounds {
        /// Configured minimum fragment length.
        min: usize,
        /// Configured maximum fragment length.
        max: usize,
    },
    /// Transition fill chance must be a percentage.
    #[error("transition fill percent {0} is out of range 0..=100")]
    FillPercentOutOfRange(u8),
    /// The word store refill batch cannot be empty.
    #[error("words per refill cycle must be at least one")]
    WordsPerCycleZero,
    /// Input text contains a symbol outside the expected alphabet.
    #[error("symbol '{symbol}' is not in alphabet \"{alphabet}\"")]
    ForeignSymbol {
        /// The offending symbol.
        symbol: char,
        /// The alphabet the text was checked against.
        alphabet: String,
    },
}

/// Tuning knobs for key generation, sampling, and the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherConfig {
    /// Plaintext alphabet; its first two letters double as parity markers.
    pub source_alphabet: String,
    /// Alphabet ciphertext fragments are written in.
    pub cipher_alphabet: String,
    /// Operational states per machine (the accepting sink comes on top).
    pub num_states: usize,
    /// Minimum fragment length per plaintext letter.
    pub min_word_len: usize,
    /// Soft maximum fragment length the sampler steers toward.
    pub max_word_len: usize,
    /// Chance, in percent, that a transition-table cell is live.
    pub fill_percent: u8,
    /// Words sampled per letter whenever its queue runs dry.
    pub words_per_cycle: usize,
    /// Machines tried per letter before generation gives up.
    pub max_build_attempts: usize,
    /// Samples tried per word before the sampler gives up.
    pub max_sample_attempts: usize,
    /// RNG seed; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            source_alphabet: "abcdef ".to_string(),
            cipher_alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            num_states: 4,
            min_word_len: 3,
            max_word_len: 8,
            fill_percent: 50,
            words_per_cycle: 100,
            max_build_attempts: 64,
            max_sample_attempts: 10_000,
            seed: None,
        }
    }
}

impl CipherConfig {
    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let source_len = self.source_alphabet.chars().count();
        if source_len < 2 {
            return Err(ConfigError::SourceAlphabetTooSmall(source_len));
        }
        if self.cipher_alphabet.is_empty() {
            return Err(ConfigError::CipherAlphabetEmpty);
        }
        ensure_distinct(&self.source_alphabet)?;
        ensure_distinct(&self.cipher_alphabet)?;

        if self.num_states == 0 {
            return Err(ConfigError::NoStates);
        }
        if self.min_word_len == 0 || self.min_word_len > self.max_word_len {
            return Err(ConfigError::WordLengthBounds {
                min: self.min_word_len,
                max: self.max_word_len,
            });
        }
        if self.fill_percent > 100 {
            return Err(ConfigError::FillPercentOutOfRange(self.fill_percent));
        }
        if self.words_per_cycle == 0 {
            return Err(ConfigError::WordsPerCycleZero);
        }

        Ok(())
    }
}

/// Validate that every symbol of `text` belongs to `alphabet`.
///
/// The callers of the cipher core are expected to run this on user input;
/// the core itself assumes well-formed text.
pub fn ensure_in_alphabet(text: &str, alphabet: &str) -> Result<(), ConfigError> {
    for symbol in text.chars() {
        if !alphabet.contains(symbol) {
            return Err(ConfigError::ForeignSymbol {
                symbol,
                alphabet: alphabet.to_string(),
            });
        }
    }
    Ok(())
}

fn ensure_distinct(alphabet: &str) -> Result<(), ConfigError> {
    let mut seen = Vec::new();
    for symbol in alphabet.chars() {
        if seen.contains(&symbol) {
            return Err(ConfigError::DuplicateSymbol { symbol });
        }
        seen.push(symbol);
    }
    Ok(())
}
