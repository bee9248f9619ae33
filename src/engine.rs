//! Encryption and decryption over a generated machine set.
//!
//! Encryption is cheap: pull a pre-sampled word per plaintext letter and
//! concatenate. Decryption does the real work: a depth-first backtracking
//! search over segmentations of the ciphertext, trying progressively longer
//! trailing fragments against the machines that could have produced them,
//! with the balance predicate and a final length-parity check pruning
//! spurious readings. No memoization; worst case is exponential in the
//! ciphertext length.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use thiserror::Error;

use crate::config::CipherConfig;
use crate::machine::{Machine, MachineSet};
use crate::sampler::{SampleError, WordSampler};

/// Errors produced by the cipher engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The plaintext contains a letter no machine ciphers.
    #[error("no machine ciphers letter '{0}'")]
    UnknownLetter(char),
    /// The backtracking search emptied its stack without finding an
    /// accepting segmentation. Expected for garbage or foreign ciphertext.
    #[error("ciphertext admits no accepting segmentation")]
    DecodingExhausted,
    /// Refilling the word store failed.
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Pre-sampled cipher words, one FIFO queue per plaintext letter.
///
/// The engine's only mutable state. Queues drain as letters are encrypted
/// and are refilled in batches; a store snapshot can be persisted alongside
/// the machines so a reloaded engine continues from the same pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordStore {
    queues: FxHashMap<char, VecDeque<String>>,
}

impl WordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from per-letter word lists, front of list first out.
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = (char, Vec<String>)>,
    {
        Self {
            queues: words
                .into_iter()
                .map(|(letter, list)| (letter, list.into()))
                .collect(),
        }
    }

    /// Words currently queued for `letter`.
    pub fn queued(&self, letter: char) -> usize {
        self.queues.get(&letter).map_or(0, VecDeque::len)
    }

    /// Iterate over the per-letter queues, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &VecDeque<String>)> {
        self.queues.iter().map(|(&letter, queue)| (letter, queue))
    }
}

/// Saved decoder branch: ciphertext still unparsed, plaintext decoded so
/// far, and the trailing-fragment length to try next when resumed.
struct Continuation {
    unparsed_len: usize,
    decoded: String,
    next_suffix_len: usize,
}

/// Substitution cipher over a set of per-letter machines.
pub struct CipherEngine {
    machines: MachineSet,
    sampler: WordSampler,
    store: WordStore,
    min_word_len: usize,
    words_per_cycle: usize,
}

impl CipherEngine {
    /// Create an engine and pre-sample a full batch of words per letter.
    ///
    /// # Errors
    ///
    /// Fails if any letter's machine cannot yield enough accepted balanced
    /// words within the sampling budget.
    pub fn new(machines: MachineSet, config: &CipherConfig) -> Result<Self, CipherError> {
        let mut engine = Self::with_store(machines, WordStore::new(), config);
        for letter in engine.machines.letters().to_vec() {
            engine.refill(letter)?;
        }
        Ok(engine)
    }

    /// Create an engine around an existing word store (e.g. loaded keys).
    ///
    /// Queues are not topped up here; each letter refills lazily when its
    /// queue runs dry.
    pub fn with_store(machines: MachineSet, store: WordStore, config: &CipherConfig) -> Self {
        Self {
            sampler: WordSampler::from_config(config),
            machines,
            store,
            min_word_len: config.min_word_len,
            words_per_cycle: config.words_per_cycle,
        }
    }

    /// The machine set this engine ciphers with.
    pub fn machines(&self) -> &MachineSet {
        &self.machines
    }

    /// The current word pool.
    pub fn word_store(&self) -> &WordStore {
        &self.store
    }

    /// Encrypt `plaintext`, one sampled fragment per letter plus a trailing
    /// parity fragment.
    ///
    /// The parity fragment comes from the first plaintext letter's machine
    /// when the plaintext length is even, else from the second letter's. It
    /// carries no message content; the decoder uses it to reject
    /// segmentations of the wrong length.
    ///
    /// Input is assumed to be over the plaintext alphabet; a foreign letter
    /// yields [`CipherError::UnknownLetter`].
    pub fn encrypt(&mut self, plaintext: &str) -> Result<String, CipherError> {
        let mut ciphertext = String::new();
        let mut length: usize = 0;

        for letter in plaintext.chars() {
            ciphertext.push_str(&self.next_word(letter)?);
            length += 1;
        }

        let marker = if length % 2 == 0 {
            self.machines.even_marker()
        } else {
            self.machines.odd_marker()
        };
        ciphertext.push_str(&self.next_word(marker)?);

        Ok(ciphertext)
    }

    /// Recover the plaintext from `ciphertext`.
    ///
    /// Depth-first search over segmentations, driven by an explicit stack of
    /// [`Continuation`] points. Fragments are matched shortest-first from
    /// the tail of the ciphertext; resuming a branch tries the next longer
    /// fragment. A fully consumed ciphertext is only a solution when the
    /// recovered parity marker agrees with the recovered length — otherwise
    /// the decoder keeps backtracking.
    ///
    /// Touches no mutable state; independent calls may run in parallel.
    ///
    /// # Errors
    ///
    /// [`CipherError::DecodingExhausted`] when no accepting segmentation
    /// exists — the expected outcome for ciphertext this machine set never
    /// produced.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let cipher: Vec<char> = ciphertext.chars().collect();
        let mut unparsed_len = cipher.len();
        let mut decoded = String::new();
        let mut suffix_len = self.min_word_len;
        let mut stack: Vec<Continuation> = Vec::new();

        loop {
            if unparsed_len == 0 && self.parity_consistent(&decoded) {
                decoded.pop();
                return Ok(decoded);
            }
            // A consumed ciphertext with bad parity falls through and
            // backtracks like any other dead branch.

            match self.decipher_suffix(&cipher[..unparsed_len], suffix_len) {
                Some((letter, matched_len)) => {
                    stack.push(Continuation {
                        unparsed_len,
                        decoded: decoded.clone(),
                        next_suffix_len: matched_len + 1,
                    });
                    unparsed_len -= matched_len;
                    decoded.insert(0, letter);
                    suffix_len = self.min_word_len;
                }
                None => match stack.pop() {
                    Some(point) => {
                        unparsed_len = point.unparsed_len;
                        decoded = point.decoded;
                        suffix_len = point.next_suffix_len;
                    }
                    None => return Err(CipherError::DecodingExhausted),
                },
            }
        }
    }

    /// Find the shortest trailing fragment of `unparsed`, no shorter than
    /// `start_len`, that some machine accepts and balances. Only machines
    /// whose accepting-cell symbol matches the last ciphertext character are
    /// in the running.
    fn decipher_suffix(&self, unparsed: &[char], start_len: usize) -> Option<(char, usize)> {
        let &last = unparsed.last()?;
        let candidates: Vec<&Machine> = self.machines.machines_accepting_on(last).collect();
        if candidates.is_empty() {
            return None;
        }

        for len in start_len..=unparsed.len() {
            let word: String = unparsed[unparsed.len() - len..].iter().collect();
            for machine in &candidates {
                if machine.accepts(&word) && machine.balancing().is_balanced(&word) {
                    return Some((machine.letter(), len));
                }
            }
        }

        None
    }

    /// Whether the decoded text ends in a parity marker consistent with its
    /// own length. The marker itself counts toward the length, so an even
    /// plaintext decodes to an odd string ending in the even marker.
    fn parity_consistent(&self, decoded: &str) -> bool {
        let Some(marker) = decoded.chars().last() else {
            return false;
        };
        let len = decoded.chars().count();
        if marker == self.machines.even_marker() {
            len % 2 == 1
        } else {
            len % 2 == 0
        }
    }

    /// Pop the next pre-sampled word for `letter`, refilling its queue
    /// first when it has run dry.
    fn next_word(&mut self, letter: char) -> Result<String, CipherError> {
        if self.store.queued(letter) == 0 {
            self.refill(letter)?;
        }
        match self
            .store
            .queues
            .get_mut(&letter)
            .and_then(VecDeque::pop_front)
        {
            Some(word) => Ok(word),
            // Refill batch configured to zero; fall back to direct sampling.
            None => {
                let machine = self
                    .machines
                    .machine_for(letter)
                    .ok_or(CipherError::UnknownLetter(letter))?;
                Ok(self.sampler.sample_balanced(machine)?)
            }
        }
    }

    /// Sample one refill batch into `letter`'s queue.
    fn refill(&mut self, letter: char) -> Result<(), CipherError> {
        let machine = self
            .machines
            .machine_for(letter)
            .ok_or(CipherError::UnknownLetter(letter))?;
        let words = self.sampler.sample_batch(machine, self.words_per_cycle)?;
        self.store.queues.entry(letter).or_default().extend(words);
        Ok(())
    }
}
