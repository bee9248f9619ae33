//! Random construction of letter machines.
//!
//! Generation is a Las Vegas process: throw a random transition table, wire
//! in an accepting sink, and keep the machine only if the sink is actually
//! reachable from the initial state. Every retry loop is bounded, and
//! exhaustion surfaces as a typed error instead of spinning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::balance::Balancing;
use super::{AcceptingCell, Machine, MachineSet, StateId, Transition};
use crate::config::CipherConfig;

/// Errors produced while generating a machine set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The plaintext alphabet cannot spare two parity markers.
    #[error("plaintext alphabet needs at least two letters, got {0}")]
    TooFewLetters(usize),
    /// The cipher alphabet is empty.
    #[error("cipher alphabet is empty")]
    EmptyCipherAlphabet,
    /// A machine needs at least one operational state.
    #[error("machine state count must be at least one")]
    NoStates,
    /// Bounded reachability retries ran out for one letter.
    #[error("no machine with a reachable sink found for '{letter}' after {attempts} attempts")]
    SinkUnreachable {
        /// Letter whose machine could not be built.
        letter: char,
        /// How many full machines were tried and discarded.
        attempts: usize,
    },
    /// Every cipher symbol already carries the maximum number of accepting
    /// cells. Cannot happen while the per-symbol cap formula holds.
    #[error("no cipher symbol left under the accepting-cell cap for '{letter}'")]
    AcceptingSymbolsExhausted {
        /// Letter whose machine could not be built.
        letter: char,
    },
}

/// Builds one random [`Machine`] per plaintext letter.
///
/// Owns its RNG (seedable for reproducible key material) and, per
/// [`generate`](Self::generate) call, the accepting-symbol usage counter —
/// independent generation runs cannot interfere with each other.
pub struct Generator {
    rng: StdRng,
    fill_percent: u8,
    max_build_attempts: usize,
}

impl Generator {
    /// Create a generator with a fixed seed and default tuning.
    pub fn new(seed: u64) -> Self {
        Self::from_config(&CipherConfig {
            seed: Some(seed),
            ..CipherConfig::default()
        })
    }

    /// Create a generator from a configuration.
    ///
    /// Without a configured seed the RNG is seeded from system entropy.
    pub fn from_config(config: &CipherConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            rng: StdRng::seed_from_u64(seed),
            fill_percent: config.fill_percent.min(100),
            max_build_attempts: config.max_build_attempts,
        }
    }

    /// Generate a full machine set: one machine per letter of `letters`.
    ///
    /// Accepting-cell symbols are rationed across the set: each cipher symbol
    /// may serve at most `ceil(letters / cipher alphabet)` machines, which
    /// bounds how many machines the decoder has to test for any trailing
    /// ciphertext symbol.
    pub fn generate(
        &mut self,
        letters: &str,
        cipher_alphabet: &str,
        num_states: usize,
    ) -> Result<MachineSet, GenerateError> {
        let letters: Vec<char> = letters.chars().collect();
        let alphabet: Vec<char> = cipher_alphabet.chars().collect();

        if letters.len() < 2 {
            return Err(GenerateError::TooFewLetters(letters.len()));
        }
        if alphabet.is_empty() {
            return Err(GenerateError::EmptyCipherAlphabet);
        }
        if num_states == 0 {
            return Err(GenerateError::NoStates);
        }

        let cap = (letters.len() + alphabet.len() - 1) / alphabet.len();
        let mut usage: FxHashMap<char, usize> = alphabet.iter().map(|&c| (c, 0)).collect();

        let mut machines = Vec::with_capacity(letters.len());
        for &letter in &letters {
            machines.push(self.generate_one(letter, &alphabet, num_states, &mut usage, cap)?);
        }

        Ok(MachineSet::new(machines))
    }

    /// Generate one machine, retrying whole tables until the sink is
    /// reachable or the attempt budget runs out.
    fn generate_one(
        &mut self,
        letter: char,
        alphabet: &[char],
        num_states: usize,
        usage: &mut FxHashMap<char, usize>,
        cap: usize,
    ) -> Result<Machine, GenerateError> {
        for _ in 0..self.max_build_attempts {
            let operational: Vec<StateId> = (0..num_states as u32).map(StateId).collect();
            let mut transitions = self.random_table(&operational, alphabet);

            // Any grid cell works as the accepting cell, filled or dead,
            // as long as its symbol is still under the cap.
            let mut eligible = Vec::with_capacity(num_states * alphabet.len());
            for &state in &operational {
                for &symbol in alphabet {
                    if usage[&symbol] < cap {
                        eligible.push((state, symbol));
                    }
                }
            }
            let Some(&(cell_state, cell_symbol)) = eligible.choose(&mut self.rng) else {
                return Err(GenerateError::AcceptingSymbolsExhausted { letter });
            };

            let sink = StateId(num_states as u32);
            match transitions
                .iter_mut()
                .find(|t| t.from_state == cell_state && t.symbol == cell_symbol)
            {
                Some(transition) => transition.to_states = vec![sink],
                None => transitions.push(Transition {
                    from_state: cell_state,
                    symbol: cell_symbol,
                    to_states: vec![sink],
                }),
            }

            let mut states = operational;
            states.push(sink);
            let initial = states[0];

            let mut shuffled = alphabet.to_vec();
            shuffled.shuffle(&mut self.rng);
            let balancing = Balancing::from_halves(shuffled, cell_symbol);

            let machine = Machine::new(
                letter,
                alphabet.to_vec(),
                states,
                initial,
                sink,
                transitions,
                AcceptingCell {
                    state: cell_state,
                    symbol: cell_symbol,
                },
                balancing,
            );

            if machine.sink_reachable() {
                if let Some(count) = usage.get_mut(&cell_symbol) {
                    *count += 1;
                }
                return Ok(machine);
            }
        }

        Err(GenerateError::SinkUnreachable {
            letter,
            attempts: self.max_build_attempts,
        })
    }

    /// Random transition table: each `(state, symbol)` cell gets a single
    /// uniformly random target with probability `fill_percent`, else stays
    /// dead.
    fn random_table(&mut self, states: &[StateId], alphabet: &[char]) -> Vec<Transition> {
        let fill = f64::from(self.fill_percent) / 100.0;
        let mut transitions = Vec::new();

        for &from_state in states {
            for &symbol in alphabet {
                if !self.rng.gen_bool(fill) {
                    continue;
                }
                let target = states[self.rng.gen_range(0..states.len())];
                transitions.push(Transition {
                    from_state,
                    symbol,
                    to_states: vec![target],
                });
            }
        }

        transitions
    }
}
