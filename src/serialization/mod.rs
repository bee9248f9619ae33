//! Key-material persistence.
//!
//! Persisted keys are a record per plaintext letter — alphabet, states,
//! transitions, accepting state and cell, balancing halves — plus an
//! optional snapshot of the pre-sampled word store. JSON is the interchange
//! format (human-inspectable keys); bincode is available for compact
//! storage. Loading re-validates everything against the configured
//! alphabets before any machine is built: malformed keys are a fatal,
//! typed error, never a crash deeper in the engine.

mod html;

pub use html::render_html;

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CipherConfig;
use crate::engine::{CipherEngine, WordStore};
use crate::machine::{AcceptingCell, Balancing, Machine, MachineSet, StateId, Transition};

/// Errors that can occur while persisting or loading key material.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Error during JSON serialization.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    /// Error during bincode serialization.
    #[error("bincode error")]
    Bincode(#[from] bincode::Error),
    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// Loaded keys do not describe a usable machine set.
    #[error("malformed key material: {0}")]
    MalformedKeys(String),
}

/// Persisted form of one letter machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineRecord {
    /// Cipher alphabet the machine reads.
    pub alphabet: Vec<char>,
    /// All states, the accepting sink included.
    pub states: Vec<StateId>,
    /// Replay start state.
    pub initial_state: StateId,
    /// Accepting states; exactly one by construction.
    pub accepting_states: Vec<StateId>,
    /// Live transition-table entries.
    pub transitions: Vec<Transition>,
    /// The plaintext letter this machine ciphers.
    pub ciphers_letter: char,
    /// Accepting cells; exactly one by construction.
    pub accepting_cells: Vec<AcceptingCell>,
    /// Balance-predicate alphabet partition.
    pub balancing: Balancing,
}

impl MachineRecord {
    fn from_machine(machine: &Machine) -> Self {
        Self {
            alphabet: machine.alphabet().to_vec(),
            states: machine.states().to_vec(),
            initial_state: machine.initial(),
            accepting_states: vec![machine.sink()],
            transitions: machine.transitions().to_vec(),
            ciphers_letter: machine.letter(),
            accepting_cells: vec![machine.accepting_cell()],
            balancing: machine.balancing().clone(),
        }
    }
}

/// Complete persisted key material: machines plus the optional word pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMaterial {
    /// Plaintext alphabet in order (JSON objects do not preserve it).
    pub letters: String,
    /// One machine record per plaintext letter.
    pub machines: BTreeMap<char, MachineRecord>,
    /// Pre-sampled words per letter, if a pool snapshot was persisted.
    /// Serialized as an explicit null when absent; bincode cannot cope with
    /// a field that is sometimes missing.
    #[serde(default)]
    pub word_store: Option<BTreeMap<char, Vec<String>>>,
}

impl KeyMaterial {
    /// Snapshot a machine set, without a word pool.
    pub fn from_machines(machines: &MachineSet) -> Self {
        Self {
            letters: machines.letters().iter().collect(),
            machines: machines
                .iter()
                .map(|m| (m.letter(), MachineRecord::from_machine(m)))
                .collect(),
            word_store: None,
        }
    }

    /// Snapshot an engine: machines plus its current word pool.
    pub fn from_engine(engine: &CipherEngine) -> Self {
        let mut keys = Self::from_machines(engine.machines());
        keys.word_store = Some(
            engine
                .word_store()
                .iter()
                .map(|(letter, queue)| (letter, queue.iter().cloned().collect()))
                .collect(),
        );
        keys
    }

    /// Validate against the configured alphabets and rebuild the machine set.
    ///
    /// Checked before any machine is built: the persisted plaintext alphabet
    /// matches the configured one, every machine reads the configured cipher
    /// alphabet, accepting state/cell are singletons wired to each other,
    /// transitions stay within the declared states, the balancing halves
    /// partition the alphabet, and the accepting-cell symbol cap holds
    /// across the set.
    pub fn into_machine_set(
        &self,
        config: &CipherConfig,
    ) -> Result<MachineSet, SerializationError> {
        if self.letters != config.source_alphabet {
            return Err(SerializationError::MalformedKeys(format!(
                "plaintext alphabet \"{}\" does not match configured \"{}\"",
                self.letters, config.source_alphabet
            )));
        }

        let cipher_alphabet: Vec<char> = config.cipher_alphabet.chars().collect();
        let letters: Vec<char> = self.letters.chars().collect();

        if self.machines.len() != letters.len() {
            return Err(SerializationError::MalformedKeys(format!(
                "expected {} machine records, found {}",
                letters.len(),
                self.machines.len()
            )));
        }

        let mut machines = Vec::with_capacity(letters.len());
        for &letter in &letters {
            let record = self.machines.get(&letter).ok_or_else(|| {
                SerializationError::MalformedKeys(format!("no machine record for '{letter}'"))
            })?;
            machines.push(rebuild_machine(letter, record, &cipher_alphabet)?);
        }

        let cap = (letters.len() + cipher_alphabet.len() - 1) / cipher_alphabet.len();
        for &symbol in &cipher_alphabet {
            let users = machines
                .iter()
                .filter(|m| m.accepting_cell().symbol == symbol)
                .count();
            if users > cap {
                return Err(SerializationError::MalformedKeys(format!(
                    "accepting symbol '{symbol}' is shared by {users} machines, cap is {cap}"
                )));
            }
        }

        Ok(MachineSet::new(machines))
    }

    /// Validate, rebuild, and wrap into an engine, restoring the persisted
    /// word pool when one is present.
    pub fn into_engine(&self, config: &CipherConfig) -> Result<CipherEngine, SerializationError> {
        let machines = self.into_machine_set(config)?;

        let store = match &self.word_store {
            Some(words) => {
                for letter in words.keys() {
                    if !self.letters.contains(*letter) {
                        return Err(SerializationError::MalformedKeys(format!(
                            "word store holds words for unknown letter '{letter}'"
                        )));
                    }
                }
                WordStore::from_words(words.iter().map(|(&letter, list)| (letter, list.clone())))
            }
            None => WordStore::new(),
        };

        Ok(CipherEngine::with_store(machines, store, config))
    }
}

fn rebuild_machine(
    letter: char,
    record: &MachineRecord,
    cipher_alphabet: &[char],
) -> Result<Machine, SerializationError> {
    let malformed =
        |detail: String| Err(SerializationError::MalformedKeys(format!("'{letter}': {detail}")));

    if record.ciphers_letter != letter {
        return malformed(format!(
            "record claims to cipher '{}'",
            record.ciphers_letter
        ));
    }
    if record.alphabet != cipher_alphabet {
        return malformed("machine alphabet does not match the configured cipher alphabet".into());
    }

    let &[sink] = record.accepting_states.as_slice() else {
        return malformed(format!(
            "expected exactly one accepting state, found {}",
            record.accepting_states.len()
        ));
    };
    let &[cell] = record.accepting_cells.as_slice() else {
        return malformed(format!(
            "expected exactly one accepting cell, found {}",
            record.accepting_cells.len()
        ));
    };

    let known = |state: StateId| record.states.contains(&state);
    if !known(record.initial_state) || !known(sink) || !known(cell.state) {
        return malformed("initial, accepting, or cell state is not a declared state".into());
    }
    if !record.alphabet.contains(&cell.symbol) {
        return malformed(format!("accepting-cell symbol '{}' is foreign", cell.symbol));
    }

    for transition in &record.transitions {
        if !known(transition.from_state) || !transition.to_states.iter().all(|&s| known(s)) {
            return malformed("transition references an undeclared state".into());
        }
        if !record.alphabet.contains(&transition.symbol) {
            return malformed(format!(
                "transition symbol '{}' is foreign",
                transition.symbol
            ));
        }
    }

    let doorway = record.transitions.iter().any(|t| {
        t.from_state == cell.state && t.symbol == cell.symbol && t.to_states == vec![sink]
    });
    if !doorway {
        return malformed("accepting cell is not wired to the accepting state".into());
    }

    let mut partition: Vec<char> = record
        .balancing
        .left
        .iter()
        .chain(record.balancing.right.iter())
        .copied()
        .collect();
    partition.sort_unstable();
    let mut expected = record.alphabet.clone();
    expected.sort_unstable();
    if partition != expected {
        return malformed("balancing halves do not partition the alphabet".into());
    }

    Ok(Machine::new(
        letter,
        record.alphabet.clone(),
        record.states.clone(),
        record.initial_state,
        sink,
        record.transitions.clone(),
        cell,
        record.balancing.clone(),
    ))
}

/// Serializer over persisted key material.
pub trait KeySerializer {
    /// Write key material to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn save<W: Write>(keys: &KeyMaterial, writer: W) -> Result<(), SerializationError>;

    /// Read key material from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or decoding fails. Alphabet validation
    /// happens later, in [`KeyMaterial::into_engine`].
    fn load<R: Read>(reader: R) -> Result<KeyMaterial, SerializationError>;
}

/// Human-readable JSON keys, the interchange format.
pub struct JsonKeySerializer;

impl KeySerializer for JsonKeySerializer {
    fn save<W: Write>(keys: &KeyMaterial, mut writer: W) -> Result<(), SerializationError> {
        serde_json::to_writer_pretty(&mut writer, keys)?;
        Ok(())
    }

    fn load<R: Read>(mut reader: R) -> Result<KeyMaterial, SerializationError> {
        Ok(serde_json::from_reader(&mut reader)?)
    }
}

/// Compact binary keys.
pub struct BincodeKeySerializer;

impl KeySerializer for BincodeKeySerializer {
    fn save<W: Write>(keys: &KeyMaterial, mut writer: W) -> Result<(), SerializationError> {
        bincode::serialize_into(&mut writer, keys)?;
        Ok(())
    }

    fn load<R: Read>(mut reader: R) -> Result<KeyMaterial, SerializationError> {
        Ok(bincode::deserialize_from(&mut reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Generator;

    fn keys_and_config(seed: u64) -> (KeyMaterial, CipherConfig) {
        let config = CipherConfig {
            seed: Some(seed),
            ..CipherConfig::default()
        };
        let machines = Generator::from_config(&config)
            .generate(
                &config.source_alphabet,
                &config.cipher_alphabet,
                config.num_states,
            )
            .unwrap();
        (KeyMaterial::from_machines(&machines), config)
    }

    #[test]
    fn json_round_trip_preserves_machines() {
        let (keys, config) = keys_and_config(1);

        let mut buffer = Vec::new();
        JsonKeySerializer::save(&keys, &mut buffer).unwrap();
        let loaded = JsonKeySerializer::load(&buffer[..]).unwrap();

        assert_eq!(keys, loaded);
        let original = keys.into_machine_set(&config).unwrap();
        let rebuilt = loaded.into_machine_set(&config).unwrap();
        assert_eq!(original, rebuilt);
    }

    #[test]
    fn mismatched_source_alphabet_is_fatal() {
        let (keys, _) = keys_and_config(2);
        let other = CipherConfig {
            source_alphabet: "xyz".to_string(),
            ..CipherConfig::default()
        };
        assert!(matches!(
            keys.into_machine_set(&other),
            Err(SerializationError::MalformedKeys(_))
        ));
    }

    #[test]
    fn tampered_accepting_cell_is_fatal() {
        let (mut keys, config) = keys_and_config(3);
        let first = keys.letters.chars().next().unwrap();
        let record = keys.machines.get_mut(&first).unwrap();
        record.accepting_cells.clear();

        assert!(matches!(
            keys.into_machine_set(&config),
            Err(SerializationError::MalformedKeys(_))
        ));
    }
}
