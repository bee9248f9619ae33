//! Per-letter machine data model.
//!
//! Every plaintext letter is ciphered by its own randomly generated finite
//! automaton. A [`Machine`] is immutable once built: the generator produces
//! it, the sampler and the engine only read it. A [`MachineSet`] bundles one
//! machine per letter of the plaintext alphabet, in alphabet order.

pub mod balance;
pub mod generator;

pub use balance::Balancing;
pub use generator::{GenerateError, Generator};

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Opaque identifier of a machine state.
///
/// States are dense small integers under the hood; the display form `s0`,
/// `s1`, ... matches the persisted key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "serialization", serde(transparent))]
pub struct StateId(
    /// Raw dense index of the state.
    pub u32,
);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// One cell of a machine's transition table.
///
/// `to_states` is kept as a set for generality even though generation never
/// produces more than one target per `(from_state, symbol)` pair. A pair with
/// no stored transition is dead: reading that symbol from that state halts
/// any walk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub struct Transition {
    /// Source state.
    pub from_state: StateId,
    /// Input symbol consumed by this transition.
    pub symbol: char,
    /// Target states (at most one by construction).
    pub to_states: Vec<StateId>,
}

/// The one `(state, symbol)` pair rewired to point at the accepting sink.
///
/// Every word a machine accepts necessarily ends with this cell's symbol,
/// which is what lets the decoder narrow its candidate machines by the last
/// character of the remaining ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AcceptingCell {
    /// Source state of the rewired transition.
    pub state: StateId,
    /// Symbol of the rewired transition.
    pub symbol: char,
}

/// Finite automaton ciphering a single plaintext letter.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    letter: char,
    alphabet: Vec<char>,
    states: Vec<StateId>,
    initial: StateId,
    sink: StateId,
    transitions: Vec<Transition>,
    accepting_cell: AcceptingCell,
    balancing: Balancing,
}

impl Machine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        letter: char,
        alphabet: Vec<char>,
        states: Vec<StateId>,
        initial: StateId,
        sink: StateId,
        transitions: Vec<Transition>,
        accepting_cell: AcceptingCell,
        balancing: Balancing,
    ) -> Self {
        Self {
            letter,
            alphabet,
            states,
            initial,
            sink,
            transitions,
            accepting_cell,
            balancing,
        }
    }

    /// The plaintext letter this machine ciphers.
    pub fn letter(&self) -> char {
        self.letter
    }

    /// The cipher alphabet this machine reads.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// All states, including the synthetic accepting sink.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// The state every replay starts from.
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// The sole accepting state.
    pub fn sink(&self) -> StateId {
        self.sink
    }

    /// The transition table. Pairs without an entry are dead.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// The unique doorway into acceptance.
    pub fn accepting_cell(&self) -> AcceptingCell {
        self.accepting_cell
    }

    /// The left/right alphabet partition used by the balance predicate.
    pub fn balancing(&self) -> &Balancing {
        &self.balancing
    }

    /// Whether this machine accepts `word`.
    ///
    /// Deterministically replays `word` from the initial state, treating
    /// transition targets as sets. A symbol with no live transition out of
    /// the current state set ends the replay with no match; that is an
    /// ordinary rejection, not an error. Pure: repeated calls agree.
    pub fn accepts(&self, word: &str) -> bool {
        let mut current: SmallVec<[StateId; 8]> = smallvec![self.initial];

        for symbol in word.chars() {
            let mut next: SmallVec<[StateId; 8]> = SmallVec::new();
            for transition in &self.transitions {
                if transition.symbol == symbol && current.contains(&transition.from_state) {
                    for &target in &transition.to_states {
                        if !next.contains(&target) {
                            next.push(target);
                        }
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            current = next;
        }

        current.contains(&self.sink)
    }

    /// Whether the accepting sink can be reached from the initial state.
    ///
    /// Forward breadth-first walk over the transition table. The generator
    /// discards machines failing this check, so a machine it returns always
    /// answers true here.
    pub fn sink_reachable(&self) -> bool {
        let mut seen: FxHashSet<StateId> = FxHashSet::default();
        let mut frontier = vec![self.initial];
        seen.insert(self.initial);

        while let Some(state) = frontier.pop() {
            for transition in &self.transitions {
                if transition.from_state != state {
                    continue;
                }
                for &target in &transition.to_states {
                    if seen.insert(target) {
                        frontier.push(target);
                    }
                }
            }
        }

        seen.contains(&self.sink)
    }

    /// Transitions whose target set contains `state`.
    ///
    /// Reverse adjacency for the backward word sampler.
    pub(crate) fn transitions_into(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions
            .iter()
            .filter(move |t| t.to_states.contains(&state))
    }
}

/// One [`Machine`] per plaintext letter, in plaintext-alphabet order.
///
/// Invariants, upheld by the generator and re-checked when keys are loaded:
/// the alphabet has at least two letters (the first two double as parity
/// markers), and no cipher symbol serves as an accepting-cell symbol in more
/// than `ceil(letters / cipher alphabet)` machines.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSet {
    letters: Vec<char>,
    machines: Vec<Machine>,
}

impl MachineSet {
    pub(crate) fn new(machines: Vec<Machine>) -> Self {
        let letters = machines.iter().map(Machine::letter).collect();
        Self { letters, machines }
    }

    /// The plaintext alphabet, in order.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// The machine ciphering `letter`, if the letter is in the alphabet.
    pub fn machine_for(&self, letter: char) -> Option<&Machine> {
        self.machines.iter().find(|m| m.letter == letter)
    }

    /// Machines whose accepting-cell symbol is `symbol`.
    ///
    /// These are the only machines that can accept a word ending in `symbol`,
    /// so they are the decoder's full candidate set for a trailing fragment.
    pub fn machines_accepting_on(&self, symbol: char) -> impl Iterator<Item = &Machine> {
        self.machines
            .iter()
            .filter(move |m| m.accepting_cell.symbol == symbol)
    }

    /// Iterate over all machines in plaintext-alphabet order.
    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    /// Number of letter machines.
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Whether the set holds no machines.
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Letter whose fragment marks an even-length plaintext.
    pub fn even_marker(&self) -> char {
        self.letters[0]
    }

    /// Letter whose fragment marks an odd-length plaintext.
    pub fn odd_marker(&self) -> char {
        self.letters[1]
    }
}
