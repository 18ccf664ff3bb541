use crate::error::AlarmError;
use crate::notes::*;
use rand::prelude::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

type WeightedRow = &'static [(MidiByte, usize)];

const START_ROW: WeightedRow = &[
    (C4, 1), (D4, 1), (E4, 1), (F4, 1), (G4, 1), (A4, 1), (B4, 1), (C5, 1),
];

// Heavier weights pull toward the tonic triad; chromatic tones resolve by step.
const ROWS: [(MidiByte, WeightedRow); 17] = [
    (B3, &[(C4, 6), (D4, 2), (G4, 1)]),
    (C4, &[(D4, 4), (E4, 4), (G4, 3), (C5, 2), (B3, 1)]),
    (D4, &[(C4, 4), (E4, 4), (F4, 2), (EB4, 1), (B3, 1)]),
    (EB4, &[(E4, 4), (D4, 2)]),
    (E4, &[(G4, 4), (D4, 3), (F4, 3), (C4, 3), (C5, 1)]),
    (F4, &[(E4, 5), (G4, 3), (D4, 2), (A4, 1), (FS4, 1)]),
    (FS4, &[(G4, 5), (E4, 1)]),
    (G4, &[(C4, 6), (E4, 6), (A4, 2), (F4, 2), (C5, 2), (B4, 1), (GS4, 1)]),
    (GS4, &[(A4, 5), (G4, 1)]),
    (A4, &[(G4, 4), (B4, 3), (F4, 2), (C5, 2), (BB4, 1)]),
    (BB4, &[(A4, 4), (G4, 2)]),
    (B4, &[(C5, 6), (A4, 3), (G4, 2), (D5, 1)]),
    (C5, &[(B4, 3), (D5, 3), (G4, 3), (E5, 2), (A4, 2), (C4, 2), (CS5, 1)]),
    (CS5, &[(D5, 5), (C5, 1)]),
    (D5, &[(C5, 4), (E5, 3), (B4, 3), (G4, 2), (DS5, 1)]),
    (DS5, &[(E5, 5), (D5, 1)]),
    (E5, &[(D5, 4), (C5, 4), (G4, 2), (E4, 1)]),
];

/// Candidate successors with heavier candidates repeated, so a uniform draw
/// over `choices` samples the weighted distribution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransitionRow {
    choices: Vec<MidiByte>,
}

impl TransitionRow {
    pub fn from_weights(weights: &[(MidiByte, usize)]) -> Self {
        let choices = weights
            .iter()
            .flat_map(|(pitch, weight)| std::iter::repeat(*pitch).take(*weight))
            .collect();
        TransitionRow { choices }
    }

    pub fn contains(&self, pitch: MidiByte) -> bool {
        self.choices.contains(&pitch)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn copies_of(&self, pitch: MidiByte) -> usize {
        self.choices.iter().filter(|p| **p == pitch).count()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<MidiByte> {
        self.choices.choose(rng).copied()
    }
}

#[derive(Clone, Debug)]
pub struct NoteTransitionTable {
    start: TransitionRow,
    rows: BTreeMap<MidiByte, TransitionRow>,
}

impl Default for NoteTransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTransitionTable {
    pub fn new() -> Self {
        Self::from_rows(START_ROW, &ROWS)
    }

    pub fn from_rows(start: &[(MidiByte, usize)], rows: &[(MidiByte, WeightedRow)]) -> Self {
        NoteTransitionTable {
            start: TransitionRow::from_weights(start),
            rows: rows
                .iter()
                .map(|(pitch, row)| (*pitch, TransitionRow::from_weights(row)))
                .collect(),
        }
    }

    pub fn pitches(&self) -> impl Iterator<Item = MidiByte> + '_ {
        self.rows.keys().copied()
    }

    /// `None` selects the session-start row.
    pub fn row(&self, previous: Option<MidiByte>) -> Result<&TransitionRow, AlarmError> {
        match previous {
            None => Ok(&self.start),
            Some(pitch) => self
                .rows
                .get(&pitch)
                .ok_or(AlarmError::InvalidState { pitch }),
        }
    }

    pub fn next<R: Rng + ?Sized>(&self, previous: Option<MidiByte>, rng: &mut R) -> Result<MidiByte, AlarmError> {
        let row = self.row(previous)?;
        row.choose(rng).ok_or(AlarmError::InvalidState {
            pitch: previous.unwrap_or_default(),
        })
    }
}
