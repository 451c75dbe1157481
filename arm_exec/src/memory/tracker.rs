//! Shape pair tracker

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Known positions of every shape on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapePairTracker {
    shapes: Vec<ShapeRecord>,

    /// Number of matched shapes
    complete: usize,
}

/// Known positions of one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub positions: [Option<usize>; 2],
    pub matched: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("Shape {0} does not exist")]
    UnknownShape(usize),

    #[error("Shape {0} is already matched")]
    AlreadyMatched(usize),

    #[error("Shape {shape} reported at a third position (cell {cell})")]
    ThirdPosition { shape: usize, cell: usize },

    #[error("Shape {0} cannot be matched before both its positions are known")]
    Incomplete(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ShapePairTracker {
    pub fn new(num_shapes: usize) -> Self {
        Self {
            shapes: vec![ShapeRecord::default(); num_shapes],
            complete: 0,
        }
    }

    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Number of matched shapes.
    pub fn complete(&self) -> usize {
        self.complete
    }

    pub fn is_complete(&self) -> bool {
        self.complete == self.shapes.len()
    }

    pub fn get(&self, shape: usize) -> Option<&ShapeRecord> {
        self.shapes.get(shape)
    }

    /// Check that `shape` could be recorded at `cell`, without recording it.
    pub fn check(&self, shape: usize, cell: usize) -> Result<(), TrackerError> {
        let record = self
            .shapes
            .get(shape)
            .ok_or(TrackerError::UnknownShape(shape))?;

        if record.matched {
            return Err(TrackerError::AlreadyMatched(shape));
        }

        if record.positions.contains(&Some(cell)) || record.positions.contains(&None) {
            Ok(())
        } else {
            Err(TrackerError::ThirdPosition { shape, cell })
        }
    }

    /// Record that `shape` is at `cell`, returning the number of known positions of the shape.
    ///
    /// Recording a known position again has no effect.
    pub fn record(&mut self, shape: usize, cell: usize) -> Result<usize, TrackerError> {
        self.check(shape, cell)?;

        let record = &mut self.shapes[shape];
        if !record.positions.contains(&Some(cell)) {
            if let Some(slot) = record.positions.iter_mut().find(|p| p.is_none()) {
                *slot = Some(cell);
            }
        }

        Ok(record.num_known())
    }

    /// The other known position of `shape`, if any.
    pub fn partner(&self, shape: usize, cell: usize) -> Option<usize> {
        self.shapes
            .get(shape)?
            .positions
            .iter()
            .flatten()
            .copied()
            .find(|&p| p != cell)
    }

    /// The first unmatched shape with both positions known.
    pub fn known_pair(&self) -> Option<(usize, [usize; 2])> {
        self.shapes
            .iter()
            .enumerate()
            .find_map(|(i, r)| match (r.matched, r.positions) {
                (false, [Some(a), Some(b)]) => Some((i, [a, b])),
                _ => None,
            })
    }

    /// Mark a shape as matched and count it as complete.
    pub fn mark_matched(&mut self, shape: usize) -> Result<(), TrackerError> {
        let record = self
            .shapes
            .get_mut(shape)
            .ok_or(TrackerError::UnknownShape(shape))?;

        if record.matched {
            return Err(TrackerError::AlreadyMatched(shape));
        }
        if record.num_known() != 2 {
            return Err(TrackerError::Incomplete(shape));
        }

        record.matched = true;
        self.complete += 1;
        Ok(())
    }
}

impl ShapeRecord {
    pub fn num_known(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tracker() {
        let mut t = ShapePairTracker::new(3);

        assert_eq!(t.record(1, 4), Ok(1));
        assert_eq!(t.record(1, 4), Ok(1));
        assert_eq!(t.partner(1, 4), None);
        assert_eq!(t.mark_matched(1), Err(TrackerError::Incomplete(1)));

        assert_eq!(t.record(1, 0), Ok(2));
        assert_eq!(t.partner(1, 0), Some(4));
        assert_eq!(t.known_pair(), Some((1, [4, 0])));

        assert_eq!(
            t.record(1, 5),
            Err(TrackerError::ThirdPosition { shape: 1, cell: 5 })
        );
        assert_eq!(t.record(3, 5), Err(TrackerError::UnknownShape(3)));

        assert_eq!(t.complete(), 0);
        t.mark_matched(1).unwrap();
        assert_eq!(t.complete(), 1);
        assert_eq!(t.known_pair(), None);
        assert_eq!(t.record(1, 4), Err(TrackerError::AlreadyMatched(1)));
        assert!(!t.is_complete());
    }
}
