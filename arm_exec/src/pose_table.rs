//! # Pose Table
//!
//! Static mapping from the named locations of a game layout (board cells, stack levels, cups,
//! temporary viewing slots, output positions) to the joint angles which put the grip over them.
//!
//! Each game has its own table, loaded from the game's parameter file. Tables are immutable
//! once the game has been created.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Target angles for the four positional joints of the arm.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Pose {
    pub base: i32,
    pub shoulder: i32,
    pub elbow: i32,
    pub wrist: i32,
}

/// Angles of the grip joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripAngles {
    /// Units: degrees
    pub open_deg: i32,

    /// Units: degrees
    pub closed_deg: i32,
}

/// The poses of every slot in a game layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseTable {
    /// Neutral retreat pose. Also used for any slot which is not defined in the table.
    pub home: Pose,

    /// Grip angles for the pieces of this game
    pub grip: GripAngles,

    /// Board cells in row-major order
    #[serde(default)]
    pub cells: Vec<Pose>,

    /// Piece stack levels, lowest first
    #[serde(default)]
    pub stack: Vec<Pose>,

    /// Cups, left to right
    #[serde(default)]
    pub cups: Vec<Pose>,

    /// Temporary holding (viewing) slots
    #[serde(default)]
    pub temp: Vec<Pose>,

    /// Output (drop) positions, lowest first
    #[serde(default)]
    pub output: Vec<Pose>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A named location in a game layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Home,
    Cell(usize),
    Stack(usize),
    Cup(usize),
    Temp(usize),
    Output(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub const fn new(base: i32, shoulder: i32, elbow: i32, wrist: i32) -> Self {
        Self {
            base,
            shoulder,
            elbow,
            wrist,
        }
    }
}

impl From<[i32; 4]> for Pose {
    fn from(a: [i32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

impl From<Pose> for [i32; 4] {
    fn from(p: Pose) -> Self {
        [p.base, p.shoulder, p.elbow, p.wrist]
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[b: {}, s: {}, e: {}, w: {}]",
            self.base, self.shoulder, self.elbow, self.wrist
        )
    }
}

impl Slot {
    /// True for slots where a piece is dropped rather than placed precisely.
    pub fn is_drop(&self) -> bool {
        matches!(self, Slot::Output(_))
    }
}

impl PoseTable {
    /// A table containing only the home pose.
    pub fn with_home(home: Pose, grip: GripAngles) -> Self {
        Self {
            home,
            grip,
            cells: vec![],
            stack: vec![],
            cups: vec![],
            temp: vec![],
            output: vec![],
        }
    }

    /// Get the pose of a slot.
    ///
    /// Slots missing from the table resolve to the home pose.
    pub fn resolve(&self, slot: Slot) -> Pose {
        match self.get(slot) {
            Some(p) => p,
            None => {
                warn!(
                    "{:?} is not defined in the pose table, using home pose {}",
                    slot, self.home
                );
                self.home
            }
        }
    }

    /// Get the pose of a slot, or `None` if it is not in the table.
    pub fn get(&self, slot: Slot) -> Option<Pose> {
        match slot {
            Slot::Home => Some(self.home),
            Slot::Cell(i) => self.cells.get(i).copied(),
            Slot::Stack(i) => self.stack.get(i).copied(),
            Slot::Cup(i) => self.cups.get(i).copied(),
            Slot::Temp(i) => self.temp.get(i).copied(),
            Slot::Output(i) => self.output.get(i).copied(),
        }
    }

    /// True if the slot has a pose in the table.
    pub fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve() {
        let mut table = PoseTable::with_home(
            Pose::new(90, 90, 90, 90),
            GripAngles {
                open_deg: 110,
                closed_deg: 80,
            },
        );
        table.cells.push(Pose::new(122, 13, 70, 41));

        assert_eq!(table.resolve(Slot::Cell(0)), Pose::new(122, 13, 70, 41));
        assert_eq!(table.resolve(Slot::Home), table.home);

        // Undefined slots fall back to home
        assert_eq!(table.resolve(Slot::Cell(8)), table.home);
        assert_eq!(table.resolve(Slot::Output(0)), table.home);
        assert!(!table.contains(Slot::Temp(0)));
    }

    #[test]
    fn test_deserialise() {
        let table: PoseTable = util::params::from_str(
            "home = [90, 90, 90, 90]\n\
             cups = [[120, 20, 80, 50], [108, 25, 85, 55]]\n\
             [grip]\n\
             open_deg = 100\n\
             closed_deg = 72\n",
        )
        .unwrap();

        assert_eq!(table.cups.len(), 2);
        assert_eq!(table.resolve(Slot::Cup(1)), Pose::new(108, 25, 85, 55));
        assert!(table.cells.is_empty());
        assert!(Slot::Output(3).is_drop());
        assert!(!Slot::Temp(0).is_drop());
    }
}
