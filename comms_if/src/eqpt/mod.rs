//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the equipment attached
//! to the arm controller, and the traits the equipment drivers implement.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod arm;
pub mod display;
pub mod perception;
pub mod stepper;

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Errors reported by an equipment driver when it could not actuate a demand.
///
/// Errors are considered transient by the controller, the demand will be sent again on a later
/// cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EqptError {
    #[error("The equipment rejected the demand")]
    Rejected,
}
