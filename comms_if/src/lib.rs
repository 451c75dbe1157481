//! # Communications interface crate.
//!
//! Provides all common interfaces between the arm executable, its equipment (joint actuators,
//! cube steppers, the perception service and the display) and the telecommand sources.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and response definitions for equipment (like the arm joints)
pub mod eqpt;
