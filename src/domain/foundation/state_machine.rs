//! State machine trait for status enums.
//!
//! Centralizes transition legality in one table per status enum instead of
//! scattering conditional checks across handlers.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the legal transition table once; validated transition
/// methods come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for SubscriptionStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Trial, Active) |
///             (Active, PastDue) |
///             // ... etc
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Trial => vec![Active, PastDue, Cancelled],
///             // ... etc
///         }
///     }
/// }
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is legal.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all legal target states from the current state, excluding
    /// the identity transition.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if illegal.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if the current state is terminal (no legal outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
