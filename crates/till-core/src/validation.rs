//! # Validation Module
//!
//! Input validation for lifecycle actions and manual movements.
//!
//! Validation runs at the orchestration layer (till-sync) before any write.
//! The store enforces the structural versions of these rules again via
//! schema constraints (CHECK / NOT NULL / UNIQUE), so a bug upstream
//! surfaces as a typed store error instead of bad data.

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::{MAX_NOTE_LEN, MAX_OPERATOR_NAME_LEN};

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates a movement amount: must be strictly positive.
///
/// Direction is carried by the movement kind, never by the sign.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::validation::validate_amount;
///
/// assert!(validate_amount(Money::from_cents(1200)).is_ok());
/// assert!(validate_amount(Money::zero()).is_err());
/// assert!(validate_amount(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a counted cash amount (opening float, closing count):
/// zero is allowed, negative is not.
pub fn validate_counted_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an operator name: non-empty after trimming, bounded length.
pub fn validate_operator_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "operator".to_string(),
        });
    }

    if name.len() > MAX_OPERATOR_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "operator".to_string(),
            max: MAX_OPERATOR_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional free-text note or description.
pub fn validate_note(field: &str, note: Option<&str>) -> ValidationResult<()> {
    if let Some(note) = note {
        if note.len() > MAX_NOTE_LEN {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_NOTE_LEN,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
