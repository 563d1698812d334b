//! Registration errors and the checks that raise them.

use crate::core::types::MoleculeType;

/// Why a registration or modification was rejected.
///
/// Every check runs before anything is inserted, so a returned error means
/// the store is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing {field} for {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("invalid reference to {target} - register that first")]
    DanglingReference { target: &'static str },

    #[error("unexpected molecule type for {target}: expected {expected}, found {found}")]
    TypeMismatch {
        target: &'static str,
        expected: MoleculeType,
        found: MoleculeType,
    },

    #[error("score type '{name}' already exists with opposite orientation")]
    OrientationConflict { name: String },
}

/// Reject an empty required string.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` if `value` is empty.
pub fn require_non_empty(
    value: &str,
    entity: &'static str,
    field: &'static str,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    Ok(())
}

/// Turn a failed membership check into an error.
///
/// # Errors
///
/// Returns `ValidationError::DanglingReference` if `is_valid` is false.
pub fn require_reference(is_valid: bool, target: &'static str) -> Result<(), ValidationError> {
    if is_valid {
        Ok(())
    } else {
        Err(ValidationError::DanglingReference { target })
    }
}

/// Check a declared molecule type against the expected one.
///
/// # Errors
///
/// Returns `ValidationError::TypeMismatch` if the types differ.
pub fn require_molecule_type(
    found: MoleculeType,
    expected: MoleculeType,
    target: &'static str,
) -> Result<(), ValidationError> {
    if found == expected {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            target,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("PEPTIDE", "peptide", "sequence").is_ok());
        let err = require_non_empty("", "peptide", "sequence").unwrap_err();
        assert_eq!(err.to_string(), "missing sequence for peptide");
    }

    #[test]
    fn test_require_reference_message() {
        let err = require_reference(false, "a score type").unwrap_err();
        assert_eq!(
            err,
            ValidationError::DanglingReference {
                target: "a score type"
            }
        );
        assert!(err.to_string().contains("register that first"));
    }

    #[test]
    fn test_require_molecule_type() {
        assert!(require_molecule_type(MoleculeType::Rna, MoleculeType::Rna, "parent").is_ok());
        let err =
            require_molecule_type(MoleculeType::Rna, MoleculeType::Protein, "parent").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected molecule type for parent: expected protein, found RNA"
        );
    }
}
