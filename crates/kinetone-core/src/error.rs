//! Error type for configuration-time failures.
//!
//! Processing methods never return errors. Everything that can fail (buffer
//! allocation, FFT sizing, boundary validation of filter parameters) does so at
//! construction or configuration time through [`DspError`].

/// Errors reported by fallible constructors and validating setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DspError {
    /// A parameter value is outside the range the algorithm can realise.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// A buffer, frame or impulse length is zero or not a power of two.
    InvalidLength {
        /// What the length was for.
        what: &'static str,
        /// Rejected length.
        length: usize,
    },
    /// A slice did not have the length the receiver was configured for.
    LengthMismatch {
        /// Configured length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
}

impl DspError {
    /// Shorthand for [`DspError::InvalidParameter`].
    pub const fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Check that `length` is a non-zero power of two.
    pub fn require_power_of_two(what: &'static str, length: usize) -> Result<usize, Self> {
        if length == 0 || !length.is_power_of_two() {
            Err(Self::InvalidLength { what, length })
        } else {
            Ok(length)
        }
    }
}

impl core::fmt::Display for DspError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "invalid parameter '{name}' = {value}: {reason}"),
            Self::InvalidLength { what, length } => {
                write!(f, "invalid {what} length {length}: must be a non-zero power of two")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected at most {expected} samples, got {actual}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DspError {}
