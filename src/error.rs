//! Error handling for the pricing engine

use uuid::Uuid;

/// Engine error type
///
/// Every failure is returned to the caller as a typed value; the engine never
/// falls back to a default cost. `Unavailable` is a pass-through variant for
/// availability failures detected upstream - the engine itself never
/// constructs it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// The requested range touches a buffer day. Carries the minimum booking
    /// length in days for the caller's message template.
    #[error("the duration of this booking must be at least {minimum_days} days")]
    DurationTooShort { minimum_days: u32 },

    /// Malformed pricing configuration (zero block duration, zero divisor,
    /// inverted rule range, ...). Detected before any block is evaluated.
    #[error("invalid pricing configuration: {message}")]
    InvalidConfig { message: String },

    /// The request names a resource the product does not carry.
    #[error("unknown resource {0}")]
    UnknownResource(Uuid),

    /// The request names a person type the product does not carry.
    #[error("unknown person type {0}")]
    UnknownPersonType(Uuid),

    /// Availability failure forwarded from the calling layer, unchanged.
    #[error("slot unavailable: {0}")]
    Unavailable(String),
}

impl PricingError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        PricingError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Machine-readable reason code for API error payloads.
    pub fn reason_code(&self) -> &'static str {
        match self {
            PricingError::DurationTooShort { .. } => "duration_too_short",
            PricingError::InvalidConfig { .. } => "invalid_config",
            PricingError::UnknownResource(_) => "unknown_resource",
            PricingError::UnknownPersonType(_) => "unknown_person_type",
            PricingError::Unavailable(_) => "unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, PricingError>;
