use thiserror::Error;

/// Coarse classification of an [`IndicatorError`].
///
/// `InvalidParameter` is a caller bug (bad period, `fast >= slow`, empty
/// series). `MalformedInput` means the data itself is unusable (NaN prices,
/// negative volume, time running backwards, a settings document that does
/// not parse).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    MalformedInput,
}

/// Failure of an indicator computation, detected before any value is
/// produced.
///
/// Insufficient history is not an error: it shows up as `None` entries in
/// an [`IndicatorSeries`](crate::IndicatorSeries).
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("price series is empty")]
    EmptySeries,

    #[error("non-finite {field} at index {index}")]
    NonFiniteValue { index: usize, field: &'static str },

    #[error("volume at index {index} must be finite and non-negative")]
    InvalidVolume { index: usize },

    #[error("timestamp at index {index} is earlier than its predecessor")]
    DecreasingTimestamp { index: usize },

    #[error("invalid indicator settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl IndicatorError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } | Self::EmptySeries => ErrorKind::InvalidParameter,
            Self::NonFiniteValue { .. }
            | Self::InvalidVolume { .. }
            | Self::DecreasingTimestamp { .. }
            | Self::Settings(_) => ErrorKind::MalformedInput,
        }
    }
}

/// Rejects a zero period.
pub(crate) fn require_period(name: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::invalid(name, "must be positive"));
    }
    Ok(())
}

/// Rejects empty input and non-finite values.
pub(crate) fn require_finite(values: &[f64]) -> Result<(), IndicatorError> {
    if values.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(IndicatorError::NonFiniteValue {
            index,
            field: "value",
        }),
        None => Ok(()),
    }
}
