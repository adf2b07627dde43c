use std::fmt;

use thiserror::Error;

/// Where inside a parameter an invalid value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The parameter as a whole (a scalar, a length, a shape).
    Whole,
    /// One element of a vector parameter.
    Index(usize),
    /// One cell of a matrix parameter.
    Cell(usize, usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Whole => Ok(()),
            Location::Index(i) => write!(f, "[{i}]"),
            Location::Cell(i, j) => write!(f, "[{i}][{j}]"),
        }
    }
}

/// Every failure the kernel can report. Validation runs before any numeric
/// output is produced, so an error never comes with a partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MjlogError {
    /// Non-finite, wrong sign, wrong shape, empty, or too small to sample.
    #[error("invalid argument `{param}{at}`: {reason}")]
    InvalidArgument {
        param: &'static str,
        at: Location,
        reason: String,
    },

    /// The MJLOG logarithm would be undefined at cell (i, j).
    #[error(
        "MJLOG log-argument must be finite and > 0 at (i={i}, j={j}): \
         ({frequency} / {reference}) * {modulator} = {arg}"
    )]
    Domain {
        i: usize,
        j: usize,
        frequency: f64,
        reference: f64,
        modulator: f64,
        arg: f64,
    },
}

impl MjlogError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        MjlogError::InvalidArgument {
            param,
            at: Location::Whole,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_at(param: &'static str, index: usize, reason: impl Into<String>) -> Self {
        MjlogError::InvalidArgument {
            param,
            at: Location::Index(index),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_cell(
        param: &'static str,
        i: usize,
        j: usize,
        reason: impl Into<String>,
    ) -> Self {
        MjlogError::InvalidArgument {
            param,
            at: Location::Cell(i, j),
            reason: reason.into(),
        }
    }

    /// Name of the offending parameter, if the error is an argument error.
    pub fn param(&self) -> Option<&'static str> {
        match self {
            MjlogError::InvalidArgument { param, .. } => Some(param),
            MjlogError::Domain { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MjlogError>;

/// Finite check shared by every validator.
pub(crate) fn ensure_finite(param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MjlogError::invalid(param, format!("must be finite (got {value})")))
    }
}

/// Finite and strictly positive.
pub(crate) fn ensure_positive(param: &'static str, value: f64) -> Result<()> {
    ensure_finite(param, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(MjlogError::invalid(param, format!("must be > 0 (got {value})")))
    }
}

/// Every element finite and strictly positive.
pub(crate) fn ensure_all_positive(param: &'static str, values: &[f64]) -> Result<()> {
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(MjlogError::invalid_at(param, i, format!("must be finite (got {v})")));
        }
        if v <= 0.0 {
            return Err(MjlogError::invalid_at(param, i, format!("must be > 0 (got {v})")));
        }
    }
    Ok(())
}
