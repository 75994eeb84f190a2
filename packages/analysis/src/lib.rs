#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis engine for ward environmental, education and energy metrics.
//!
//! Three independent services, each a plain value holding its own
//! configuration:
//!
//! - [`correlation::CorrelationAnalyzer`] correlates metric series for a
//!   ward and turns the result into recommended green actions.
//! - [`clustering::WardClusterer`] groups wards with similar profiles.
//! - [`impact::ImpactEstimator`] looks up the projected effect of an action.
//!
//! None of them perform I/O. Fetching the data and persisting the results is
//! the caller's job.

pub mod clustering;
pub mod config;
pub mod correlation;
pub mod impact;
pub mod recommendations;
pub mod stats;

use thiserror::Error;
use ward_insights_analysis_models::{AnalysisErrorKind, AnalysisFailure};

/// Errors that can occur during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Too few points to compute the statistic.
    #[error("Insufficient data: {required} points required, got {actual}")]
    InsufficientData {
        /// Minimum number of points needed.
        required: usize,
        /// Number of points supplied.
        actual: usize,
    },

    /// Two series that must be paired differ in length.
    #[error("Mismatched lengths: {left} vs {right} points")]
    MismatchedLengths {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },

    /// Nothing was supplied to analyze.
    #[error("No data provided: {what}")]
    EmptyInput {
        /// What was empty.
        what: &'static str,
    },

    /// The computation could not be carried out on the given numbers.
    #[error("Numerical failure: {message}")]
    NumericalFailure {
        /// Description of what went wrong.
        message: String,
    },
}

impl AnalysisError {
    /// Returns the failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> AnalysisErrorKind {
        match self {
            Self::InsufficientData { .. } => AnalysisErrorKind::InsufficientData,
            Self::MismatchedLengths { .. } => AnalysisErrorKind::MismatchedLengths,
            Self::EmptyInput { .. } => AnalysisErrorKind::EmptyInput,
            Self::NumericalFailure { .. } => AnalysisErrorKind::NumericalFailure,
        }
    }

    pub(crate) fn numerical(message: impl Into<String>) -> Self {
        Self::NumericalFailure {
            message: message.into(),
        }
    }
}

impl From<&AnalysisError> for AnalysisFailure {
    fn from(value: &AnalysisError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<AnalysisError> for AnalysisFailure {
    fn from(value: AnalysisError) -> Self {
        Self::from(&value)
    }
}
