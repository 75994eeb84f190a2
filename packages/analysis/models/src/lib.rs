#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and result types for ward-level environmental analysis.
//!
//! These types cross the boundary between the analysis engine and whatever
//! surrounds it (CLI, storage, REST layer). They carry no behavior beyond
//! small classification helpers, and all of them serialize with `serde` so
//! callers can persist or expose them unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

// ── Observations ────────────────────────────────────────────────────

/// One air-quality observation for a ward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityRecord {
    /// Air Quality Index value.
    #[serde(default)]
    pub aqi: f64,
}

/// One school's performance record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    /// Average score as a fraction (0.0-1.0).
    #[serde(default)]
    pub avg_score: f64,
}

/// One energy-mix observation for a ward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRecord {
    /// Share of renewable energy, in percent.
    #[serde(default)]
    pub renewable_percentage: f64,
}

/// The three metric series analyzed for a single ward.
///
/// Each series is independently optional (may be empty). Series that are
/// correlated with each other are aligned by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardSeries {
    /// AQI observations.
    #[serde(default)]
    pub environment: Vec<f64>,
    /// School scores on a 0-100 scale.
    #[serde(default)]
    pub education: Vec<f64>,
    /// Renewable energy percentages.
    #[serde(default)]
    pub energy: Vec<f64>,
}

impl WardSeries {
    /// Builds the series from raw observation records.
    ///
    /// School scores are stored as fractions and are scaled to 0-100 here so
    /// that slopes and descriptions read in percentage points.
    #[must_use]
    pub fn from_records(
        air_quality: &[AirQualityRecord],
        schools: &[SchoolRecord],
        energy: &[EnergyRecord],
    ) -> Self {
        Self {
            environment: air_quality.iter().map(|r| r.aqi).collect(),
            education: schools.iter().map(|r| r.avg_score * 100.0).collect(),
            energy: energy.iter().map(|r| r.renewable_percentage).collect(),
        }
    }
}

// ── Correlation ─────────────────────────────────────────────────────

/// Qualitative strength of a single correlation coefficient.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Interpretation {
    /// `|r| < 0.3`
    Weak,
    /// `0.3 <= |r| < 0.7`
    Moderate,
    /// `|r| >= 0.7`
    Strong,
}

impl Interpretation {
    /// Upper bound (exclusive) of the weak band.
    pub const WEAK_BELOW: f64 = 0.3;
    /// Upper bound (exclusive) of the moderate band.
    pub const MODERATE_BELOW: f64 = 0.7;

    /// Classifies a correlation coefficient by magnitude.
    #[must_use]
    pub fn from_coefficient(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < Self::WEAK_BELOW {
            Self::Weak
        } else if magnitude < Self::MODERATE_BELOW {
            Self::Moderate
        } else {
            Self::Strong
        }
    }
}

/// Directional reading of a single environment/education correlation.
///
/// Used by the single-pair correlation path only. The multi-factor ward
/// analysis has its own recommendation rules.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrendAssessment {
    /// Clean air but weak schools.
    StrengthenEducation,
    /// Both metrics move together in the good direction.
    MaintainTrend,
    /// No clear relationship.
    InvestigateFurther,
}

impl TrendAssessment {
    /// Coefficient magnitude beyond which a direction is called out.
    pub const CUTOFF: f64 = 0.5;

    /// Reads the direction of a correlation coefficient.
    #[must_use]
    pub fn from_coefficient(r: f64) -> Self {
        if r < -Self::CUTOFF {
            Self::StrengthenEducation
        } else if r > Self::CUTOFF {
            Self::MaintainTrend
        } else {
            Self::InvestigateFurther
        }
    }

    /// Human-readable advice for this assessment.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::StrengthenEducation => {
                "Good environment but weak education - education needs strengthening"
            }
            Self::MaintainTrend => "Both environment and education are good - maintain this trend",
            Self::InvestigateFurther => "No clear correlation - further investigation needed",
        }
    }
}

/// Result of correlating one environment series with one education series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    /// Pearson correlation coefficient, in `[-1, 1]`.
    pub coefficient: f64,
    /// Two-sided p-value, in `[0, 1]`.
    pub p_value: f64,
    /// Least-squares slope of education on environment.
    pub slope: f64,
    /// Least-squares intercept.
    pub intercept: f64,
    /// Coefficient of determination, in `[0, 1]`.
    pub r_squared: f64,
    /// Strength band of the coefficient.
    pub interpretation: Interpretation,
    /// Advice text.
    pub recommendation: String,
}

/// The series pairs the ward analysis correlates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CorrelationPair {
    /// AQI vs. school scores.
    EnvironmentEducation,
    /// Renewable share vs. AQI.
    EnergyEnvironment,
}

/// Coefficient and significance for one correlated pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwiseCorrelation {
    /// Pearson correlation coefficient.
    pub coefficient: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Full multi-factor analysis of a single ward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardAnalysis {
    /// Ward the analysis was run for.
    pub ward: String,
    /// Correlations that could be computed. Pairs without enough data are
    /// absent.
    pub correlations: BTreeMap<CorrelationPair, PairwiseCorrelation>,
    /// Recommended actions in priority order.
    pub recommendations: Vec<RecommendedAction>,
    /// Mean absolute coefficient, capped at 1.0.
    pub confidence: f64,
    /// Set when the analysis failed; all other fields are then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,
}

impl WardAnalysis {
    /// A failed analysis with every result field emptied.
    #[must_use]
    pub fn failed(ward: impl Into<String>, failure: AnalysisFailure) -> Self {
        Self {
            ward: ward.into(),
            correlations: BTreeMap::new(),
            recommendations: Vec::new(),
            confidence: 0.0,
            error: Some(failure),
        }
    }

    /// Returns `true` if the analysis completed without an error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// ── Recommendations ─────────────────────────────────────────────────

/// Expected impact of a recommended action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImpactLevel {
    /// Minor improvement.
    Low,
    /// Noticeable improvement.
    Medium,
    /// Major improvement.
    High,
}

/// Who or what a recommended action is aimed at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionTarget {
    /// Individual schools.
    Schools,
    /// Energy infrastructure.
    Energy,
    /// Curriculum and education programs.
    Education,
    /// The physical environment.
    Environment,
}

/// A green action suggested by the ward analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    /// Short action title.
    pub action: String,
    /// Ward-specific description.
    pub description: String,
    /// Expected impact.
    pub impact: ImpactLevel,
    /// What the action targets.
    pub target: ActionTarget,
    /// Optional free-text estimate of the effect (e.g. CO2 reduction).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effect: Option<String>,
}

// ── Clustering ──────────────────────────────────────────────────────

/// Per-ward feature record used for clustering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardProfile {
    /// Ward name, unique within one clustering call.
    pub name: String,
    /// Air Quality Index.
    #[serde(default)]
    pub aqi: f64,
    /// Average school score.
    #[serde(default)]
    pub avg_school_score: f64,
    /// Renewable energy share, in percent.
    #[serde(default)]
    pub renewable_energy: f64,
    /// Number of schools in the ward.
    #[serde(default)]
    pub num_schools: u32,
}

impl WardProfile {
    /// Feature vector in the fixed order
    /// `[aqi, avg_school_score, renewable_energy, num_schools]`.
    #[must_use]
    pub fn features(&self) -> [f64; 4] {
        [
            self.aqi,
            self.avg_school_score,
            self.renewable_energy,
            f64::from(self.num_schools),
        ]
    }
}

/// Wards grouped by cluster label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAssignment {
    /// Cluster label -> ward names. Labels carry no ordering meaning.
    pub clusters: BTreeMap<usize, Vec<String>>,
    /// Number of non-empty clusters.
    pub cluster_count: usize,
}

/// Outcome of a clustering call, with failures reported in-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    /// Whether clustering completed.
    pub success: bool,
    /// Cluster label -> ward names. Empty on failure.
    pub clusters: BTreeMap<usize, Vec<String>>,
    /// Number of non-empty clusters. Zero on failure.
    pub cluster_count: usize,
    /// Set when clustering failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,
}

impl From<ClusterAssignment> for ClusterReport {
    fn from(value: ClusterAssignment) -> Self {
        Self {
            success: true,
            clusters: value.clusters,
            cluster_count: value.cluster_count,
            error: None,
        }
    }
}

impl From<AnalysisFailure> for ClusterReport {
    fn from(value: AnalysisFailure) -> Self {
        Self {
            success: false,
            clusters: BTreeMap::new(),
            cluster_count: 0,
            error: Some(value),
        }
    }
}

// ── Impact estimates ────────────────────────────────────────────────

/// Green actions with known impact profiles.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GreenAction {
    /// Planting trees.
    TreePlanting,
    /// Rooftop solar on schools and public buildings.
    SolarInstallation,
    /// Environmental education programs.
    GreenEducation,
}

/// Projected effect of a green action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImpactEstimate {
    /// Tree planting projection.
    #[serde(rename_all = "camelCase")]
    TreePlanting {
        /// Expected AQI drop, scaled by the current AQI.
        aqi_reduction: f64,
        /// kg CO2 per year per 100 trees.
        co2_reduction: f64,
        /// Time until the effect is visible.
        timeline: String,
    },
    /// Solar installation projection.
    #[serde(rename_all = "camelCase")]
    SolarInstallation {
        /// kWh generated per year.
        energy_generation: f64,
        /// kg CO2 avoided per year.
        co2_reduction: f64,
        /// Years until return on investment.
        roi_years: u32,
    },
    /// Green education projection.
    #[serde(rename_all = "camelCase")]
    GreenEducation {
        /// Awareness increase, in percent.
        awareness_increase: f64,
        /// Expected number of participants.
        estimated_participants: u32,
        /// Qualitative CO2 awareness level.
        co2_awareness: String,
    },
    /// Fallback for actions without a profile.
    #[serde(rename_all = "camelCase")]
    General {
        /// Explains why no specific data is available.
        note: String,
        /// Generic expected effect.
        general_impact: String,
    },
}

/// Metrics an impact estimate was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMetrics {
    /// Current AQI.
    pub aqi: u32,
    /// Current renewable energy share, in percent.
    pub energy_percentage: f64,
}

/// An impact estimate together with the inputs it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Action name as requested.
    pub action: String,
    /// Inputs to the estimate.
    pub current_metrics: CurrentMetrics,
    /// The estimate itself.
    pub predicted_impact: ImpactEstimate,
}

// ── Failures ────────────────────────────────────────────────────────

/// Closed set of analysis failure categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisErrorKind {
    /// Fewer data points than the computation needs.
    InsufficientData,
    /// Paired series differ in length.
    MismatchedLengths,
    /// Nothing to analyze.
    EmptyInput,
    /// The numbers themselves could not be processed (zero variance,
    /// non-finite values).
    NumericalFailure,
}

/// In-band failure payload attached to analysis results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFailure {
    /// Failure category, for programmatic branching.
    pub kind: AnalysisErrorKind,
    /// Human-readable description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpretation_bands() {
        assert_eq!(Interpretation::from_coefficient(0.0), Interpretation::Weak);
        assert_eq!(Interpretation::from_coefficient(-0.29), Interpretation::Weak);
        assert_eq!(Interpretation::from_coefficient(0.3), Interpretation::Moderate);
        assert_eq!(Interpretation::from_coefficient(-0.69), Interpretation::Moderate);
        assert_eq!(Interpretation::from_coefficient(0.7), Interpretation::Strong);
        assert_eq!(Interpretation::from_coefficient(-1.0), Interpretation::Strong);
    }

    #[test]
    fn trend_assessment_branches_on_sign() {
        assert_eq!(
            TrendAssessment::from_coefficient(-0.8),
            TrendAssessment::StrengthenEducation
        );
        assert_eq!(
            TrendAssessment::from_coefficient(0.8),
            TrendAssessment::MaintainTrend
        );
        assert_eq!(
            TrendAssessment::from_coefficient(-0.5),
            TrendAssessment::InvestigateFurther
        );
        assert_eq!(
            TrendAssessment::from_coefficient(0.5),
            TrendAssessment::InvestigateFurther
        );
    }

    #[test]
    fn school_scores_are_scaled_to_percent() {
        let series = WardSeries::from_records(
            &[AirQualityRecord { aqi: 80.0 }],
            &[SchoolRecord { avg_score: 0.75 }, SchoolRecord { avg_score: 0.5 }],
            &[],
        );
        assert_eq!(series.environment, vec![80.0]);
        assert_eq!(series.education, vec![75.0, 50.0]);
        assert!(series.energy.is_empty());
    }

    #[test]
    fn ward_profile_missing_fields_default_to_zero() {
        let profile: WardProfile = serde_json::from_str(r#"{"name":"Ward 1","aqi":42.0}"#).unwrap();
        assert_eq!(profile.features(), [42.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn correlation_pair_serializes_as_map_key() {
        let mut correlations = BTreeMap::new();
        correlations.insert(
            CorrelationPair::EnvironmentEducation,
            PairwiseCorrelation {
                coefficient: -0.5,
                p_value: 0.2,
            },
        );
        let json = serde_json::to_value(&correlations).unwrap();
        assert!(json.get("environment_education").is_some());
    }

    #[test]
    fn green_action_parses_snake_case_names() {
        assert_eq!(
            "tree_planting".parse::<GreenAction>().unwrap(),
            GreenAction::TreePlanting
        );
        assert_eq!(
            "solar_installation".parse::<GreenAction>().unwrap(),
            GreenAction::SolarInstallation
        );
        assert!("unknown_action".parse::<GreenAction>().is_err());
    }

    #[test]
    fn failed_cluster_report_is_empty() {
        let report = ClusterReport::from(AnalysisFailure {
            kind: AnalysisErrorKind::EmptyInput,
            message: "No data provided".to_string(),
        });
        assert!(!report.success);
        assert!(report.clusters.is_empty());
        assert_eq!(report.cluster_count, 0);
    }
}
