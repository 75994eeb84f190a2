//! Correlation analysis between environment, education and energy metrics.
//!
//! Two entry points with deliberately separate policies:
//!
//! - [`CorrelationAnalyzer::correlate`] handles a single environment/education
//!   pair. It validates its input strictly, fits a regression line, and
//!   classifies the coefficient with [`Interpretation`] and
//!   [`TrendAssessment`].
//! - [`CorrelationAnalyzer::analyze`] handles a whole ward. Pairs without
//!   enough data are skipped, failures are reported inside the returned
//!   [`WardAnalysis`], and recommendations come from
//!   [`crate::recommendations`].

use std::collections::BTreeMap;

use ward_insights_analysis_models::{
    AnalysisFailure, CorrelationPair, CorrelationResult, Interpretation, PairwiseCorrelation,
    TrendAssessment, WardAnalysis, WardSeries,
};

use crate::AnalysisError;
use crate::recommendations::{self, RecommendationInputs};
use crate::stats;

/// Default minimum `|r|` for the environment/education recommendation.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.5;

/// Correlates ward metric series and derives recommendations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationAnalyzer {
    correlation_threshold: f64,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_THRESHOLD)
    }
}

impl CorrelationAnalyzer {
    /// Creates an analyzer with the given environment/education threshold.
    #[must_use]
    pub const fn new(correlation_threshold: f64) -> Self {
        Self {
            correlation_threshold,
        }
    }

    /// The configured environment/education threshold.
    #[must_use]
    pub const fn correlation_threshold(&self) -> f64 {
        self.correlation_threshold
    }

    /// Correlates one environment series with one education series.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::MismatchedLengths`] if the series differ in length
    /// * [`AnalysisError::InsufficientData`] if there are fewer than two points
    /// * [`AnalysisError::NumericalFailure`] for non-finite values or a
    ///   constant series
    #[allow(clippy::unused_self)]
    pub fn correlate(
        &self,
        environment: &[f64],
        education: &[f64],
    ) -> Result<CorrelationResult, AnalysisError> {
        let moments = stats::PairedMoments::new(environment, education)?;
        let fit = moments.linear_fit();
        let pearson = moments.pearson()?;
        let assessment = TrendAssessment::from_coefficient(pearson.coefficient);

        log::debug!(
            "Correlated {} points: r={:.3} p={:.3} ({assessment})",
            environment.len(),
            pearson.coefficient,
            pearson.p_value
        );

        Ok(CorrelationResult {
            coefficient: pearson.coefficient,
            p_value: pearson.p_value,
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            interpretation: Interpretation::from_coefficient(pearson.coefficient),
            recommendation: assessment.message().to_string(),
        })
    }

    /// Runs the multi-factor analysis for one ward.
    ///
    /// Never fails: numerical problems are reported through
    /// [`WardAnalysis::error`] with every other field emptied.
    #[must_use]
    pub fn analyze(&self, ward: &str, series: &WardSeries) -> WardAnalysis {
        match self.try_analyze(ward, series) {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("Correlation analysis failed for {ward}: {e}");
                WardAnalysis::failed(ward, AnalysisFailure::from(e))
            }
        }
    }

    fn try_analyze(&self, ward: &str, series: &WardSeries) -> Result<WardAnalysis, AnalysisError> {
        let mut correlations = BTreeMap::new();

        let pairs = [
            (
                CorrelationPair::EnvironmentEducation,
                &series.environment,
                &series.education,
            ),
            (
                CorrelationPair::EnergyEnvironment,
                &series.energy,
                &series.environment,
            ),
        ];

        for (pair, x, y) in pairs {
            if let Some(correlation) = correlate_pair(pair, x, y)? {
                correlations.insert(pair, correlation);
            }
        }

        let recommendations = recommendations::generate(&RecommendationInputs {
            ward,
            correlations: &correlations,
            school_count: series.education.len(),
            energy_count: series.energy.len(),
            correlation_threshold: self.correlation_threshold,
        });

        let confidence = confidence(&correlations);

        Ok(WardAnalysis {
            ward: ward.to_string(),
            correlations,
            recommendations,
            confidence,
            error: None,
        })
    }
}

/// Correlates one pair of the ward analysis, or returns `None` when the pair
/// does not have enough aligned data to be meaningful.
fn correlate_pair(
    pair: CorrelationPair,
    x: &[f64],
    y: &[f64],
) -> Result<Option<PairwiseCorrelation>, AnalysisError> {
    if x.len() < stats::MIN_POINTS || y.len() < stats::MIN_POINTS {
        log::debug!(
            "Skipping {pair}: {} and {} points, need at least {}",
            x.len(),
            y.len(),
            stats::MIN_POINTS
        );
        return Ok(None);
    }
    if x.len() != y.len() {
        log::debug!("Skipping {pair}: series not aligned ({} vs {})", x.len(), y.len());
        return Ok(None);
    }

    let result = stats::pearson(x, y)?;
    Ok(Some(PairwiseCorrelation {
        coefficient: result.coefficient,
        p_value: result.p_value,
    }))
}

/// Mean absolute coefficient over the computed pairs, capped at 1.0.
#[allow(clippy::cast_precision_loss)]
fn confidence(correlations: &BTreeMap<CorrelationPair, PairwiseCorrelation>) -> f64 {
    if correlations.is_empty() {
        return 0.0;
    }
    let total: f64 = correlations.values().map(|c| c.coefficient.abs()).sum();
    (total / correlations.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_insights_analysis_models::{ActionTarget, AnalysisErrorKind};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn series(environment: &[f64], education: &[f64], energy: &[f64]) -> WardSeries {
        WardSeries {
            environment: environment.to_vec(),
            education: education.to_vec(),
            energy: energy.to_vec(),
        }
    }

    fn targets(analysis: &WardAnalysis) -> Vec<ActionTarget> {
        analysis.recommendations.iter().map(|a| a.target).collect()
    }

    #[test]
    fn ward_with_environment_and_education_only() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardA",
            &series(&[100.0, 120.0, 80.0], &[70.0, 65.0, 85.0], &[]),
        );

        assert!(analysis.is_success());
        assert_eq!(analysis.ward, "WardA");
        assert!(
            analysis
                .correlations
                .contains_key(&CorrelationPair::EnvironmentEducation)
        );
        assert!(
            !analysis
                .correlations
                .contains_key(&CorrelationPair::EnergyEnvironment)
        );

        let targets = targets(&analysis);
        assert!(targets.contains(&ActionTarget::Education));
        assert!(targets.contains(&ActionTarget::Environment));
        assert!(!targets.contains(&ActionTarget::Energy));
    }

    #[test]
    fn offset_environment_series_is_not_constant() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardC",
            &series(&[1e8, 1e8 + 1.0, 1e8 + 3.0], &[1.0, 2.0, 3.0], &[]),
        );

        assert!(analysis.is_success(), "{:?}", analysis.error);
        let pair = &analysis.correlations[&CorrelationPair::EnvironmentEducation];
        assert!(pair.coefficient > 0.98, "coefficient was {}", pair.coefficient);
        assert!(targets(&analysis).contains(&ActionTarget::Environment));

        let result = analyzer
            .correlate(&[1e8, 1e8 + 1.0, 1e8 + 3.0], &[1.0, 2.0, 3.0])
            .unwrap();
        assert!(close(result.coefficient, pair.coefficient));
        assert!(close(result.r_squared, result.coefficient.powi(2)));
    }

    #[test]
    fn strongly_negative_ward_gets_combined_action_first() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardA",
            &series(&[100.0, 120.0, 80.0], &[70.0, 65.0, 85.0], &[]),
        );
        assert_eq!(analysis.recommendations[0].target, ActionTarget::Schools);
    }

    #[test]
    fn confidence_is_mean_absolute_coefficient() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardB",
            &series(
                &[100.0, 120.0, 80.0, 90.0],
                &[70.0, 65.0, 85.0, 60.0],
                &[10.0, 30.0, 20.0, 50.0],
            ),
        );

        assert_eq!(analysis.correlations.len(), 2);
        let expected = analysis
            .correlations
            .values()
            .map(|c| c.coefficient.abs())
            .sum::<f64>()
            / 2.0;
        assert!(close(analysis.confidence, expected));
        assert!(analysis.confidence <= 1.0);
    }

    #[test]
    fn confidence_is_zero_without_correlations() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze("WardC", &series(&[100.0], &[70.0], &[]));

        assert!(analysis.is_success());
        assert!(analysis.correlations.is_empty());
        assert!(close(analysis.confidence, 0.0));
    }

    #[test]
    fn misaligned_series_are_omitted() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardD",
            &series(&[100.0, 120.0, 80.0], &[70.0, 65.0], &[10.0, 20.0, 30.0]),
        );

        assert!(analysis.is_success());
        assert!(
            !analysis
                .correlations
                .contains_key(&CorrelationPair::EnvironmentEducation)
        );
        assert!(
            analysis
                .correlations
                .contains_key(&CorrelationPair::EnergyEnvironment)
        );
    }

    #[test]
    fn empty_ward_still_recommends_tree_planting() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze("WardE", &WardSeries::default());

        assert_eq!(targets(&analysis), vec![ActionTarget::Environment]);
    }

    #[test]
    fn energy_and_curriculum_actions_follow_data_presence() {
        let analyzer = CorrelationAnalyzer::default();

        let with_energy = analyzer.analyze("W", &series(&[], &[], &[12.0]));
        assert!(targets(&with_energy).contains(&ActionTarget::Energy));
        assert!(!targets(&with_energy).contains(&ActionTarget::Education));

        let with_schools = analyzer.analyze("W", &series(&[], &[55.0], &[]));
        assert!(!targets(&with_schools).contains(&ActionTarget::Energy));
        assert!(targets(&with_schools).contains(&ActionTarget::Education));
    }

    #[test]
    fn numerical_failure_is_reported_in_band() {
        let analyzer = CorrelationAnalyzer::default();
        let analysis = analyzer.analyze(
            "WardF",
            &series(&[100.0, 100.0, 100.0], &[70.0, 65.0, 85.0], &[]),
        );

        let error = analysis.error.as_ref().unwrap();
        assert_eq!(error.kind, AnalysisErrorKind::NumericalFailure);
        assert!(analysis.correlations.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(close(analysis.confidence, 0.0));
    }

    #[test]
    fn correlate_fits_and_interprets() {
        let analyzer = CorrelationAnalyzer::default();
        let result = analyzer
            .correlate(&[50.0, 100.0, 150.0, 200.0], &[90.0, 80.0, 70.0, 60.0])
            .unwrap();

        assert!(close(result.coefficient, -1.0));
        assert!(close(result.slope, -0.2));
        assert!(close(result.intercept, 100.0));
        assert!(close(result.r_squared, 1.0));
        assert_eq!(result.interpretation, Interpretation::Strong);
        assert_eq!(
            result.recommendation,
            TrendAssessment::StrengthenEducation.message()
        );
    }

    #[test]
    fn correlate_rejects_contract_violations() {
        let analyzer = CorrelationAnalyzer::default();
        assert_eq!(
            analyzer.correlate(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err().kind(),
            AnalysisErrorKind::MismatchedLengths
        );
        assert_eq!(
            analyzer.correlate(&[1.0], &[2.0]).unwrap_err().kind(),
            AnalysisErrorKind::InsufficientData
        );
        assert_eq!(
            analyzer.correlate(&[], &[]).unwrap_err().kind(),
            AnalysisErrorKind::InsufficientData
        );
    }

    #[test]
    fn weak_correlation_asks_for_investigation() {
        let analyzer = CorrelationAnalyzer::default();
        let result = analyzer
            .correlate(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 2.0])
            .unwrap();

        assert!(result.coefficient.abs() < 0.5, "r = {}", result.coefficient);
        assert_eq!(
            result.recommendation,
            TrendAssessment::InvestigateFurther.message()
        );
    }
}
