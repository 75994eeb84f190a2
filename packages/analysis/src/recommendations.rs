//! Green action recommendations for the multi-factor ward analysis.
//!
//! Rules are applied in a fixed order, so the output order is also the
//! priority order. Tree planting is always recommended.

use std::collections::BTreeMap;

use ward_insights_analysis_models::{
    ActionTarget, CorrelationPair, ImpactLevel, PairwiseCorrelation, RecommendedAction,
};

/// Environment/education coefficient below which clean air is read as
/// coexisting with weak schools.
pub const NEGATIVE_ENV_EDU_CUTOFF: f64 = -0.5;

/// Inputs the recommendation rules look at.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInputs<'a> {
    /// Ward name, used in descriptions.
    pub ward: &'a str,
    /// Correlations computed for the ward.
    pub correlations: &'a BTreeMap<CorrelationPair, PairwiseCorrelation>,
    /// Number of school records supplied.
    pub school_count: usize,
    /// Number of energy records supplied.
    pub energy_count: usize,
    /// Minimum `|r|` before the environment/education rule applies.
    pub correlation_threshold: f64,
}

/// Builds the prioritized list of recommended actions for a ward.
#[must_use]
pub fn generate(inputs: &RecommendationInputs<'_>) -> Vec<RecommendedAction> {
    let ward = inputs.ward;
    let mut actions = Vec::new();

    let env_edu = inputs
        .correlations
        .get(&CorrelationPair::EnvironmentEducation)
        .map_or(0.0, |c| c.coefficient);

    if env_edu.abs() > inputs.correlation_threshold && env_edu < NEGATIVE_ENV_EDU_CUTOFF {
        actions.push(RecommendedAction {
            action: "Combine environment with education".to_string(),
            description: format!(
                "{ward} has a good environment but weak education results. \
                 Create environmental courses in local schools."
            ),
            impact: ImpactLevel::High,
            target: ActionTarget::Schools,
            estimated_effect: None,
        });
    }

    if inputs.energy_count > 0 {
        actions.push(RecommendedAction {
            action: "Increase renewable energy".to_string(),
            description: format!(
                "Install 5-10 solar installations on schools and public buildings in {ward}"
            ),
            impact: ImpactLevel::Medium,
            target: ActionTarget::Energy,
            estimated_effect: None,
        });
    }

    if inputs.school_count > 0 {
        let courses = (inputs.school_count / 2).max(1);
        let schools = inputs.school_count;
        actions.push(RecommendedAction {
            action: "Create green curriculum".to_string(),
            description: format!(
                "Open {courses} environmental protection courses for {schools} schools"
            ),
            impact: ImpactLevel::High,
            target: ActionTarget::Education,
            estimated_effect: None,
        });
    }

    actions.push(RecommendedAction {
        action: "Plant trees".to_string(),
        description: format!("Plant 500-1000 trees in {ward} to improve air quality"),
        impact: ImpactLevel::High,
        target: ActionTarget::Environment,
        estimated_effect: Some("50-100 tonnes CO2/year".to_string()),
    });

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlations(env_edu: Option<f64>) -> BTreeMap<CorrelationPair, PairwiseCorrelation> {
        env_edu
            .map(|coefficient| {
                (
                    CorrelationPair::EnvironmentEducation,
                    PairwiseCorrelation {
                        coefficient,
                        p_value: 0.1,
                    },
                )
            })
            .into_iter()
            .collect()
    }

    fn targets(actions: &[RecommendedAction]) -> Vec<ActionTarget> {
        actions.iter().map(|a| a.target).collect()
    }

    #[test]
    fn tree_planting_is_always_last_and_present() {
        let corr = correlations(None);
        let actions = generate(&RecommendationInputs {
            ward: "Ward 7",
            correlations: &corr,
            school_count: 0,
            energy_count: 0,
            correlation_threshold: 0.5,
        });
        assert_eq!(targets(&actions), vec![ActionTarget::Environment]);
        assert_eq!(
            actions[0].estimated_effect.as_deref(),
            Some("50-100 tonnes CO2/year")
        );
        assert!(actions[0].description.contains("Ward 7"));
    }

    #[test]
    fn all_rules_fire_in_priority_order() {
        let corr = correlations(Some(-0.9));
        let actions = generate(&RecommendationInputs {
            ward: "Ward 1",
            correlations: &corr,
            school_count: 4,
            energy_count: 3,
            correlation_threshold: 0.5,
        });
        assert_eq!(
            targets(&actions),
            vec![
                ActionTarget::Schools,
                ActionTarget::Energy,
                ActionTarget::Education,
                ActionTarget::Environment,
            ]
        );
        assert_eq!(actions[1].impact, ImpactLevel::Medium);
    }

    #[test]
    fn positive_correlation_does_not_trigger_combined_action() {
        let corr = correlations(Some(0.9));
        let actions = generate(&RecommendationInputs {
            ward: "Ward 1",
            correlations: &corr,
            school_count: 0,
            energy_count: 0,
            correlation_threshold: 0.5,
        });
        assert!(!targets(&actions).contains(&ActionTarget::Schools));
    }

    #[test]
    fn threshold_gates_combined_action() {
        let corr = correlations(Some(-0.6));
        let actions = generate(&RecommendationInputs {
            ward: "Ward 1",
            correlations: &corr,
            school_count: 0,
            energy_count: 0,
            correlation_threshold: 0.8,
        });
        assert!(!targets(&actions).contains(&ActionTarget::Schools));
    }

    #[test]
    fn course_count_is_half_the_schools_but_at_least_one() {
        let corr = correlations(None);
        for (schools, courses) in [(1, 1), (2, 1), (5, 2), (10, 5)] {
            let actions = generate(&RecommendationInputs {
                ward: "Ward 1",
                correlations: &corr,
                school_count: schools,
                energy_count: 0,
                correlation_threshold: 0.5,
            });
            let curriculum = &actions[0];
            assert_eq!(curriculum.target, ActionTarget::Education);
            assert!(
                curriculum
                    .description
                    .starts_with(&format!("Open {courses} ")),
                "{schools} schools: {}",
                curriculum.description
            );
        }
    }
}
