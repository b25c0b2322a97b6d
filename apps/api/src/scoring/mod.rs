//! Submission scoring: five weighted criteria, an approval threshold, and a
//! tier cut. The canonical score scale is [0,1] everywhere in the system;
//! raw oracle output is clamped into that range at this boundary.

pub mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::idea::IdeaTier;

pub const APPROVAL_THRESHOLD: f64 = 0.70;
pub const PREMIUM_THRESHOLD: f64 = 0.80;
const FEEDBACK_THRESHOLD: f64 = 0.70;

const WEIGHT_MARKET: f64 = 0.30;
const WEIGHT_FEASIBILITY: f64 = 0.25;
const WEIGHT_INNOVATION: f64 = 0.25;
const WEIGHT_CLARITY: f64 = 0.10;
const WEIGHT_ACTIONABILITY: f64 = 0.10;

/// The five criteria, each in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CriteriaScores {
    pub market_potential: f64,
    pub technical_feasibility: f64,
    pub innovation: f64,
    pub clarity: f64,
    pub actionability: f64,
}

impl CriteriaScores {
    /// Clamps every criterion into [0,1].
    pub fn clamped(self) -> Self {
        Self {
            market_potential: self.market_potential.clamp(0.0, 1.0),
            technical_feasibility: self.technical_feasibility.clamp(0.0, 1.0),
            innovation: self.innovation.clamp(0.0, 1.0),
            clarity: self.clarity.clamp(0.0, 1.0),
            actionability: self.actionability.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringResult {
    pub scores: CriteriaScores,
    pub overall_score: f64,
    pub tier: IdeaTier,
    pub feedback: Vec<String>,
    pub approved: bool,
}

/// The submission fields the oracle evaluates.
#[derive(Debug, Clone)]
pub struct IdeaSubmission {
    pub title: String,
    pub teaser_description: String,
    pub full_description: String,
    pub category: String,
}

/// The scoring seam. `AppState` holds an `Arc<dyn IdeaScorer>`, so the
/// LLM-backed scorer can be swapped without touching the job or handlers.
#[async_trait]
pub trait IdeaScorer: Send + Sync {
    async fn score(&self, submission: &IdeaSubmission) -> Result<ScoringResult, AppError>;
}

/// Weighted overall score, rounded to 2 decimal places.
pub fn overall_score(scores: &CriteriaScores) -> f64 {
    let weighted = scores.market_potential * WEIGHT_MARKET
        + scores.technical_feasibility * WEIGHT_FEASIBILITY
        + scores.innovation * WEIGHT_INNOVATION
        + scores.clarity * WEIGHT_CLARITY
        + scores.actionability * WEIGHT_ACTIONABILITY;
    (weighted * 100.0).round() / 100.0
}

/// Turns raw criterion scores into the full scoring verdict.
pub fn evaluate(raw: CriteriaScores) -> ScoringResult {
    let scores = raw.clamped();
    let overall = overall_score(&scores);
    let tier = if overall >= PREMIUM_THRESHOLD {
        IdeaTier::Premium
    } else {
        IdeaTier::Regular
    };
    ScoringResult {
        scores,
        overall_score: overall,
        tier,
        feedback: generate_feedback(&scores),
        approved: overall >= APPROVAL_THRESHOLD,
    }
}

/// One feedback line per criterion under the threshold.
fn generate_feedback(scores: &CriteriaScores) -> Vec<String> {
    let mut feedback = Vec::new();

    if scores.market_potential < FEEDBACK_THRESHOLD {
        feedback.push(
            "Market Potential: expand on the target market size, revenue potential, and \
             evidence of demand."
                .to_string(),
        );
    }
    if scores.technical_feasibility < FEEDBACK_THRESHOLD {
        feedback.push(
            "Technical Feasibility: clarify the technical approach and implementation \
             complexity; consider simplifying complex features."
                .to_string(),
        );
    }
    if scores.innovation < FEEDBACK_THRESHOLD {
        feedback.push(
            "Innovation: highlight what makes this idea unique compared to existing \
             solutions."
                .to_string(),
        );
    }
    if scores.clarity < FEEDBACK_THRESHOLD {
        feedback.push(
            "Clarity: make the problem statement and solution more specific; provide \
             concrete examples."
                .to_string(),
        );
    }
    if scores.actionability < FEEDBACK_THRESHOLD {
        feedback.push(
            "Actionability: outline concrete steps, features, or use cases so someone \
             could start building."
                .to_string(),
        );
    }

    if feedback.is_empty() {
        feedback.push("Great job! Your idea meets all quality criteria.".to_string());
    }
    feedback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: f64) -> CriteriaScores {
        CriteriaScores {
            market_potential: v,
            technical_feasibility: v,
            innovation: v,
            clarity: v,
            actionability: v,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = WEIGHT_MARKET
            + WEIGHT_FEASIBILITY
            + WEIGHT_INNOVATION
            + WEIGHT_CLARITY
            + WEIGHT_ACTIONABILITY;
        assert!((total - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overall_score_weighted() {
        // 0.92*0.30 + 0.84*0.25 + 0.76*0.25 + 0.60*0.10 + 0.48*0.10 = 0.784 -> 0.78
        let scores = CriteriaScores {
            market_potential: 0.92,
            technical_feasibility: 0.84,
            innovation: 0.76,
            clarity: 0.60,
            actionability: 0.48,
        };
        assert!((overall_score(&scores) - 0.78).abs() < 1e-9);
    }

    #[test]
    fn test_approval_threshold() {
        assert!(evaluate(uniform(0.70)).approved);
        assert!(!evaluate(uniform(0.69)).approved);
    }

    #[test]
    fn test_premium_tier_cut() {
        assert_eq!(evaluate(uniform(0.80)).tier, IdeaTier::Premium);
        assert_eq!(evaluate(uniform(0.79)).tier, IdeaTier::Regular);
    }

    #[test]
    fn test_scores_clamped_to_unit_interval() {
        let result = evaluate(CriteriaScores {
            market_potential: 1.7,
            technical_feasibility: -0.2,
            innovation: 0.5,
            clarity: 0.5,
            actionability: 0.5,
        });
        assert_eq!(result.scores.market_potential, 1.0);
        assert_eq!(result.scores.technical_feasibility, 0.0);
    }

    #[test]
    fn test_feedback_targets_weak_criteria() {
        let result = evaluate(CriteriaScores {
            market_potential: 0.4,
            technical_feasibility: 0.9,
            innovation: 0.9,
            clarity: 0.9,
            actionability: 0.9,
        });
        assert_eq!(result.feedback.len(), 1);
        assert!(result.feedback[0].starts_with("Market Potential"));
    }

    #[test]
    fn test_feedback_positive_when_all_strong() {
        let result = evaluate(uniform(0.9));
        assert_eq!(result.feedback.len(), 1);
        assert!(result.feedback[0].contains("Great job"));
    }
}
