//! Quality scorer: factor computation, weighting, and recommendations.
//!
//! Scoring is a pure function of its inputs. [`score`] never fails: any
//! internal failure is replaced by the neutral fallback so that scoring can
//! never block an answer from being posted.

use crate::error::{ReputationError, Result};

use super::analysis::analyze_content;
use super::types::*;

// ---------------------------------------------------------------------------
// Weights and thresholds
// ---------------------------------------------------------------------------

pub const CONTENT_WEIGHT: f64 = 0.35;
pub const EXPERT_WEIGHT: f64 = 0.25;
pub const ENGAGEMENT_WEIGHT: f64 = 0.20;
pub const TIMELINESS_WEIGHT: f64 = 0.10;
pub const COMPLETENESS_WEIGHT: f64 = 0.10;

/// Factors below this emit a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.6;
pub const MAX_RECOMMENDATIONS: usize = 3;

const MAX_RATING: f64 = 5.0;

pub const FALLBACK_RECOMMENDATION: &str =
    "Quality could not be assessed for this answer; a neutral estimate is shown.";

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// Content quality from the text analysis.
pub fn content_quality(analysis: &ContentAnalysis) -> f64 {
    let mut score: f64 = 0.2;
    score += match analysis.word_count {
        n if n >= 100 => 0.3,
        n if n >= 50 => 0.2,
        n if n >= 20 => 0.1,
        _ => 0.0,
    };
    if analysis.has_structure {
        score += 0.15;
    }
    if analysis.has_evidence {
        score += 0.15;
    }
    if analysis.has_personal_experience {
        score += 0.1;
    }
    if analysis.addresses_question {
        score += 0.1;
    }
    score.min(1.0)
}

/// Author credibility. Unverified authors sit at 0.5; verified experts add
/// half of a weighted sum of verification, specialization, rating, tenure.
pub fn expert_credibility(author: &AuthorCredibility, category: &str) -> f64 {
    if !author.is_verified_expert {
        return 0.5;
    }
    let specialization_match = author
        .specializations
        .iter()
        .any(|s| s.trim().eq_ignore_ascii_case(category.trim()));

    let rating = author.rating_average.unwrap_or(0.0).clamp(0.0, MAX_RATING) / MAX_RATING;
    let tenure = (author.years_experience.unwrap_or(0.0) / 10.0).clamp(0.0, 1.0);

    let specialization = if specialization_match { 1.0 } else { 0.0 };

    let weighted = 0.4 + 0.3 * specialization + 0.2 * rating + 0.1 * tenure;
    (0.5 + 0.5 * weighted).min(1.0)
}

/// Community engagement from votes, best-answer status and response speed.
pub fn community_engagement(engagement: &Engagement) -> f64 {
    let mut score: f64 = 0.5;

    let votes = engagement.upvotes as f64 + engagement.downvotes as f64;
    if votes > 0.0 {
        score += 0.4 * (engagement.upvotes as f64 / votes);
    }
    score += (0.02 * engagement.upvotes as f64).min(0.2);
    if engagement.is_best_answer {
        score += 0.25;
    }
    if let Some(hours) = engagement.response_time_hours {
        score += 0.1 * (1.0 - hours / 24.0).max(0.0);
    }
    if matches!(engagement.answer_position, Some(p) if (1..=3).contains(&p)) {
        score += 0.05;
    }
    score.min(1.0)
}

/// Step function of response latency.
pub fn timeliness(response_time_hours: Option<f64>) -> f64 {
    match response_time_hours {
        None => 0.5,
        Some(h) if h <= 1.0 => 1.0,
        Some(h) if h <= 6.0 => 0.8,
        Some(h) if h <= 24.0 => 0.6,
        Some(h) if h <= 72.0 => 0.4,
        Some(_) => 0.2,
    }
}

pub fn completeness(analysis: &ContentAnalysis) -> f64 {
    let mut score: f64 = 0.4;
    if analysis.word_count >= 100 {
        score += 0.2;
    }
    if analysis.addresses_question {
        score += 0.2;
    }
    if analysis.has_actionable_advice {
        score += 0.2;
    }
    score.min(1.0)
}

/// Weighted overall score, clamped to [0, 1].
pub fn overall(factors: &QualityFactors) -> f64 {
    let score = CONTENT_WEIGHT * factors.content_quality
        + EXPERT_WEIGHT * factors.expert_credibility
        + ENGAGEMENT_WEIGHT * factors.community_engagement
        + TIMELINESS_WEIGHT * factors.timeliness
        + COMPLETENESS_WEIGHT * factors.completeness;
    score.clamp(0.0, 1.0)
}

/// One message per deficient factor, heaviest factor first, at most three.
pub fn recommendations(factors: &QualityFactors) -> Vec<String> {
    let checks = [
        (
            factors.content_quality,
            "Expand the answer with concrete detail, a short list of steps, or a source a vet would recognise.",
        ),
        (
            factors.expert_credibility,
            "Mention relevant experience or credentials so readers know how much weight to give the advice.",
        ),
        (
            factors.community_engagement,
            "Clear formatting and a direct first sentence help the community find and upvote the key point.",
        ),
        (
            factors.timeliness,
            "Faster responses help owners while the problem is still happening.",
        ),
        (
            factors.completeness,
            "Address the question directly and finish with a next step the owner can take.",
        ),
    ];

    checks
        .iter()
        .filter(|(value, _)| *value < RECOMMENDATION_THRESHOLD)
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, message)| message.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_number(name: &str, value: Option<f64>, max: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(ReputationError::ScoringFailure(format!(
                "{name} must be a non-negative number, got {v}"
            )));
        }
        if let Some(max) = max {
            if v > max {
                return Err(ReputationError::ScoringFailure(format!(
                    "{name} must be at most {max}, got {v}"
                )));
            }
        }
    }
    Ok(())
}

fn validate(answer_text: &str, engagement: &Engagement, author: &AuthorCredibility) -> Result<()> {
    if answer_text.trim().is_empty() {
        return Err(ReputationError::ScoringFailure("answer text is empty".into()));
    }
    check_number("response_time_hours", engagement.response_time_hours, None)?;
    check_number("rating_average", author.rating_average, Some(MAX_RATING))?;
    check_number("years_experience", author.years_experience, None)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score an answer, reporting malformed input as `ScoringFailure`.
pub fn try_score(
    answer_text: &str,
    question_title: &str,
    question_content: &str,
    engagement: &Engagement,
    author: &AuthorCredibility,
    category: &str,
) -> Result<QualityScore> {
    validate(answer_text, engagement, author)?;

    let analysis = analyze_content(answer_text, question_title, question_content);
    let factors = QualityFactors {
        content_quality: content_quality(&analysis),
        expert_credibility: expert_credibility(author, category),
        community_engagement: community_engagement(engagement),
        timeliness: timeliness(engagement.response_time_hours),
        completeness: completeness(&analysis),
    };

    let overall_score = overall(&factors);
    if !overall_score.is_finite() {
        return Err(ReputationError::ScoringFailure(
            "overall score is not a finite number".into(),
        ));
    }

    Ok(QualityScore {
        overall_score,
        factors,
        recommendations: recommendations(&factors),
        tier: QualityTier::from_score(overall_score),
        is_fallback: false,
    })
}

/// Neutral score used whenever scoring fails.
pub fn fallback_score() -> QualityScore {
    QualityScore {
        overall_score: 0.5,
        factors: QualityFactors::neutral(),
        recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
        tier: QualityTier::Fair,
        is_fallback: true,
    }
}

/// Score an answer. Never fails; malformed input yields [`fallback_score`].
pub fn score(
    answer_text: &str,
    question_title: &str,
    question_content: &str,
    engagement: &Engagement,
    author: &AuthorCredibility,
    category: &str,
) -> QualityScore {
    match try_score(
        answer_text,
        question_title,
        question_content,
        engagement,
        author,
        category,
    ) {
        Ok(score) => score,
        Err(e) => {
            log::warn!("answer scoring fell back to neutral: {e}");
            fallback_score()
        }
    }
}

/// Score a bundled request.
pub fn score_request(request: &ScoreRequest) -> QualityScore {
    score(
        &request.answer_text,
        &request.question_title,
        &request.question_content,
        &request.engagement,
        &request.author,
        &request.category,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
