//! Data structures for answer quality scoring.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Community engagement counters for one answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub upvotes: u32,
    pub downvotes: u32,
    pub is_best_answer: bool,
    /// Hours between the question being asked and this answer.
    pub response_time_hours: Option<f64>,
    /// 1-based position among the question's answers.
    pub answer_position: Option<u32>,
}

/// What the platform knows about the answer's author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorCredibility {
    pub is_verified_expert: bool,
    /// Categories the expert is verified in (e.g. "training", "nutrition").
    pub specializations: Vec<String>,
    /// Average rating on a 0-5 scale.
    pub rating_average: Option<f64>,
    pub years_experience: Option<f64>,
}

/// Everything needed to score an answer, as one serializable request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRequest {
    pub answer_text: String,
    pub question_title: String,
    pub question_content: String,
    pub engagement: Engagement,
    pub author: AuthorCredibility,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Content analysis
// ---------------------------------------------------------------------------

/// Signals extracted from the answer text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub word_count: usize,
    pub has_structure: bool,
    pub has_evidence: bool,
    pub has_personal_experience: bool,
    pub has_actionable_advice: bool,
    /// Share of the question's significant words found in the answer.
    pub question_overlap: f64,
    pub addresses_question: bool,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Per-factor scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityFactors {
    pub content_quality: f64,
    pub expert_credibility: f64,
    pub community_engagement: f64,
    pub timeliness: f64,
    pub completeness: f64,
}

impl QualityFactors {
    pub fn neutral() -> Self {
        Self {
            content_quality: 0.5,
            expert_credibility: 0.5,
            community_engagement: 0.5,
            timeliness: 0.5,
            completeness: 0.5,
        }
    }
}

/// Quality label derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Poor,
    Fair,
    Good,
    Excellent,
    Outstanding,
}

impl QualityTier {
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            Self::Poor
        } else if score < 0.65 {
            Self::Fair
        } else if score < 0.8 {
            Self::Good
        } else if score < 0.9 {
            Self::Excellent
        } else {
            Self::Outstanding
        }
    }

    /// 0 for poor through 4 for outstanding.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
            Self::Outstanding => "outstanding",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Answer quality score. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall_score: f64,
    pub factors: QualityFactors,
    pub recommendations: Vec<String>,
    pub tier: QualityTier,
    /// Set when the neutral fallback replaced a failed scoring run.
    pub is_fallback: bool,
}
