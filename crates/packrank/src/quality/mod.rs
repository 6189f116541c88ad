//! Answer quality scoring.
//!
//! The quality module provides:
//! - Content analysis (length, structure, evidence, experience, overlap)
//! - Expert credibility, community engagement, timeliness, completeness
//! - The weighted overall score, tier label, and recommendations
//! - A neutral fallback whenever scoring fails

pub mod analysis;
pub mod engine;
pub mod types;

pub use types::{
    AuthorCredibility, ContentAnalysis, Engagement, QualityFactors, QualityScore, QualityTier,
    ScoreRequest,
};

pub use analysis::analyze_content;
pub use engine::{fallback_score, score, score_request, try_score};
