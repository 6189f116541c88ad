//! Content analysis: text signals for the quality scorer.

use std::collections::HashSet;

use super::types::ContentAnalysis;

/// Overlap above which an answer counts as addressing the question.
pub const ADDRESSES_QUESTION_RATIO: f64 = 0.3;

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "could", "does", "doesn't", "from",
    "have", "having", "into", "just", "like", "make", "many", "more", "most", "much", "only",
    "other", "over", "should", "some", "such", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "very", "want", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your", "anyone", "help", "please", "thanks",
];

const EVIDENCE_PHRASES: &[&str] = &[
    "according to",
    "research",
    "study",
    "studies",
    "evidence",
    "veterinarian",
    "vet recommends",
    "my vet",
    "published",
    "journal",
    "source:",
    "guidelines",
    "clinical",
];

const EXPERIENCE_PHRASES: &[&str] = &[
    "in my experience",
    "my dog",
    "my pup",
    "our dog",
    "i have",
    "i've",
    "when i",
    "we tried",
    "worked for us",
    "worked for me",
    "i trained",
    "i adopted",
];

const ACTIONABLE_PHRASES: &[&str] = &[
    "you should",
    "try ",
    "make sure",
    "i recommend",
    "recommend",
    "start by",
    "step ",
    "avoid",
    "consider",
    "use a",
    "don't",
    "first,",
];

/// Lowercased alphanumeric tokens of `text`.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Distinct words that carry meaning: longer than three characters and not
/// a stop word.
pub fn significant_words(text: &str) -> HashSet<String> {
    tokens(text)
        .filter(|t| t.chars().count() > 3 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Words in the answer: whitespace-separated chunks containing a letter or digit.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// Bullets, numbered steps, or markdown headings.
pub fn has_structure(text: &str) -> bool {
    text.lines().map(str::trim_start).any(|line| {
        if line.starts_with("- ") || line.starts_with("* ") || line.starts_with('•') {
            return true;
        }
        if line.starts_with('#') {
            return true;
        }
        let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
        !digits.is_empty() && matches!(line[digits.len()..].chars().next(), Some('.') | Some(')'))
    })
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| haystack.contains(p))
}

/// Share of the question's significant words that appear in the answer.
pub fn question_overlap(answer: &str, question_title: &str, question_content: &str) -> f64 {
    let question: HashSet<String> = significant_words(question_title)
        .into_iter()
        .chain(significant_words(question_content))
        .collect();
    if question.is_empty() {
        return 0.0;
    }
    let answer_words: HashSet<String> = tokens(answer).collect();
    let hits = question.iter().filter(|w| answer_words.contains(*w)).count();
    hits as f64 / question.len() as f64
}

/// Analyze an answer against its question.
pub fn analyze_content(answer: &str, question_title: &str, question_content: &str) -> ContentAnalysis {
    let lower = answer.to_lowercase();
    let overlap = question_overlap(answer, question_title, question_content);

    ContentAnalysis {
        word_count: word_count(answer),
        has_structure: has_structure(answer),
        has_evidence: contains_any(&lower, EVIDENCE_PHRASES),
        has_personal_experience: contains_any(&lower, EXPERIENCE_PHRASES),
        has_actionable_advice: contains_any(&lower, ACTIONABLE_PHRASES),
        question_overlap: overlap,
        addresses_question: overlap > ADDRESSES_QUESTION_RATIO,
    }
}
