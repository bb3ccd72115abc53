//! Compound sentiment scoring with the VADER lexicon and rule set.
//!
//! VADER weighs every lexicon term, then adjusts for boosters, negation,
//! capitalized emphasis, contrast ("but") and punctuation before squashing
//! the sum into `[-1, 1]`.

use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound polarity of `text` in `[-1, 1]`, rounded to 4 decimals. Text with
/// no scored terms is `0.0`.
pub fn compound(text: &str) -> f64 {
    if !text.chars().any(char::is_alphanumeric) {
        return 0.0;
    }
    let analyzer = SentimentIntensityAnalyzer::new();
    let score = analyzer
        .polarity_scores(text)
        .get("compound")
        .copied()
        .unwrap_or(0.0);
    if !score.is_finite() {
        return 0.0;
    }
    round4(score.clamp(-1.0, 1.0))
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

// ── Tests ──
