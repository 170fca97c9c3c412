use super::normalize::paragraphs;
use crate::classifier::CodeClassifier;
use crate::error::Result;
use crate::problems::PostProblem;

/// Minimum code-class score for a paragraph to be reported.
pub const CODE_DETECTOR_THRESHOLD: f64 = 0.995;

/// Classify the post's paragraphs in order and report the first one that looks
/// like unformatted code. Later paragraphs are never sent to the classifier.
pub fn check_for_unformatted_code<C: CodeClassifier>(
    classifier: &C,
    markup: &str,
) -> Result<Option<PostProblem>> {
    for para in paragraphs(markup) {
        let prediction = classifier.predict(&para)?;
        if !prediction.is_code() {
            continue;
        }
        let score = prediction.code_score()?;
        if f64::from(score) > CODE_DETECTOR_THRESHOLD {
            return Ok(Some(PostProblem::NotFormattedCodeFound { probability: score }));
        }
    }
    Ok(None)
}

// ── Tests ──
