pub mod detect;
pub mod normalize;

use crate::classifier::CodeClassifier;
use crate::error::Result;
use crate::post::Post;
use crate::problems::PostProblem;

/// Runs every post check against one long-lived classifier handle.
pub struct PostAnalyzer<C> {
    code_detector: C,
}

impl<C: CodeClassifier> PostAnalyzer<C> {
    pub fn new(code_detector: C) -> Self {
        PostAnalyzer { code_detector }
    }

    /// Problems found in `post`, in check order. Empty when the post is fine.
    pub fn analyze(&self, post: &Post) -> Result<Vec<PostProblem>> {
        let mut problems = Vec::new();
        if let Some(unformatted) = detect::check_for_unformatted_code(&self.code_detector, post.text())? {
            problems.push(unformatted);
        }
        Ok(problems)
    }
}


// ── Tests ──
