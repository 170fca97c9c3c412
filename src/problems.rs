use std::fmt;

use serde::Serialize;

/// A quality problem found in a post, with the detector's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProblem {
    /// Some paragraph looks like source code pasted without code markup.
    #[serde(rename = "not_formatted_code")]
    NotFormattedCodeFound { probability: f32 },
}

impl PostProblem {
    pub fn kind(&self) -> &'static str {
        match self {
            PostProblem::NotFormattedCodeFound { .. } => "not_formatted_code",
        }
    }

    pub fn probability(&self) -> f32 {
        match self {
            PostProblem::NotFormattedCodeFound { probability } => *probability,
        }
    }
}

impl fmt::Display for PostProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostProblem::NotFormattedCodeFound { probability } => {
                write!(f, "Potentially not formatted code found (prob: {})", probability)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let p = PostProblem::NotFormattedCodeFound { probability: 0.999 };
        assert_eq!(p.to_string(), "Potentially not formatted code found (prob: 0.999)");
    }

    #[test]
    fn json_shape() {
        let p = PostProblem::NotFormattedCodeFound { probability: 0.5 };
        let v = serde_json::to_value(p).unwrap();
        assert_eq!(v, serde_json::json!({ "kind": "not_formatted_code", "probability": 0.5 }));
        assert_eq!(v["kind"], p.kind());
    }
}
