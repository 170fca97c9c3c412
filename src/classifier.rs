use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifierError;
use crate::settings::ClassifierSettings;

/// Label the classifier gives to paragraphs that look like code.
pub const CODE_LABEL: &str = "code";
const CODE_CLASS: usize = 1;

/// Output of one classifier call: the winning label and one score per class
/// (index 0 = not code, index 1 = code).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    pub label: String,
    pub scores: Vec<f32>,
}

impl Prediction {
    pub fn new(label: impl Into<String>, scores: Vec<f32>) -> Self {
        Prediction {
            label: label.into(),
            scores,
        }
    }

    pub fn is_code(&self) -> bool {
        self.label == CODE_LABEL
    }

    pub fn code_score(&self) -> Result<f32, ClassifierError> {
        self.scores
            .get(CODE_CLASS)
            .copied()
            .ok_or(ClassifierError::MalformedPrediction(self.scores.len()))
    }
}

/// A binary "code / not code" text classifier.
///
/// Implementations are not assumed to be thread-safe; concurrent callers give
/// each worker its own instance.
pub trait CodeClassifier {
    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError>;
}

impl<C: CodeClassifier + ?Sized> CodeClassifier for &C {
    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        (**self).predict(text)
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

/// Classifier served by an HTTP inference endpoint: `POST {"text": ...}`
/// answered with a JSON [`Prediction`].
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(HttpClassifier {
            client,
            endpoint: settings.url.clone(),
        })
    }
}

impl CodeClassifier for HttpClassifier {
    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PredictRequest { text })
            .send()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let prediction: Prediction = response
            .json()
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;
        debug!(label = %prediction.label, scores = ?prediction.scores, chars = text.len(), "paragraph classified");
        Ok(prediction)
    }
}

// ── Tests ──
