use serde::Deserialize;

/// A forum post as returned by the forum API. Only `text` feeds the analysis;
/// the rest identifies the post in reports and in the database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub topic_id: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Post {
    pub fn from_text(text: impl Into<String>) -> Self {
        Post {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Post body markup; a missing body reads as empty.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full() {
        let p: Post = serde_json::from_str(
            r#"{"id": 42, "topic_id": 7, "url": "https://forum.example/t/7#42", "text": "<p>hi</p>", "score": 3}"#,
        )
        .unwrap();
        assert_eq!(p.id, 42);
        assert_eq!(p.topic_id, Some(7));
        assert_eq!(p.text(), "<p>hi</p>");
    }

    #[test]
    fn missing_or_null_text_is_empty() {
        let p: Post = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(p.text(), "");
        let p: Post = serde_json::from_str(r#"{"id": 1, "text": null}"#).unwrap();
        assert_eq!(p.text(), "");
    }
}
