use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One harvested paper.
///
/// `url` is the business key downstream; storage backends resolve conflicts on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(
        rename = "abstract_embedding",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding: Option<Vec<f32>>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        authors: impl Into<String>,
        year: impl Into<String>,
        url: impl Into<String>,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            authors: authors.into(),
            year: year.into(),
            url: url.into(),
            abstract_text: abstract_text.into(),
            embedding: None,
        }
    }

    /// Row shape expected by the `Articles` table. The embedding column is
    /// only present once the article has been embedded.
    pub fn to_record(&self) -> Value {
        let mut record = json!({
            "title": self.title,
            "authors": self.authors,
            "year": self.year,
            "url": self.url,
            "abstract": self.abstract_text,
        });
        if let (Some(embedding), Some(map)) = (&self.embedding, record.as_object_mut()) {
            map.insert("abstract_embedding".to_string(), json!(embedding));
        }
        record
    }
}
