//! Reshapes raw store records into [`Document`]s.

use serde_json::Value;

use crate::document::Document;
use crate::error::{Result, RetrieverError};
use crate::store::SearchObject;

/// Builds a document from a raw record without touching the record.
///
/// The `text_key` property becomes the page content and every other
/// property is carried over to the metadata unchanged.
pub fn to_document(object: &SearchObject, text_key: &str) -> Result<Document> {
    let mut metadata = object.properties.clone();
    let text = match metadata.remove(text_key) {
        Some(Value::String(text)) => text,
        None | Some(Value::Null) => {
            return Err(RetrieverError::MissingTextField {
                key: text_key.to_string(),
            })
        }
        Some(_) => {
            return Err(RetrieverError::InvalidTextField {
                key: text_key.to_string(),
            })
        }
    };
    Ok(Document::new(text, metadata))
}

/// Maps every record in order; the first bad record fails the batch.
pub fn to_documents(objects: &[SearchObject], text_key: &str) -> Result<Vec<Document>> {
    objects
        .iter()
        .map(|object| to_document(object, text_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> SearchObject {
        SearchObject::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn splits_text_from_metadata() {
        let raw = object(json!({ "text": "hello", "source": "a.pdf", "page": 3, "tags": ["x"] }));
        let doc = to_document(&raw, "text").unwrap();

        assert_eq!(doc.page_content, "hello");
        assert_eq!(
            Value::Object(doc.metadata),
            json!({ "source": "a.pdf", "page": 3, "tags": ["x"] })
        );
        // source record is left intact
        assert_eq!(raw.properties["text"], "hello");
    }

    #[test]
    fn missing_or_null_text_is_an_error() {
        let err = to_document(&object(json!({ "body": "x" })), "text").unwrap_err();
        assert!(matches!(err, RetrieverError::MissingTextField { ref key } if key == "text"));

        let err = to_document(&object(json!({ "text": null })), "text").unwrap_err();
        assert!(matches!(err, RetrieverError::MissingTextField { .. }));
    }

    #[test]
    fn non_string_text_is_an_error() {
        let err = to_document(&object(json!({ "text": 42 })), "text").unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidTextField { .. }));
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let objects = vec![
            object(json!({ "text": "b" })),
            object(json!({ "text": "a" })),
            object(json!({ "text": "b" })),
        ];
        let docs = to_documents(&objects, "text").unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.page_content.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "b"]);
    }
}
