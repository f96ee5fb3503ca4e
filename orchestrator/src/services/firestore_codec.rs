//! Firestore REST typed values and their mapping to `ImageRecord`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{Color, ImageRecord, Metadata};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Fields the pipeline owns in the mutable variant, as update-mask paths
pub const OWNED_FIELD_PATHS: &[&str] = &[
    "imageDescription",
    "textEmbeddings",
    "imageEmbeddings",
    "metadata.labels",
    "metadata.colors",
];

/// A Firestore value in its JSON wire form, e.g. `{"stringValue": "x"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// int64 values travel as decimal strings
    #[serde(rename = "integerValue")]
    Integer(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "bytesValue")]
    Bytes(String),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "geoPointValue")]
    GeoPoint(serde_json::Value),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "mapValue")]
    Map(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// A stored document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing)]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing)]
    pub update_time: Option<String>,
}

/// One element of a `runQuery` response stream; progress-only entries carry no document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
}

impl Value {
    fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    fn array(values: Vec<Value>) -> Self {
        Value::Array(ArrayValue { values })
    }

    fn map(fields: BTreeMap<String, Value>) -> Self {
        Value::Map(MapValue { fields })
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => i.parse().ok(),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => i.parse().ok(),
            Value::Double(d) if d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        }
    }

    fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(array) => Some(&array.values),
            _ => None,
        }
    }

    fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(&map.fields),
            _ => None,
        }
    }
}

/// Last path segment of a document name
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Decode a stored document into a record
///
/// Missing fields take their defaults; a field present with the wrong type
/// is a decode error.
pub fn decode_record(document: &Document) -> OrchestratorResult<ImageRecord> {
    let id = document_id(&document.name).to_string();
    if id.is_empty() {
        return Err(OrchestratorError::RecordDecode {
            id: document.name.clone(),
            message: "document has no name".to_string(),
        });
    }
    let reader = FieldReader { id: &id, fields: &document.fields };

    let metadata = match document.fields.get("metadata") {
        None | Some(Value::Null(())) => Metadata::default(),
        Some(value) => {
            let fields = value.as_map().ok_or_else(|| reader.wrong_type("metadata"))?;
            decode_metadata(&FieldReader { id: &id, fields })?
        }
    };

    Ok(ImageRecord {
        bucket: reader.string("bucket")?,
        name: reader.string("imageName")?,
        path: reader.string("imagePath")?,
        url: reader.string("imageUrl")?,
        description: reader.string("imageDescription")?,
        published: reader.boolean("published")?,
        valid: reader.boolean("valid")?,
        time_created: reader.timestamp("timeCreated")?,
        time_updated: reader.timestamp("timeUpdated")?,
        metadata,
        text_embeddings: reader.vector("textEmbeddings")?,
        image_embeddings: reader.vector("imageEmbeddings")?,
        id,
    })
}

fn decode_metadata(reader: &FieldReader<'_>) -> OrchestratorResult<Metadata> {
    let labels = match reader.fields.get("labels") {
        None => Vec::new(),
        Some(value) => value
            .as_array()
            .ok_or_else(|| reader.wrong_type("metadata.labels"))?
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| reader.wrong_type("metadata.labels")))
            .collect::<OrchestratorResult<Vec<_>>>()?,
    };

    let colors = match reader.fields.get("colors") {
        None => Vec::new(),
        Some(value) => value
            .as_array()
            .ok_or_else(|| reader.wrong_type("metadata.colors"))?
            .iter()
            .map(|v| -> OrchestratorResult<Color> {
                let fields = v.as_map().ok_or_else(|| reader.wrong_type("metadata.colors"))?;
                let color = FieldReader { id: reader.id, fields };
                Ok(Color::new(color.string("name")?, color.string("shade")?, color.number("weight")? as f32))
            })
            .collect::<OrchestratorResult<Vec<_>>>()?,
    };

    Ok(Metadata {
        labels,
        colors,
        width: reader.dimension("width")?,
        height: reader.dimension("height")?,
    })
}

struct FieldReader<'a> {
    id: &'a str,
    fields: &'a BTreeMap<String, Value>,
}

impl FieldReader<'_> {
    fn wrong_type(&self, field: &str) -> OrchestratorError {
        OrchestratorError::RecordDecode {
            id: self.id.to_string(),
            message: format!("field {field} has an unexpected type"),
        }
    }

    /// Present and non-null
    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !matches!(v, Value::Null(())))
    }

    fn string(&self, field: &str) -> OrchestratorResult<String> {
        match self.get(field) {
            None => Ok(String::new()),
            Some(v) => v.as_str().map(str::to_string).ok_or_else(|| self.wrong_type(field)),
        }
    }

    fn boolean(&self, field: &str) -> OrchestratorResult<bool> {
        match self.get(field) {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| self.wrong_type(field)),
        }
    }

    fn number(&self, field: &str) -> OrchestratorResult<f64> {
        match self.get(field) {
            None => Ok(0.0),
            Some(v) => v.as_f64().ok_or_else(|| self.wrong_type(field)),
        }
    }

    fn dimension(&self, field: &str) -> OrchestratorResult<Option<u32>> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.wrong_type(field)),
        }
    }

    fn timestamp(&self, field: &str) -> OrchestratorResult<Option<DateTime<Utc>>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Timestamp(raw)) => DateTime::parse_from_rfc3339(raw)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|_| self.wrong_type(field)),
            Some(_) => Err(self.wrong_type(field)),
        }
    }

    fn vector(&self, field: &str) -> OrchestratorResult<Vec<f64>> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(v) => v
                .as_array()
                .ok_or_else(|| self.wrong_type(field))?
                .iter()
                .map(|n| n.as_f64().ok_or_else(|| self.wrong_type(field)))
                .collect(),
        }
    }
}

/// Only the fields named by `OWNED_FIELD_PATHS`
pub fn encode_owned_fields(record: &ImageRecord) -> BTreeMap<String, Value> {
    let labels = record.metadata.labels.iter().map(Value::string).collect();
    let colors = record
        .metadata
        .colors
        .iter()
        .map(|color| {
            Value::map(BTreeMap::from([
                ("name".to_string(), Value::string(&color.name)),
                ("shade".to_string(), Value::string(&color.shade)),
                ("weight".to_string(), Value::Double(f64::from(color.weight))),
            ]))
        })
        .collect();

    BTreeMap::from([
        ("imageDescription".to_string(), Value::string(&record.description)),
        ("textEmbeddings".to_string(), encode_vector(&record.text_embeddings)),
        ("imageEmbeddings".to_string(), encode_vector(&record.image_embeddings)),
        (
            "metadata".to_string(),
            Value::map(BTreeMap::from([
                ("labels".to_string(), Value::array(labels)),
                ("colors".to_string(), Value::array(colors)),
            ])),
        ),
    ])
}

fn encode_vector(values: &[f64]) -> Value {
    Value::array(values.iter().copied().map(Value::Double).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_document() -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/image-data/abc123",
            "fields": {
                "imageId": {"stringValue": "abc123"},
                "bucket": {"stringValue": "imgs"},
                "imageName": {"stringValue": "b.jpg"},
                "imagePath": {"stringValue": "a/b.jpg"},
                "imageUrl": {"stringValue": "https://storage.googleapis.com/imgs/a/b.jpg"},
                "published": {"booleanValue": true},
                "valid": {"booleanValue": true},
                "timeCreated": {"timestampValue": "2024-05-01T10:00:00.123456Z"},
                "metadata": {"mapValue": {"fields": {
                    "width": {"integerValue": "640"},
                    "height": {"integerValue": "480"},
                    "labels": {"arrayValue": {"values": [{"stringValue": "sofa"}]}},
                    "colors": {"arrayValue": {}}
                }}},
                "textEmbeddings": {"arrayValue": {"values": [{"doubleValue": 0.5}, {"integerValue": "1"}]}},
                "imageEmbeddings": {"nullValue": null}
            },
            "createTime": "2024-05-01T10:00:00Z",
            "updateTime": "2024-05-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_stored_document() {
        let record = decode_record(&stored_document()).unwrap();

        assert_eq!(record.id, "abc123");
        assert_eq!(record.bucket, "imgs");
        assert_eq!(record.path, "a/b.jpg");
        assert!(record.published);
        assert_eq!(record.metadata.width, Some(640));
        assert_eq!(record.metadata.labels, vec!["sofa"]);
        assert!(record.metadata.colors.is_empty());
        assert_eq!(record.text_embeddings, vec![0.5, 1.0]);
        assert!(record.image_embeddings.is_empty());
        assert!(record.time_created.is_some());
        assert_eq!(record.time_updated, None);
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_wrong_type_is_decode_error() {
        let mut document = stored_document();
        document.fields.insert("published".to_string(), Value::string("yes"));

        match decode_record(&document) {
            Err(OrchestratorError::RecordDecode { id, message }) => {
                assert_eq!(id, "abc123");
                assert!(message.contains("published"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_owned_fields_decode_back() {
        let mut record = decode_record(&stored_document()).unwrap();
        record.description = "A sofa.".to_string();
        record.metadata.colors = vec![Color::new("brown", "dark", 0.5)];
        record.image_embeddings = vec![0.25; 3];

        let document = Document {
            name: "projects/p/databases/(default)/documents/image-data/abc123".to_string(),
            fields: encode_owned_fields(&record),
            ..Default::default()
        };
        let patched = decode_record(&document).unwrap();

        assert_eq!(patched.description, record.description);
        assert_eq!(patched.metadata.labels, record.metadata.labels);
        assert_eq!(patched.metadata.colors, record.metadata.colors);
        assert_eq!(patched.text_embeddings, record.text_embeddings);
        assert_eq!(patched.image_embeddings, record.image_embeddings);
    }

    #[test]
    fn test_non_array_list_field_is_decode_error() {
        let mut document = stored_document();
        document.fields.insert("textEmbeddings".to_string(), Value::string("0.5,1.0"));
        assert!(matches!(
            decode_record(&document),
            Err(OrchestratorError::RecordDecode { message, .. }) if message.contains("textEmbeddings")
        ));

        let mut document = stored_document();
        document.fields.insert(
            "metadata".to_string(),
            Value::map(BTreeMap::from([("labels".to_string(), Value::string("sofa"))])),
        );
        assert!(matches!(
            decode_record(&document),
            Err(OrchestratorError::RecordDecode { message, .. }) if message.contains("metadata.labels")
        ));

        let mut document = stored_document();
        document.fields.insert(
            "metadata".to_string(),
            Value::map(BTreeMap::from([("colors".to_string(), Value::Boolean(true))])),
        );
        assert!(matches!(
            decode_record(&document),
            Err(OrchestratorError::RecordDecode { message, .. }) if message.contains("metadata.colors")
        ));
    }

    #[test]
    fn test_owned_fields_wire_shape() {
        let record = ImageRecord {
            id: "abc123".to_string(),
            description: "A sofa.".to_string(),
            metadata: Metadata {
                labels: vec!["sofa".to_string()],
                colors: vec![Color::new("brown", "dark", 0.5)],
                ..Default::default()
            },
            text_embeddings: vec![1.0],
            image_embeddings: vec![2.0],
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(encode_owned_fields(&record)).unwrap(),
            json!({
                "imageDescription": {"stringValue": "A sofa."},
                "textEmbeddings": {"arrayValue": {"values": [{"doubleValue": 1.0}]}},
                "imageEmbeddings": {"arrayValue": {"values": [{"doubleValue": 2.0}]}},
                "metadata": {"mapValue": {"fields": {
                    "labels": {"arrayValue": {"values": [{"stringValue": "sofa"}]}},
                    "colors": {"arrayValue": {"values": [{"mapValue": {"fields": {
                        "name": {"stringValue": "brown"},
                        "shade": {"stringValue": "dark"},
                        "weight": {"doubleValue": 0.5}
                    }}}]}}
                }}}
            })
        );
    }

    #[test]
    fn test_document_id_from_name() {
        assert_eq!(document_id("projects/p/databases/(default)/documents/image-data/xyz"), "xyz");
        assert_eq!(document_id("xyz"), "xyz");
    }
}
