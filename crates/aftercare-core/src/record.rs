//! Patient records and their canonical text serialisation.
//!
//! A record is an open, insertion-ordered mapping from field id to value:
//! unregistered ids are allowed and rendered with the raw id as their label.
//! Serialisation produces the exact text block the oracle prompt embeds, so
//! it must be deterministic byte-for-byte for the same record.

use std::path::Path;

use serde_json::Value;

use crate::fields::FieldRegistry;

/// Placeholder rendered for missing, empty, or NaN-like values.
pub const NOT_SPECIFIED: &str = "ไม่ได้ระบุ";

/// One field value as supplied by the questionnaire or an uploaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Absent,
}

impl FieldValue {
    /// Render for the serialised text block.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) if s.trim().is_empty() => NOT_SPECIFIED.to_string(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.is_nan() => NOT_SPECIFIED.to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) if items.is_empty() => NOT_SPECIFIED.to_string(),
            Self::List(items) => items.join(", "),
            Self::Absent => NOT_SPECIFIED.to_string(),
        }
    }

    /// Whether this value contributes a parenthesised description.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Text(s) => !s.trim().is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Number(n) => !n.is_nan(),
            Self::Bool(_) => true,
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            // Nested objects are not questionnaire values; keep them readable.
            Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

/// An open, insertion-ordered patient record. Immutable once handed to the
/// serialiser; discarded after the request or batch completes.
#[derive(Debug, Clone, Default)]
pub struct PatientRecord {
    fields: Vec<(String, FieldValue)>,
}

impl PatientRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any existing value for the same id in place
    /// (the field keeps its original position).
    pub fn insert(&mut self, id: impl Into<String>, value: FieldValue) {
        let id = id.into();
        match self.fields.iter_mut().find(|(k, _)| *k == id) {
            Some((_, v)) => *v = value,
            None => self.fields.push((id, value)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build from a JSON object, e.g. the body of a classify request.
    pub fn from_json_object(map: &serde_json::Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in map {
            record.insert(key.clone(), FieldValue::from(value));
        }
        record
    }
}

impl FromIterator<(String, FieldValue)> for PatientRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (id, value) in iter {
            record.insert(id, value);
        }
        record
    }
}

/// Serialise a record into the canonical multi-line text block.
///
/// One `"label: value"` line per non-description field, in record order.
/// A field with a registered description field absorbs the description's
/// value into a parenthesised suffix when it is non-empty; description
/// fields never get standalone lines, and a description whose parent is
/// absent from the record is dropped. Every field is consumed exactly once.
pub fn serialize_record(record: &PatientRecord, fields: &FieldRegistry) -> String {
    let mut lines = Vec::with_capacity(record.len());

    for (id, value) in record.iter() {
        if fields.is_description_field(id) {
            continue;
        }

        let label = fields.label_for(id).unwrap_or(id);
        let rendered = value.render();

        let line = match fields.description_field_of(id) {
            Some(desc_id) => match record.get(desc_id) {
                Some(desc) if desc.is_present() => {
                    let desc_label = fields.description_label(desc_id);
                    format!("{label}: {rendered} ({desc_label}: {})", desc.render())
                }
                _ => format!("{label}: {rendered}"),
            },
            None => format!("{label}: {rendered}"),
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Best-effort dump of the serialised text for prompt debugging. Failures
/// are logged and swallowed; they never affect the returned text.
pub fn dump_serialized(text: &str, path: &Path) {
    if let Err(e) = std::fs::write(path, text) {
        tracing::debug!(path = %path.display(), error = %e, "skipping debug dump");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDef;

    fn swelling_registry() -> FieldRegistry {
        FieldRegistry::new(
            vec![
                FieldDef::new("age", "อายุ"),
                FieldDef::with_description("swelling_status", "อาการบวม", "swelling_description"),
            ],
            vec![("swelling_description", "คำอธิบายเพิ่มเติมสำหรับอาการบวม")],
        )
        .unwrap()
    }

    fn record(pairs: &[(&str, FieldValue)]) -> PatientRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn description_absorbed_into_parent_line() {
        let reg = swelling_registry();
        let rec = record(&[
            ("age", FieldValue::Number(30.0)),
            ("swelling_status", FieldValue::Text("ใช่".into())),
            ("swelling_description", FieldValue::Text("เล็กน้อย".into())),
        ]);

        let text = serialize_record(&rec, &reg);
        assert_eq!(
            text,
            "อายุ: 30\nอาการบวม: ใช่ (คำอธิบายเพิ่มเติมสำหรับอาการบวม: เล็กน้อย)"
        );
    }

    #[test]
    fn empty_description_omits_parenthesis() {
        let reg = swelling_registry();
        let rec = record(&[
            ("swelling_status", FieldValue::Text("ไม่บวม".into())),
            ("swelling_description", FieldValue::Text("".into())),
        ]);

        assert_eq!(serialize_record(&rec, &reg), "อาการบวม: ไม่บวม");
    }

    #[test]
    fn orphan_description_dropped() {
        let reg = swelling_registry();
        let rec = record(&[
            ("age", FieldValue::Number(30.0)),
            ("swelling_description", FieldValue::Text("เล็กน้อย".into())),
        ]);

        // Parent absent: the description never becomes a standalone line.
        assert_eq!(serialize_record(&rec, &reg), "อายุ: 30");
    }

    #[test]
    fn one_line_per_non_description_field() {
        let reg = FieldRegistry::builtin();
        let rec = record(&[
            ("age", FieldValue::Number(25.0)),
            ("gender", FieldValue::Text("หญิง".into())),
            ("fever_status", FieldValue::Text("มีไข้".into())),
            ("fever_description", FieldValue::Text("37.8 องศา".into())),
        ]);

        let text = serialize_record(&rec, &reg);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("อาการไข้: มีไข้ (คำอธิบายเพิ่มเติมสำหรับอาการไข้: 37.8 องศา)"));
    }

    #[test]
    fn missing_and_empty_values_render_placeholder() {
        let reg = FieldRegistry::builtin();
        let rec = record(&[
            ("pain_score", FieldValue::Absent),
            ("other_symptoms", FieldValue::Text("   ".into())),
            ("food_types", FieldValue::List(vec![])),
            ("age", FieldValue::Number(f64::NAN)),
        ]);

        let text = serialize_record(&rec, &reg);
        for line in text.lines() {
            assert!(line.ends_with(NOT_SPECIFIED), "unexpected line: {line}");
        }
    }

    #[test]
    fn list_values_comma_joined() {
        let reg = FieldRegistry::builtin();
        let rec = record(&[(
            "food_types",
            FieldValue::List(vec!["โจ๊ก".into(), "ซุป".into(), "นม".into()]),
        )]);

        assert_eq!(serialize_record(&rec, &reg), "ประเภทอาหารที่ทาน: โจ๊ก, ซุป, นม");
    }

    #[test]
    fn unregistered_field_uses_raw_id_as_label() {
        let reg = swelling_registry();
        let rec = record(&[("blood_type", FieldValue::Text("O".into()))]);
        assert_eq!(serialize_record(&rec, &reg), "blood_type: O");
    }

    #[test]
    fn serialisation_is_idempotent() {
        let reg = FieldRegistry::builtin();
        let rec = record(&[
            ("age", FieldValue::Number(30.0)),
            ("swelling_status", FieldValue::Text("ใช่".into())),
            ("swelling_description", FieldValue::Text("เล็กน้อย".into())),
            ("food_types", FieldValue::List(vec!["โจ๊ก".into()])),
        ]);

        let first = serialize_record(&rec, &reg);
        let second = serialize_record(&rec, &reg);
        assert_eq!(first, second);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut rec = PatientRecord::new();
        rec.insert("age", FieldValue::Number(30.0));
        rec.insert("gender", FieldValue::Text("ชาย".into()));
        rec.insert("age", FieldValue::Number(31.0));

        let ids: Vec<&str> = rec.iter().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["age", "gender"]);
        assert_eq!(rec.get("age"), Some(&FieldValue::Number(31.0)));
    }

    #[test]
    fn dump_writes_text_and_swallows_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serialized.txt");
        dump_serialized("อายุ: 30", &path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "อายุ: 30");

        // A non-writable path must not panic.
        dump_serialized("x", &dir.path().join("missing").join("serialized.txt"));
    }

    #[test]
    fn from_json_object_converts_values() {
        let json: Value = serde_json::json!({
            "age": 30,
            "swelling_status": "ใช่",
            "food_types": ["โจ๊ก", "ซุป"],
            "additional_questions": null,
        });
        let rec = PatientRecord::from_json_object(json.as_object().unwrap());

        assert_eq!(rec.get("age"), Some(&FieldValue::Number(30.0)));
        assert_eq!(
            rec.get("food_types"),
            Some(&FieldValue::List(vec!["โจ๊ก".into(), "ซุป".into()]))
        );
        assert_eq!(rec.get("additional_questions"), Some(&FieldValue::Absent));
    }
}
