//! Projection of records and classification outcomes into label-keyed rows
//! for the external append-only log.
//!
//! The durable log is keyed by the human-facing labels, not internal ids, so
//! projection runs the field registry's reverse lookup. Unmapped columns are
//! left empty and unmapped record fields are dropped silently; the log
//! transport itself (spreadsheet, file, ...) is out of scope here.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::fields::FieldRegistry;
use crate::flows::FlowRegistry;
use crate::record::{FieldValue, PatientRecord};

/// Header of the timestamp column that leads every log row.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// One flow's outcome in the form the log sheet stores it.
#[derive(Debug, Clone)]
pub struct LoggedAssessment {
    pub flow_name: String,
    pub risk_level: String,
    pub reason: String,
    pub recommendation: String,
}

/// Header row for the raw-input log: timestamp plus every field label in
/// registry order.
pub fn form_columns(fields: &FieldRegistry) -> Vec<String> {
    let mut cols = Vec::with_capacity(fields.defs().len() + 1);
    cols.push(TIMESTAMP_COLUMN.to_string());
    cols.extend(fields.defs().iter().map(|d| d.label.clone()));
    cols
}

/// Header row for the results log: the form columns, then four columns per
/// flow in canonical order, then model name and logged timestamp.
pub fn result_columns(fields: &FieldRegistry, flows: &FlowRegistry) -> Vec<String> {
    let mut cols = form_columns(fields);
    for flow in flows.all() {
        cols.push(format!("{}_flow_name", flow.name));
        cols.push(format!("{}_risk_level", flow.name));
        cols.push(format!("{}_reason", flow.name));
        cols.push(format!("{}_recommendation", flow.name));
    }
    cols.push("model_name".to_string());
    cols.push("logged_timestamp".to_string());
    cols
}

/// Project a raw record into a row aligned with [`form_columns`].
pub fn project_raw(
    record: &PatientRecord,
    fields: &FieldRegistry,
    timestamp: DateTime<Utc>,
) -> Vec<Option<String>> {
    let mut row = Vec::with_capacity(fields.defs().len() + 1);
    row.push(Some(
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    ));
    for def in fields.defs() {
        row.push(record.get(&def.id).and_then(cell_value));
    }
    row
}

/// Project a record plus its per-flow outcomes into a row aligned with
/// [`result_columns`]. `results` must already be in canonical flow order.
pub fn project_with_results(
    record: &PatientRecord,
    fields: &FieldRegistry,
    results: &[LoggedAssessment],
    model: &str,
    timestamp: DateTime<Utc>,
) -> Vec<Option<String>> {
    let mut row = project_raw(record, fields, timestamp);
    for outcome in results {
        row.push(Some(outcome.flow_name.clone()));
        row.push(Some(outcome.risk_level.clone()));
        row.push(Some(outcome.reason.clone()));
        row.push(Some(outcome.recommendation.clone()));
    }
    row.push(Some(model.to_string()));
    row.push(Some(
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    ));
    row
}

/// Log cells keep raw values: absent and NaN stay empty rather than
/// rendering the "not specified" placeholder used in prompts.
fn cell_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Absent => None,
        FieldValue::Number(n) if n.is_nan() => None,
        other => Some(other.render()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn sample_record() -> PatientRecord {
        let mut rec = PatientRecord::new();
        rec.insert("age", FieldValue::Number(30.0));
        rec.insert("gender", FieldValue::Text("หญิง".into()));
        rec.insert(
            "food_types",
            FieldValue::List(vec!["โจ๊ก".into(), "ซุป".into()]),
        );
        rec.insert("wearable_id", FieldValue::Text("w-123".into()));
        rec
    }

    #[test]
    fn form_columns_lead_with_timestamp() {
        let fields = FieldRegistry::builtin();
        let cols = form_columns(&fields);
        assert_eq!(cols[0], TIMESTAMP_COLUMN);
        assert_eq!(cols.len(), fields.defs().len() + 1);
        assert_eq!(cols[1], "อายุ");
    }

    #[test]
    fn raw_projection_aligns_with_header() {
        let fields = FieldRegistry::builtin();
        let cols = form_columns(&fields);
        let row = project_raw(&sample_record(), &fields, ts());
        assert_eq!(row.len(), cols.len());

        let age_idx = cols.iter().position(|c| c == "อายุ").unwrap();
        assert_eq!(row[age_idx].as_deref(), Some("30"));

        let food_idx = cols.iter().position(|c| c == "ประเภทอาหารที่ทาน").unwrap();
        assert_eq!(row[food_idx].as_deref(), Some("โจ๊ก, ซุป"));
    }

    #[test]
    fn unmapped_record_fields_dropped_silently() {
        let fields = FieldRegistry::builtin();
        let row = project_raw(&sample_record(), &fields, ts());
        assert!(
            row.iter()
                .flatten()
                .all(|cell| !cell.contains("w-123")),
            "unregistered field leaked into the log row"
        );
    }

    #[test]
    fn missing_fields_leave_cells_empty() {
        let fields = FieldRegistry::builtin();
        let cols = form_columns(&fields);
        let row = project_raw(&sample_record(), &fields, ts());
        let hn_idx = cols.iter().position(|c| c == "HN").unwrap();
        assert_eq!(row[hn_idx], None);
    }

    #[test]
    fn result_projection_appends_four_cells_per_flow() {
        let fields = FieldRegistry::builtin();
        let flows = FlowRegistry::builtin();
        let cols = result_columns(&fields, &flows);

        let results: Vec<LoggedAssessment> = flows
            .all()
            .map(|f| LoggedAssessment {
                flow_name: f.name.clone(),
                risk_level: "ความเสี่ยงต่ำ".into(),
                reason: "ไม่พบอาการผิดปกติ".into(),
                recommendation: "ดูแลตามคำแนะนำทั่วไป".into(),
            })
            .collect();

        let row = project_with_results(&sample_record(), &fields, &results, "gemini-2.0-flash", ts());
        assert_eq!(row.len(), cols.len());
        assert_eq!(row[row.len() - 2].as_deref(), Some("gemini-2.0-flash"));

        // First flow block sits right after the form columns.
        let base = form_columns(&fields).len();
        assert_eq!(row[base].as_deref(), Some("อาการปวด"));
        assert_eq!(row[base + 1].as_deref(), Some("ความเสี่ยงต่ำ"));
    }
}
