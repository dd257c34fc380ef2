//! Field registry: bidirectional mapping between internal field ids and the
//! Thai questionnaire labels shown to patients and nurses.
//!
//! A field may declare an attached free-text description field. Description
//! fields never appear as standalone lines in serialised records; they are
//! absorbed into their parent field's line (see [`crate::record`]).

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;

/// Label used when a description field has no registered label of its own.
pub const GENERIC_DESCRIPTION_LABEL: &str = "เพิ่มเติม";

/// One registered questionnaire field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub id: String,
    pub label: String,
    /// Id of the free-text description field absorbed into this field's
    /// serialised line, if any.
    pub description_field: Option<String>,
}

impl FieldDef {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description_field: None,
        }
    }

    pub fn with_description(id: &str, label: &str, description_field: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description_field: Some(description_field.to_string()),
        }
    }
}

/// Immutable registry of questionnaire fields, built once at startup.
///
/// Both lookup directions are total over registered fields: id → label for
/// serialisation, label → id for the durable-log projection. Uniqueness of
/// ids and labels is enforced at construction; a duplicate label would make
/// the reverse lookup ambiguous and is a [`ConfigError`], never a
/// request-time failure.
#[derive(Debug)]
pub struct FieldRegistry {
    defs: Vec<FieldDef>,
    by_id: HashMap<String, usize>,
    by_label: HashMap<String, usize>,
    description_ids: HashSet<String>,
    description_labels: HashMap<String, String>,
}

impl FieldRegistry {
    /// Build a registry from field definitions plus labels for description
    /// fields. Fails on duplicate ids, duplicate labels, or a description
    /// target that is itself a registered field.
    pub fn new(
        defs: Vec<FieldDef>,
        description_labels: Vec<(&str, &str)>,
    ) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(defs.len());
        let mut by_label = HashMap::with_capacity(defs.len());

        for (idx, def) in defs.iter().enumerate() {
            if by_id.insert(def.id.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateFieldId(def.id.clone()));
            }
            if by_label.insert(def.label.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateFieldLabel(def.label.clone()));
            }
        }

        let mut description_ids = HashSet::new();
        for def in &defs {
            if let Some(desc) = &def.description_field {
                if by_id.contains_key(desc) {
                    return Err(ConfigError::DescriptionCollision {
                        owner: def.id.clone(),
                        desc: desc.clone(),
                    });
                }
                description_ids.insert(desc.clone());
            }
        }

        let description_labels = description_labels
            .into_iter()
            .map(|(id, label)| (id.to_string(), label.to_string()))
            .collect();

        Ok(Self {
            defs,
            by_id,
            by_label,
            description_ids,
            description_labels,
        })
    }

    /// Human-facing label for a field id. `None` for unregistered ids;
    /// callers fall back to the raw id rather than treating this as fatal.
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|&i| self.defs[i].label.as_str())
    }

    /// Reverse lookup: field id for a human-facing label.
    pub fn field_for_label(&self, label: &str) -> Option<&str> {
        self.by_label.get(label).map(|&i| self.defs[i].id.as_str())
    }

    /// Id of the description field absorbed into `id`'s line, if declared.
    pub fn description_field_of(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .and_then(|&i| self.defs[i].description_field.as_deref())
    }

    /// Whether `id` is a description target of some registered field.
    pub fn is_description_field(&self, id: &str) -> bool {
        self.description_ids.contains(id)
    }

    /// Label for a description field, falling back to a generic label.
    pub fn description_label(&self, desc_id: &str) -> &str {
        self.description_labels
            .get(desc_id)
            .map(String::as_str)
            .unwrap_or(GENERIC_DESCRIPTION_LABEL)
    }

    /// Registered fields in declaration order.
    pub fn defs(&self) -> &[FieldDef] {
        &self.defs
    }

    /// The built-in post-operative questionnaire fields.
    pub fn builtin() -> Self {
        Self::new(builtin_defs(), builtin_description_labels())
            .expect("built-in field registry is valid")
    }
}

fn builtin_defs() -> Vec<FieldDef> {
    vec![
        // Basic info
        FieldDef::new("age", "อายุ"),
        FieldDef::new("gender", "เพศ"),
        FieldDef::new("hn", "HN"),
        FieldDef::new("procedures", "หัตถการที่ทำ"),
        FieldDef::new("surgery_date", "ได้รับการผ่าตัดเมื่อวันที่"),
        // Symptoms
        FieldDef::new("pain_score", "ระดับความปวด (Pain score)"),
        FieldDef::new("pain_medication_effective", "ทานยาแก้ปวดแล้วดีขึ้นหรือไม่"),
        FieldDef::with_description("swelling_status", "อาการบวม", "swelling_description"),
        FieldDef::with_description(
            "breathing_or_swallowing_difficulty",
            "มีอาการหายใจลำบาก หรือ กลืนลำบากหรือไม่",
            "breathing_description",
        ),
        FieldDef::with_description(
            "bleeding_status",
            "อาการเลือดซึม หรือ เลือดออก",
            "bleeding_description",
        ),
        FieldDef::with_description("fever_status", "อาการไข้", "fever_description"),
        FieldDef::with_description("numbness_status", "อาการชา", "numbness_description"),
        FieldDef::with_description(
            "phlebitis",
            "บริเวณที่เอาเข็มน้ำเกลือออก",
            "phlebitis_description",
        ),
        FieldDef::with_description("suture_status", "ไหมเย็บแผล", "suture_description"),
        FieldDef::new("other_symptoms", "อาการอื่นๆ"),
        FieldDef::with_description(
            "antibiotic_compliance",
            "รับประทานยาฆ่าเชื้อ",
            "antibiotic_description",
        ),
        FieldDef::new("compress_type", "ประคบเย็น หรือ อุ่นอยู่หรือไม่"),
        FieldDef::new("has_imf", "มีการมัดฟันบนและล่างเข้าด้วยกัน (IMF)"),
        FieldDef::with_description(
            "imf_wire_status",
            "ลวด/ยางมัดฟันแน่นดีหรือไม่",
            "imf_wire_description",
        ),
        FieldDef::with_description("walking_status", "การเดิน", "walking_description"),
        // Daily life
        FieldDef::with_description("brushing_teeth", "การแปรงฟัน", "brushing_description"),
        FieldDef::with_description("mouth_rinsing", "การบ้วนปาก", "rinsing_description"),
        FieldDef::with_description("feeding_method", "วิธีการรับประทานอาหาร", "feeding_description"),
        FieldDef::new("food_types", "ประเภทอาหารที่ทาน"),
        FieldDef::with_description("food_amount", "ปริมาณอาหารที่ทาน", "food_amount_description"),
        FieldDef::new("additional_questions", "ผู้ป่วยมีคำถามที่จะสอบถามพยาบาลเพิ่มเติม"),
        FieldDef::with_description("ng_tube_position", "ตำแหน่งสายยางให้อาหาร", "ng_tube_description"),
    ]
}

fn builtin_description_labels() -> Vec<(&'static str, &'static str)> {
    vec![
        ("swelling_description", "คำอธิบายเพิ่มเติมสำหรับอาการบวม"),
        ("breathing_description", "คำอธิบายเพิ่มเติมสำหรับอาการหายใจ/กลืนลำบาก"),
        ("bleeding_description", "คำอธิบายเพิ่มเติมสำหรับอาการเลือดซึม/เลือดออก"),
        ("fever_description", "คำอธิบายเพิ่มเติมสำหรับอาการไข้"),
        ("numbness_description", "คำอธิบายเพิ่มเติมสำหรับอาการชา"),
        ("phlebitis_description", "คำอธิบายเพิ่มเติมสำหรับบริเวณเข็มน้ำเกลือ"),
        ("suture_description", "คำอธิบายเพิ่มเติมสำหรับไหมเย็บแผล"),
        ("antibiotic_description", "จำนวนครั้งที่ลืมทาน"),
        ("imf_wire_description", "คำอธิบายเพิ่มเติมสำหรับลวด/ยางมัดฟัน"),
        ("walking_description", "คำอธิบายเพิ่มเติมสำหรับการเดิน"),
        ("brushing_description", "คำอธิบายเพิ่มเติมสำหรับการแปรงฟัน"),
        ("rinsing_description", "คำอธิบายเพิ่มเติมสำหรับการบ้วนปาก"),
        ("feeding_description", "คำอธิบายเพิ่มเติมสำหรับวิธีการรับประทานอาหาร"),
        ("food_amount_description", "คำอธิบายเพิ่มเติมสำหรับปริมาณอาหาร"),
        ("ng_tube_description", "คำอธิบายเพิ่มเติมสำหรับตำแหน่งสายยางให้อาหาร"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_is_valid() {
        let reg = FieldRegistry::builtin();
        assert_eq!(reg.defs().len(), 27);
    }

    #[test]
    fn label_round_trip_for_every_field() {
        let reg = FieldRegistry::builtin();
        for def in reg.defs() {
            let label = reg.label_for(&def.id).expect("registered field has label");
            assert_eq!(reg.field_for_label(label), Some(def.id.as_str()));
        }
    }

    #[test]
    fn unregistered_id_has_no_label() {
        let reg = FieldRegistry::builtin();
        assert_eq!(reg.label_for("blood_type"), None);
    }

    #[test]
    fn description_fields_are_registered_targets() {
        let reg = FieldRegistry::builtin();
        assert!(reg.is_description_field("swelling_description"));
        assert!(!reg.is_description_field("swelling_status"));
        assert_eq!(
            reg.description_field_of("swelling_status"),
            Some("swelling_description")
        );
        assert_eq!(reg.description_field_of("age"), None);
    }

    #[test]
    fn description_label_falls_back_to_generic() {
        let reg = FieldRegistry::builtin();
        assert_eq!(
            reg.description_label("swelling_description"),
            "คำอธิบายเพิ่มเติมสำหรับอาการบวม"
        );
        assert_eq!(reg.description_label("mystery_description"), GENERIC_DESCRIPTION_LABEL);
    }

    #[test]
    fn duplicate_id_rejected() {
        let defs = vec![FieldDef::new("age", "อายุ"), FieldDef::new("age", "Age")];
        let err = FieldRegistry::new(defs, vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFieldId(id) if id == "age"));
    }

    #[test]
    fn duplicate_label_rejected() {
        let defs = vec![FieldDef::new("age", "อายุ"), FieldDef::new("years", "อายุ")];
        let err = FieldRegistry::new(defs, vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFieldLabel(_)));
    }

    #[test]
    fn description_target_colliding_with_field_rejected() {
        let defs = vec![
            FieldDef::new("note", "หมายเหตุ"),
            FieldDef::with_description("fever", "ไข้", "note"),
        ];
        let err = FieldRegistry::new(defs, vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::DescriptionCollision { .. }));
    }
}
