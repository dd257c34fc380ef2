//! Flow registry: the independent clinical criteria ("flows") a patient
//! record is classified against.
//!
//! Each flow carries the rubric text the oracle judges against. The
//! registry's declaration order is fixed at load time and used everywhere as
//! the canonical result-column order, so concurrent completion can never
//! scramble column identity.

use std::collections::HashMap;

use crate::error::ConfigError;

/// One clinical assessment flow.
#[derive(Debug, Clone)]
pub struct Flow {
    /// Stable identifier used in column names and error manifests.
    pub id: String,
    /// Thai display name used in durable-log headers.
    pub name: String,
    /// The rubric text embedded verbatim into the oracle prompt.
    pub criteria: String,
}

/// Immutable, ordered collection of flows, built once at startup.
#[derive(Debug)]
pub struct FlowRegistry {
    flows: Vec<Flow>,
    by_id: HashMap<String, usize>,
}

impl FlowRegistry {
    pub fn new(flows: Vec<Flow>) -> Result<Self, ConfigError> {
        if flows.is_empty() {
            return Err(ConfigError::NoFlows);
        }
        let mut by_id = HashMap::with_capacity(flows.len());
        for (idx, flow) in flows.iter().enumerate() {
            if by_id.insert(flow.id.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateFlowId(flow.id.clone()));
            }
        }
        Ok(Self { flows, by_id })
    }

    /// Flows in canonical (declaration) order.
    pub fn all(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Flow> {
        self.by_id.get(id).map(|&i| &self.flows[i])
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.flows.iter().map(|f| f.id.as_str())
    }

    /// The built-in post-operative assessment flows.
    pub fn builtin() -> Self {
        Self::new(builtin_flows()).expect("built-in flow registry is valid")
    }
}

fn flow(id: &str, name: &str, criteria: &str) -> Flow {
    Flow {
        id: id.to_string(),
        name: name.to_string(),
        criteria: criteria.to_string(),
    }
}

fn builtin_flows() -> Vec<Flow> {
    vec![
        flow(
            "pain",
            "อาการปวด",
            "เกณฑ์การประเมินอาการปวด:\n\
             - ความเสี่ยงสูง: pain score 7-10 หรือปวดมากขึ้นเรื่อยๆ หรือทานยาแก้ปวดแล้วไม่ดีขึ้นเลย\n\
             - ความเสี่ยงกลาง: pain score 4-6 หรือทานยาแก้ปวดแล้วดีขึ้นเพียงบางส่วน\n\
             - ความเสี่ยงต่ำ: pain score 0-3 และทานยาแก้ปวดแล้วอาการดีขึ้น",
        ),
        flow(
            "swelling",
            "อาการบวม",
            "เกณฑ์การประเมินอาการบวม:\n\
             - ความเสี่ยงสูง: บวมมากขึ้นหลังวันที่ 3 หลังผ่าตัด หรือบวมร่วมกับปวดตึงมาก หรือบวมจนหายใจ/กลืนลำบาก\n\
             - ความเสี่ยงกลาง: บวมเท่าเดิมไม่ยุบลงหลังวันที่ 3\n\
             - ความเสี่ยงต่ำ: ไม่บวม หรือบวมเล็กน้อยและค่อยๆ ยุบลง",
        ),
        flow(
            "bleeding",
            "อาการเลือดออก",
            "เกณฑ์การประเมินอาการเลือดซึม/เลือดออก:\n\
             - ความเสี่ยงสูง: เลือดออกมากเป็นลิ่ม หรือเลือดไหลไม่หยุดหลังกัดผ้าก๊อซ 30 นาที\n\
             - ความเสี่ยงกลาง: เลือดซึมเล็กน้อยปนน้ำลายเป็นระยะ\n\
             - ความเสี่ยงต่ำ: ไม่มีเลือดซึมหรือเลือดออก",
        ),
        flow(
            "fever",
            "อาการไข้",
            "เกณฑ์การประเมินอาการไข้:\n\
             - ความเสี่ยงสูง: ไข้สูงกว่า 38.5 องศา หรือไข้ร่วมกับหนาวสั่น หรือไข้หลังวันที่ 3 หลังผ่าตัด\n\
             - ความเสี่ยงกลาง: ไข้ต่ำๆ 37.5-38.5 องศา ภายใน 1-2 วันแรก\n\
             - ความเสี่ยงต่ำ: ไม่มีไข้",
        ),
        flow(
            "numbness",
            "อาการชา",
            "เกณฑ์การประเมินอาการชา:\n\
             - ความเสี่ยงสูง: ชามากขึ้นเรื่อยๆ หรือชาลามไปบริเวณอื่น\n\
             - ความเสี่ยงกลาง: ชาเท่าเดิมบริเวณริมฝีปาก คาง หรือลิ้น\n\
             - ความเสี่ยงต่ำ: ไม่ชา หรือชาลดลงเรื่อยๆ",
        ),
        flow(
            "phlebitis",
            "Phlebitis",
            "เกณฑ์การประเมินบริเวณที่เอาเข็มน้ำเกลือออก:\n\
             - ความเสี่ยงสูง: บวมแดงร้อนตามแนวเส้นเลือด หรือมีหนอง\n\
             - ความเสี่ยงกลาง: แดงหรือเจ็บเล็กน้อยบริเวณรอยเข็ม\n\
             - ความเสี่ยงต่ำ: ไม่มีอาการผิดปกติบริเวณรอยเข็ม",
        ),
        flow(
            "suture",
            "ไหมเย็บแผล",
            "เกณฑ์การประเมินไหมเย็บแผล:\n\
             - ความเสี่ยงสูง: ไหมหลุดและแผลแยกหรือมีเลือดออก\n\
             - ความเสี่ยงกลาง: ไหมหลุดบางส่วนแต่แผลไม่แยก\n\
             - ความเสี่ยงต่ำ: ไหมเย็บแผลอยู่ครบ",
        ),
        flow(
            "other_symptoms",
            "อาการอื่นๆ",
            "เกณฑ์การประเมินอาการอื่นๆ:\n\
             - ความเสี่ยงสูง: มีอาการผิดปกติรุนแรง เช่น หายใจลำบาก กลืนลำบาก อาเจียนมาก\n\
             - ความเสี่ยงกลาง: มีอาการผิดปกติเล็กน้อยที่ไม่รบกวนการใช้ชีวิต\n\
             - ความเสี่ยงต่ำ: ไม่มีอาการอื่นๆ",
        ),
        flow(
            "antibiotic",
            "การทานยาปฏิชีวนะ",
            "เกณฑ์การประเมินการรับประทานยาฆ่าเชื้อ:\n\
             - ความเสี่ยงสูง: ไม่ได้ทานยา หรือลืมทานบ่อยครั้ง (มากกว่า 2 ครั้ง)\n\
             - ความเสี่ยงกลาง: ลืมทาน 1-2 ครั้ง\n\
             - ความเสี่ยงต่ำ: ทานยาครบตามแพทย์สั่ง",
        ),
        flow(
            "compress",
            "การประคบ",
            "เกณฑ์การประเมินการประคบ:\n\
             - ความเสี่ยงกลาง: ประคบผิดวิธี เช่น ประคบอุ่นใน 2 วันแรก หรือประคบเย็นหลังวันที่ 3\n\
             - ความเสี่ยงต่ำ: ประคบเย็นใน 1-2 วันแรก และประคบอุ่นตั้งแต่วันที่ 3 เป็นต้นไป",
        ),
        flow(
            "imf",
            "IMF",
            "เกณฑ์การประเมินการมัดฟันบนและล่าง (IMF):\n\
             - ความเสี่ยงสูง: มี IMF และมีอาการหายใจลำบาก คลื่นไส้ หรืออาเจียน\n\
             - ความเสี่ยงต่ำ: ไม่มี IMF หรือมี IMF โดยไม่มีอาการผิดปกติ",
        ),
        flow(
            "imf_wire",
            "ลวดหรือยางมัดฟัน",
            "เกณฑ์การประเมินลวด/ยางมัดฟัน:\n\
             - ความเสี่ยงสูง: ลวดหรือยางขาด/หลุดจนขยับขากรรไกรได้\n\
             - ความเสี่ยงกลาง: ลวดหรือยางหลวมแต่ยังมัดอยู่ หรือลวดทิ่มกระพุ้งแก้ม\n\
             - ความเสี่ยงต่ำ: ลวด/ยางมัดฟันแน่นดี",
        ),
        flow(
            "walking",
            "การเดิน",
            "เกณฑ์การประเมินการเดิน:\n\
             - ความเสี่ยงสูง: เดินไม่ได้ หรือเวียนศีรษะมากจนเสี่ยงล้ม\n\
             - ความเสี่ยงกลาง: เดินได้แต่ต้องมีคนพยุง หรือเวียนศีรษะเป็นบางครั้ง\n\
             - ความเสี่ยงต่ำ: เดินได้ตามปกติ",
        ),
        flow(
            "brushing",
            "การแปรงฟัน",
            "เกณฑ์การประเมินการแปรงฟัน:\n\
             - ความเสี่ยงกลาง: ไม่ได้แปรงฟันเลย หรือแปรงโดนแผลจนเลือดออก\n\
             - ความเสี่ยงต่ำ: แปรงฟันเบาๆ โดยเลี่ยงบริเวณแผล",
        ),
        flow(
            "rinsing",
            "การบ้วนปาก",
            "เกณฑ์การประเมินการบ้วนปาก:\n\
             - ความเสี่ยงกลาง: บ้วนปากแรงใน 1-2 วันแรก หรือไม่ได้บ้วนปากเลย\n\
             - ความเสี่ยงต่ำ: บ้วนปากเบาๆ ด้วยน้ำเกลือหรือน้ำยาตามแพทย์สั่ง",
        ),
        flow(
            "feeding",
            "การรับประทานอาหาร",
            "เกณฑ์การประเมินวิธีการรับประทานอาหาร:\n\
             - ความเสี่ยงสูง: รับประทานไม่ได้เลย หรือสำลักบ่อย\n\
             - ความเสี่ยงกลาง: รับประทานได้น้อยหรือลำบากกว่าปกติมาก\n\
             - ความเสี่ยงต่ำ: รับประทานอาหารอ่อนหรืออาหารเหลวได้ตามคำแนะนำ",
        ),
        flow(
            "food_amount",
            "ปริมาณอาหาร",
            "เกณฑ์การประเมินปริมาณอาหารที่ทาน:\n\
             - ความเสี่ยงสูง: ทานได้น้อยกว่าครึ่งหนึ่งของปกติติดต่อกันหลายวัน หรือแทบไม่ได้ทานเลย\n\
             - ความเสี่ยงกลาง: ทานได้ประมาณครึ่งหนึ่งของปกติ\n\
             - ความเสี่ยงต่ำ: ทานได้ใกล้เคียงปกติ",
        ),
        flow(
            "ng_tube",
            "ตำแหน่งสายยาง NG tube",
            "เกณฑ์การประเมินตำแหน่งสายยางให้อาหาร:\n\
             - ความเสี่ยงสูง: สายยางหลุดหรือเลื่อนจากตำแหน่งเดิม หรือไอ/สำลักขณะให้อาหาร\n\
             - ความเสี่ยงกลาง: สายยางอยู่ที่เดิมแต่รู้สึกระคายเคืองมาก\n\
             - ความเสี่ยงต่ำ: ไม่มีสายยาง หรือสายยางอยู่ตำแหน่งเดิมปกติ",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_expected_flows() {
        let reg = FlowRegistry::builtin();
        assert_eq!(reg.len(), 18);
        assert!(reg.get("pain").is_some());
        assert!(reg.get("ng_tube").is_some());
        assert!(reg.get("head_pain").is_none());
    }

    #[test]
    fn iteration_order_is_declaration_order() {
        let reg = FlowRegistry::builtin();
        let ids: Vec<&str> = reg.ids().collect();
        assert_eq!(ids[0], "pain");
        assert_eq!(ids[1], "swelling");
        assert_eq!(*ids.last().unwrap(), "ng_tube");

        // Order must be stable across iterations.
        let again: Vec<&str> = reg.ids().collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn duplicate_flow_id_rejected() {
        let flows = vec![
            flow("pain", "อาการปวด", "เกณฑ์"),
            flow("pain", "ปวดซ้ำ", "เกณฑ์"),
        ];
        let err = FlowRegistry::new(flows).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFlowId(id) if id == "pain"));
    }

    #[test]
    fn empty_registry_rejected() {
        assert!(matches!(FlowRegistry::new(vec![]), Err(ConfigError::NoFlows)));
    }
}
