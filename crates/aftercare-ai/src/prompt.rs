//! Prompt construction for one (flow, record) classification call.
//!
//! The prompt pins the oracle to a single flow's criteria, names the three
//! allowed risk tiers, and embeds a JSON schema directive plus the fixed
//! no-relevant-data fallback. The fallback is advisory prompt text: the
//! response parser accepts any syntactically valid structured answer and
//! does not verify conformance to it.

/// Reason string the oracle is instructed to return when the record carries
/// nothing relevant to the criteria.
pub const FALLBACK_REASON: &str = "ไม่ได้ระบุข้อมูล";

/// Recommendation string paired with [`FALLBACK_REASON`].
pub const FALLBACK_RECOMMENDATION: &str =
    "ไม่มีคำแนะนำเฉพาะ กรุณาปฏิบัติตามคำแนะนำทั่วไปหลังผ่าตัด";

/// Build the full inference request text for one flow against one
/// serialised record.
pub fn build_prompt(criteria: &str, record_text: &str) -> String {
    format!(
        "คุณเป็นพยาบาลที่ให้คำปรึกษาผู้ป่วยหลังผ่าตัด\n\n\
         **สำคัญ: ประเมินเฉพาะตามเกณฑ์การประเมินที่กำหนดให้เท่านั้น อย่าวิเคราะห์อาการอื่นๆ**\n\n\
         เกณฑ์การประเมิน (ให้ประเมินเฉพาะเกณฑ์นี้):\n{criteria}\n\n\
         ข้อมูลผู้ป่วย:\n{record_text}\n\n\
         วิธีการประเมิน:\n\
         1. ดูเฉพาะข้อมูลที่เกี่ยวข้องกับเกณฑ์การประเมินด้านบน\n\
         2. ประเมินระดับความเสี่ยง [ความเสี่ยงต่ำ, ความเสี่ยงกลาง, ความเสี่ยงสูง]\n\
         3. เหตุผล (reason): อธิบายสั้นๆ ตามเกณฑ์ที่ประเมิน (ไม่เกิน 2-3 ประโยค)\n\
         4. คำแนะนำ (recommendation): ให้คำแนะนำที่เกี่ยวข้องกับเกณฑ์ที่ประเมินเท่านั้น\n\n\
         คำแนะนำ (recommendation) ที่ดี:\n\
         - กระชับ ตรงประเด็น (2-4 ข้อ)\n\
         - บอกชัดว่าควรทำอะไร ไม่ใช่สรุปอาการ\n\
         - ตัวอย่าง:\n\
           * ความเสี่ยงสูง: ควรติดต่อแพทย์/พยาบาลโดยเร็ว\n\
           * ความเสี่ยงกลาง: ควรสังเกตอาการ หากแย่ลงให้ติดต่อแพทย์\n\
           * ความเสี่ยงต่ำ: ดูแลตามคำแนะนำทั่วไป\n\n\
         กรณีไม่มีข้อมูล: risk_level = 'ความเสี่ยงต่ำ', reason = '{FALLBACK_REASON}', \
         recommendation = '{FALLBACK_RECOMMENDATION}'\n\n\
         ตอบกลับเป็น JSON อย่างเดียว ไม่ต้องมีข้อความอื่น ตามโครงสร้างนี้:\n\
         {{\"risk_level\": \"ความเสี่ยงต่ำ | ความเสี่ยงกลาง | ความเสี่ยงสูง\", \
         \"recommendation\": \"คำแนะนำการดูแลตนเองสำหรับผู้ป่วย เขียนเป็นภาษาไทย\", \
         \"reason\": \"เหตุผลที่ประเมินระดับความเสี่ยงนี้ เขียนเป็นภาษาไทย\"}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_criteria_and_record() {
        let prompt = build_prompt("เกณฑ์การประเมินอาการปวด", "อายุ: 30\nอาการบวม: ใช่");
        assert!(prompt.contains("เกณฑ์การประเมินอาการปวด"));
        assert!(prompt.contains("อายุ: 30\nอาการบวม: ใช่"));
    }

    #[test]
    fn prompt_names_all_three_tiers() {
        let prompt = build_prompt("เกณฑ์", "ข้อมูล");
        assert!(prompt.contains("ความเสี่ยงต่ำ"));
        assert!(prompt.contains("ความเสี่ยงกลาง"));
        assert!(prompt.contains("ความเสี่ยงสูง"));
    }

    #[test]
    fn prompt_carries_schema_keys_and_fallback() {
        let prompt = build_prompt("เกณฑ์", "ข้อมูล");
        for key in ["risk_level", "recommendation", "reason"] {
            assert!(prompt.contains(key), "missing schema key {key}");
        }
        assert!(prompt.contains(FALLBACK_REASON));
        assert!(prompt.contains(FALLBACK_RECOMMENDATION));
    }
}
