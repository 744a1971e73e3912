use serde::{Deserialize, Serialize};

/// 受访者人口统计信息，两项均为必填
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age_range: Option<String>,
    pub experience_years: Option<String>,
}

impl Demographics {
    pub fn is_complete(&self) -> bool {
        self.age_range.is_some() && self.experience_years.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_requires_both_fields() {
        let mut demo = Demographics::default();
        assert!(!demo.is_complete());

        demo.age_range = Some("25-34".to_string());
        assert!(!demo.is_complete());

        demo.experience_years = Some("0-2".to_string());
        assert!(demo.is_complete());
    }

    #[test]
    fn test_unset_fields_serialize_as_null() {
        let json = serde_json::to_value(Demographics::default()).unwrap();
        assert_eq!(json, serde_json::json!({"ageRange": null, "experienceYears": null}));
    }
}
