use serde::{Deserialize, Serialize};

use super::demographics::Demographics;
use super::manifest::Pair;
use super::question::{Choice, Question};
use crate::utils::mode::extract_mode;

/// 一道已作答题目的提交记录，只在提交时由题目和图片对推导
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub qid: String,
    pub pair_id: String,
    pub choice: Choice,
    pub left_name: Option<String>,
    pub right_name: Option<String>,
    pub chosen_name: Option<String>,
    pub rejected_name: Option<String>,
    pub chosen_mode: Option<String>,
    pub rejected_mode: Option<String>,
}

impl Selection {
    /// 由题目与对应图片对构建；未作答时返回 `None`
    pub fn derive(question: &Question, pair: &Pair) -> Option<Self> {
        let choice = question.choice()?;
        let left_name = pair.left_name.clone();
        let right_name = pair.right_name.clone();

        let (chosen_name, rejected_name) = match choice {
            Choice::A => (left_name.clone(), right_name.clone()),
            Choice::B => (right_name.clone(), left_name.clone()),
            Choice::Undecided => (None, None),
        };

        Some(Self {
            qid: question.qid(),
            pair_id: question.pair_id.clone(),
            choice,
            chosen_mode: chosen_name.as_deref().and_then(extract_mode),
            rejected_mode: rejected_name.as_deref().and_then(extract_mode),
            left_name,
            right_name,
            chosen_name,
            rejected_name,
        })
    }
}

/// 客户端元信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientMeta {
    /// 毫秒级时间戳
    pub ts: i64,
    pub ua: String,
    pub page: String,
}

/// 提交请求体
///
/// `layout_hash` 为 `Some(None)` 时序列化为 `null`，为 `None` 时整个字段省略
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub token: String,
    pub participant_id: String,
    pub scenario_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<Option<String>>,
    pub llm_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    pub selections: Vec<Selection>,
    pub client_meta: ClientMeta,
}

/// 提交接口的响应信封
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::manifest::ImageRef;
    use crate::models::question::Answer;

    fn pair() -> Pair {
        Pair {
            id: "pair-01".to_string(),
            left_image: ImageRef::Missing,
            right_image: ImageRef::Missing,
            left_name: Some("[grid]_park.png".to_string()),
            right_name: Some("park_plain.png".to_string()),
        }
    }

    fn answered(choice: Choice) -> Question {
        let mut q = Question::new(1, &pair());
        q.answer = Answer::Chosen(choice);
        q
    }

    #[test]
    fn test_choice_b_swaps_chosen_and_rejected() {
        let sel = Selection::derive(&answered(Choice::B), &pair()).unwrap();
        assert_eq!(sel.chosen_name.as_deref(), Some("park_plain.png"));
        assert_eq!(sel.rejected_name.as_deref(), Some("[grid]_park.png"));
        assert_eq!(sel.chosen_mode, None);
        assert_eq!(sel.rejected_mode.as_deref(), Some("[grid]"));
    }

    #[test]
    fn test_undecided_has_no_chosen_name() {
        let sel = Selection::derive(&answered(Choice::Undecided), &pair()).unwrap();
        assert_eq!(sel.chosen_name, None);
        assert_eq!(sel.rejected_name, None);
        assert_eq!(sel.left_name.as_deref(), Some("[grid]_park.png"));
    }

    #[test]
    fn test_unanswered_yields_nothing() {
        assert!(Selection::derive(&Question::new(1, &pair()), &pair()).is_none());
    }

    #[test]
    fn test_payload_layout_hash_presence() {
        let mut payload = SubmissionPayload {
            token: "t".into(),
            participant_id: "p".into(),
            scenario_id: "s".into(),
            layout_hash: Some(None),
            llm_id: "m".into(),
            demographics: None,
            selections: vec![],
            client_meta: ClientMeta {
                ts: 1,
                ua: "ua".into(),
                page: "page".into(),
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["layoutHash"].is_null());
        assert!(json.as_object().unwrap().contains_key("layoutHash"));
        assert!(!json.as_object().unwrap().contains_key("demographics"));

        payload.layout_hash = None;
        let json = serde_json::to_value(&payload).unwrap();
        assert!(!json.as_object().unwrap().contains_key("layoutHash"));
        assert_eq!(json["clientMeta"]["ua"], "ua");
        assert_eq!(json["participantId"], "p");
    }
}
