use serde::{Deserialize, Serialize};
use std::fmt;

use super::manifest::Pair;

/// 受访者的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// 左图
    A,
    /// 右图
    B,
    /// 无法决定（仅部分问卷启用）
    #[serde(rename = "U")]
    Undecided,
}

impl Choice {
    /// 提交时使用的代码
    pub fn code(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::Undecided => "U",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 单题作答状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Answer {
    #[default]
    Unanswered,
    Chosen(Choice),
}

/// 客户端侧的题目，与清单中的图片对一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// 从 1 开始的序号
    pub index: usize,
    pub pair_id: String,
    pub answer: Answer,
}

impl Question {
    pub fn new(index: usize, pair: &Pair) -> Self {
        Self {
            index,
            pair_id: pair.id.clone(),
            answer: Answer::Unanswered,
        }
    }

    /// 题目标识，如 `q1`
    pub fn qid(&self) -> String {
        format!("q{}", self.index)
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.answer, Answer::Chosen(_))
    }

    pub fn choice(&self) -> Option<Choice> {
        match self.answer {
            Answer::Chosen(choice) => Some(choice),
            Answer::Unanswered => None,
        }
    }
}

/// 根据清单生成题目列表，全部处于未作答状态
pub fn questions_for(pairs: &[Pair]) -> Vec<Question> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| Question::new(i + 1, pair))
        .collect()
}
