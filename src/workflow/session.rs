//! 会话状态
//!
//! 页面生命周期内唯一的一份可变状态：口令、受访者 ID、当前清单、作答与提交标记

use std::fmt;
use uuid::Uuid;

use crate::error::ConsentError;
use crate::models::{questions_for, Demographics, Manifest, Question};

/// 提交状态机：Idle → Submitting → Submitted，失败时可能回到 Idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Submitted,
}

/// 状态栏样式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    Plain,
    Muted,
    Ok,
    Err,
}

/// 状态栏文案
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

impl Status {
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 会话
#[derive(Debug, Clone)]
pub struct Session {
    token: Option<String>,
    participant_id: Uuid,
    pub manifest: Option<Manifest>,
    pub questions: Vec<Question>,
    pub demographics: Demographics,
    pub state: SubmissionState,
}

impl Session {
    /// 创建新会话，受访者 ID 只在这里生成一次
    pub fn new() -> Self {
        Self {
            token: None,
            participant_id: Uuid::new_v4(),
            manifest: None,
            questions: Vec::new(),
            demographics: Demographics::default(),
            state: SubmissionState::Idle,
        }
    }

    pub fn participant_id(&self) -> Uuid {
        self.participant_id
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 设置口令（去除首尾空白后不能为空）
    pub fn set_token(&mut self, raw: &str) -> Result<(), ConsentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConsentError::MissingToken);
        }
        self.token = Some(trimmed.to_string());
        Ok(())
    }

    /// 装入新清单并为每组图片创建未作答的题目
    pub fn install_manifest(&mut self, manifest: Manifest) {
        self.questions = questions_for(&manifest.pairs);
        self.manifest = Some(manifest);
        self.reset_state();
    }

    /// 丢弃当前清单与作答，回到 Idle
    pub fn clear_manifest(&mut self) {
        self.manifest = None;
        self.questions.clear();
        self.reset_state();
    }

    /// 提交在途时保持 Submitting
    fn reset_state(&mut self) {
        if self.state != SubmissionState::Submitting {
            self.state = SubmissionState::Idle;
        }
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(Question::is_answered)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
