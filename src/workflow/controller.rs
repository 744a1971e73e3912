//! 会话控制器 - 流程层
//!
//! 持有全部会话状态，负责：
//! 1. 加载清单（初始加载与"再来一组"）
//! 2. 接收作答事件，每次变更后统一重新计算"提交是否可用"
//! 3. 提交门控：Idle → Submitting → Submitted，失败按策略回到 Idle 或锁定
//!
//! 控制器运行在单线程事件循环上，状态放在 `RefCell` 中，任何借用都不会跨越 await。
//! 提交在第一次 await 之前就切换到 Submitting，重叠的提交请求会被直接拒绝。

use std::cell::{Cell, Ref, RefCell};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::{ManifestQuery, SurveyEndpoint};
use crate::config::{Config, SubmitFailurePolicy};
use crate::error::{ConsentError, ManifestLoadError, SubmissionError, ValidationError};
use crate::models::{Answer, Choice, ClientMeta, Selection, SubmissionPayload};
use crate::utils::logging::{log_manifest_loaded, log_submission_result};
use crate::utils::mode::extract_first_bracket_content;
use crate::workflow::session::{Session, Status, StatusKind, SubmissionState};

pub const STATUS_LOADING: &str = "Loading form (this can take several seconds)…";
pub const STATUS_LOADING_NEXT: &str = "Loading next set…";
pub const STATUS_LOADED: &str = "Loaded.";
pub const STATUS_SUBMITTING: &str = "Submitting…";
pub const STATUS_SAVED: &str = "Saved. Thank you.";
pub const STATUS_LOAD_FAILED: &str = "Could not load form.";
pub const STATUS_RELOAD_FAILED: &str = "Could not load next set.";

/// 控制器使用的问卷变体选项
#[derive(Debug, Clone)]
pub struct SurveyOptions {
    pub scenario_override: Option<String>,
    pub llm_override: Option<String>,
    pub collect_demographics: bool,
    pub allow_undecided: bool,
    pub include_layout_hash: bool,
    pub offer_reload: bool,
    pub failure_policy: SubmitFailurePolicy,
    pub age_ranges: Vec<String>,
    pub experience_ranges: Vec<String>,
    pub user_agent: String,
    /// 写入 clientMeta.page
    pub page: String,
}

impl SurveyOptions {
    pub fn from_config(config: &Config, page: impl Into<String>) -> Self {
        Self {
            scenario_override: config.scenario_override.clone(),
            llm_override: config.llm_override.clone(),
            collect_demographics: config.collect_demographics,
            allow_undecided: config.allow_undecided,
            include_layout_hash: config.include_layout_hash,
            offer_reload: config.offer_reload,
            failure_policy: config.submit_failure_policy,
            age_ranges: config.age_ranges.clone(),
            experience_ranges: config.experience_ranges.clone(),
            user_agent: config.user_agent.clone(),
            page: page.into(),
        }
    }
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), "")
    }
}

/// 会话控制器
pub struct SessionController<E> {
    endpoint: E,
    options: SurveyOptions,
    session: RefCell<Session>,
    status: RefCell<Status>,
    submit_enabled: Cell<bool>,
    reload_offered: Cell<bool>,
    loading: Cell<bool>,
}

impl<E: SurveyEndpoint> SessionController<E> {
    /// 创建新的会话控制器
    pub fn new(endpoint: E, options: SurveyOptions) -> Self {
        let controller = Self {
            endpoint,
            options,
            session: RefCell::new(Session::new()),
            status: RefCell::new(Status::default()),
            submit_enabled: Cell::new(false),
            reload_offered: Cell::new(false),
            loading: Cell::new(false),
        };
        controller.recompute();
        controller
    }

    pub fn options(&self) -> &SurveyOptions {
        &self.options
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// 只读访问当前会话
    pub fn session(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    pub fn participant_id(&self) -> Uuid {
        self.session.borrow().participant_id()
    }

    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.session.borrow().state
    }

    /// 提交按钮当前是否可用（每次状态变更后重新计算）
    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled.get()
    }

    /// 是否提供"再来一组"
    pub fn can_reload(&self) -> bool {
        self.reload_offered.get()
    }

    /// 同意流程完成后写入口令
    pub fn set_token(&self, token: &str) -> Result<(), ConsentError> {
        self.session.borrow_mut().set_token(token)
    }

    // ========== 清单加载 ==========

    /// 加载清单并生成题目
    ///
    /// 只能在尚未装入清单时调用；已有清单、加载中或提交中一律拒绝
    ///
    /// # 返回
    /// 题目数量
    pub async fn load_manifest(&self) -> Result<usize, ManifestLoadError> {
        {
            let session = self.session.borrow();
            if self.loading.get()
                || session.manifest.is_some()
                || session.state != SubmissionState::Idle
            {
                debug!("忽略加载请求，当前状态: {:?}", session.state);
                return Err(ManifestLoadError::NotAllowed);
            }
        }

        self.set_status(STATUS_LOADING, StatusKind::Plain);
        self.fetch_and_install(STATUS_LOAD_FAILED).await
    }

    /// "再来一组"：仅在提交成功后可用，清空作答并重置提交状态后重新加载
    pub async fn reload(&self) -> Result<usize, ManifestLoadError> {
        if self.loading.get()
            || !self.reload_offered.get()
            || self.submission_state() != SubmissionState::Submitted
        {
            debug!("忽略换组请求，当前状态: {:?}", self.submission_state());
            return Err(ManifestLoadError::ReloadNotAllowed);
        }

        self.reload_offered.set(false);
        self.session.borrow_mut().clear_manifest();
        self.set_status(STATUS_LOADING_NEXT, StatusKind::Muted);
        self.recompute();

        info!("🔄 正在加载下一组...");
        self.fetch_and_install(STATUS_RELOAD_FAILED).await
    }

    async fn fetch_and_install(&self, fallback: &str) -> Result<usize, ManifestLoadError> {
        self.loading.set(true);
        let query = {
            let session = self.session.borrow();
            session.token().map(|token| ManifestQuery {
                token: token.to_string(),
                scenario: self.options.scenario_override.clone(),
                llm: self.options.llm_override.clone(),
            })
        };

        let result = match query {
            Some(query) => self.endpoint.fetch_manifest(&query).await,
            None => Err(ManifestLoadError::MissingToken),
        };
        self.loading.set(false);

        match result {
            Ok(manifest) => {
                log_manifest_loaded(&manifest);
                let count = manifest.pairs.len();
                self.session.borrow_mut().install_manifest(manifest);
                self.set_status(STATUS_LOADED, StatusKind::Muted);
                self.recompute();
                Ok(count)
            }
            Err(e) => {
                warn!("⚠️ 清单加载失败: {}", e);
                self.session.borrow_mut().clear_manifest();
                self.set_status(failure_text(&e, fallback), StatusKind::Err);
                self.recompute();
                Err(e)
            }
        }
    }

    // ========== 作答事件 ==========

    /// 记录第 `index` 题（从 1 开始）的选择
    pub fn answer(&self, index: usize, choice: Choice) -> Result<(), ValidationError> {
        if choice == Choice::Undecided && !self.options.allow_undecided {
            return Err(ValidationError::ChoiceNotAllowed {
                choice: choice.to_string(),
            });
        }

        {
            let mut session = self.session.borrow_mut();
            let total = session.questions.len();
            let question = index
                .checked_sub(1)
                .and_then(|i| session.questions.get_mut(i))
                .ok_or(ValidationError::UnknownQuestion { index, total })?;
            question.answer = Answer::Chosen(choice);
        }

        self.recompute();
        Ok(())
    }

    pub fn set_age_range(&self, value: &str) -> Result<(), ValidationError> {
        let value = self.checked_option("ageRange", value, &self.options.age_ranges)?;
        self.session.borrow_mut().demographics.age_range = Some(value);
        self.recompute();
        Ok(())
    }

    pub fn set_experience_years(&self, value: &str) -> Result<(), ValidationError> {
        let value =
            self.checked_option("experienceYears", value, &self.options.experience_ranges)?;
        self.session.borrow_mut().demographics.experience_years = Some(value);
        self.recompute();
        Ok(())
    }

    fn checked_option(
        &self,
        field: &'static str,
        value: &str,
        allowed: &[String],
    ) -> Result<String, ValidationError> {
        if !self.options.collect_demographics {
            return Err(ValidationError::DemographicsDisabled);
        }
        let value = value.trim();
        if !allowed.is_empty() && !allowed.iter().any(|a| a == value) {
            return Err(ValidationError::UnknownOption {
                field,
                value: value.to_string(),
            });
        }
        Ok(value.to_string())
    }

    // ========== 提交门控 ==========

    /// 提交是否允许：Idle + 全部作答（题目非空）+ 人口统计完整（启用时）
    pub fn can_submit(&self) -> bool {
        let session = self.session.borrow();
        session.state == SubmissionState::Idle && validate(&session, &self.options).is_ok()
    }

    /// 每次状态变更后调用，从头推导提交按钮状态
    fn recompute(&self) {
        self.submit_enabled.set(self.can_submit());
    }

    /// 提交作答
    ///
    /// # 返回
    /// 成功提交的题目数量
    pub async fn submit(&self) -> Result<usize, SubmissionError> {
        let prepared = {
            let mut session = self.session.borrow_mut();
            if session.state != SubmissionState::Idle {
                debug!("忽略重复提交，当前状态: {:?}", session.state);
                return Err(SubmissionError::NotAllowed);
            }
            let prepared = build_payload(&session, &self.options);
            if prepared.is_ok() {
                session.state = SubmissionState::Submitting;
            }
            prepared
        };

        let (token, payload) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.set_status(e.to_string(), StatusKind::Err);
                self.recompute();
                return Err(e.into());
            }
        };

        self.set_status(STATUS_SUBMITTING, StatusKind::Plain);
        self.recompute();
        info!("📤 正在提交 {} 题...", payload.selections.len());

        let count = payload.selections.len();
        match self.endpoint.submit(&token, &payload).await {
            Ok(()) => {
                self.session.borrow_mut().state = SubmissionState::Submitted;
                self.reload_offered.set(self.options.offer_reload);
                self.set_status(STATUS_SAVED, StatusKind::Ok);
                self.recompute();
                log_submission_result(count, None);
                Ok(count)
            }
            Err(e) => {
                let next = match self.options.failure_policy {
                    SubmitFailurePolicy::Retry => SubmissionState::Idle,
                    SubmitFailurePolicy::Lock => SubmissionState::Submitted,
                };
                self.session.borrow_mut().state = next;
                self.set_status(e.to_string(), StatusKind::Err);
                self.recompute();
                log_submission_result(count, Some(&e.to_string()));
                Err(e)
            }
        }
    }

    fn set_status(&self, text: impl Into<String>, kind: StatusKind) {
        *self.status.borrow_mut() = Status::new(text, kind);
    }
}

/// 错误文案为空时使用兜底状态文本
fn failure_text(err: &impl std::fmt::Display, fallback: &str) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// 提交前校验（不看提交状态）
fn validate(session: &Session, options: &SurveyOptions) -> Result<(), ValidationError> {
    if options.collect_demographics && !session.demographics.is_complete() {
        return Err(ValidationError::IncompleteDemographics);
    }
    if !session.all_answered() {
        return Err(ValidationError::UnansweredQuestions);
    }
    Ok(())
}

/// 根据当前会话构建提交请求体
///
/// # 返回
/// `(口令, 请求体)`
pub fn build_payload(
    session: &Session,
    options: &SurveyOptions,
) -> Result<(String, SubmissionPayload), ValidationError> {
    validate(session, options)?;

    let (token, manifest) = match (session.token(), session.manifest.as_ref()) {
        (Some(token), Some(manifest)) => (token, manifest),
        _ => return Err(ValidationError::UnansweredQuestions),
    };

    let selections = session
        .questions
        .iter()
        .map(|q| {
            manifest
                .pairs
                .get(q.index - 1)
                .and_then(|pair| Selection::derive(q, pair))
                .ok_or(ValidationError::UnansweredQuestions)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let layout_hash = options
        .include_layout_hash
        .then(|| extract_first_bracket_content(&manifest.scenario_id));

    let demographics = options
        .collect_demographics
        .then(|| session.demographics.clone());

    let payload = SubmissionPayload {
        token: token.to_string(),
        participant_id: session.participant_id().to_string(),
        scenario_id: manifest.scenario_id.clone(),
        layout_hash,
        llm_id: manifest.llm_id.clone(),
        demographics,
        selections,
        client_meta: ClientMeta {
            ts: chrono::Utc::now().timestamp_millis(),
            ua: options.user_agent.clone(),
            page: options.page.clone(),
        },
    };

    Ok((token.to_string(), payload))
}
