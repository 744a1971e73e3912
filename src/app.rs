use anyhow::{Context, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use tracing::{info, warn};
use url::Url;

use crate::clients::{HttpSurveyClient, SurveyEndpoint};
use crate::config::Config;
use crate::error::{AppError, SubmissionError};
use crate::frontend::{CardRenderer, Console};
use crate::services::ImageStore;
use crate::utils::logging::{init_log_file, log_startup};
use crate::workflow::{SessionController, SubmissionState, SurveyOptions};

/// 应用主结构
pub struct App<E, R, W> {
    controller: SessionController<E>,
    console: Console<R, W>,
    renderer: CardRenderer,
}

impl App<HttpSurveyClient, StdinLock<'static>, Stdout> {
    /// 初始化应用：真实端点 + 标准输入输出
    pub fn initialize(config: Config) -> Result<Self> {
        if let Err(e) = init_log_file(&config.output_log_file) {
            warn!("⚠️ 无法初始化日志文件 {}: {}", config.output_log_file, e);
        }

        let client = HttpSurveyClient::new(&config).map_err(AppError::from)?;
        let page = page_url(&config, client.endpoint());
        let console = Console::new(io::stdin().lock(), io::stdout());

        Ok(Self::with_parts(&config, client, console, page))
    }
}

impl<E: SurveyEndpoint, R: BufRead, W: Write> App<E, R, W> {
    /// 使用给定的端点与终端组装应用
    pub fn with_parts(config: &Config, endpoint: E, console: Console<R, W>, page: String) -> Self {
        Self {
            controller: SessionController::new(endpoint, SurveyOptions::from_config(config, page)),
            console,
            renderer: CardRenderer::new(ImageStore::new(&config.image_dir)),
        }
    }

    pub fn controller(&self) -> &SessionController<E> {
        &self.controller
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// 运行整个问卷会话
    ///
    /// # 返回
    /// 成功提交的组数
    pub async fn run(&mut self) -> Result<usize> {
        let token = self
            .console
            .require_consent_and_token()
            .map_err(AppError::from)?;
        self.controller.set_token(&token).map_err(AppError::from)?;

        log_startup(
            &self.controller.options().page,
            &self.controller.participant_id().to_string(),
        );

        let mut submitted_sets = 0;
        let mut first = true;

        loop {
            let loaded = if first {
                self.controller.load_manifest().await
            } else {
                self.controller.reload().await
            };
            first = false;
            self.show_status()?;

            if loaded.is_err() {
                // 加载失败时结束会话，不自动重试
                return Ok(submitted_sets);
            }

            if !self.collect_answers()? {
                warn!("⚠️ 输入已结束，未提交");
                return Ok(submitted_sets);
            }

            if self.submit_with_retry().await? {
                submitted_sets += 1;
            }

            if !self.controller.can_reload()
                || !self.console.confirm("Load another set? [y/N]: ")?
            {
                break;
            }
        }

        info!("📊 本次会话共提交 {} 组", submitted_sets);
        Ok(submitted_sets)
    }

    /// 渲染卡片并收集作答与人口统计，输入提前结束时返回 false
    fn collect_answers(&mut self) -> Result<bool> {
        let total = {
            let session = self.controller.session();
            let Some(manifest) = session.manifest.as_ref() else {
                return Ok(false);
            };
            self.renderer
                .render(self.console.writer(), manifest)
                .context("渲染题目失败")?;
            session.questions.len()
        };

        let allow_undecided = self.controller.options().allow_undecided;
        for index in 1..=total {
            let Some(choice) = self.console.prompt_choice(index, allow_undecided)? else {
                return Ok(false);
            };
            self.controller.answer(index, choice).map_err(AppError::from)?;
        }

        if self.controller.options().collect_demographics {
            let ages = self.controller.options().age_ranges.clone();
            let Some(age) = self.console.prompt_option("Age range:", &ages)? else {
                return Ok(false);
            };
            self.controller.set_age_range(&age).map_err(AppError::from)?;

            let years = self.controller.options().experience_ranges.clone();
            let Some(exp) = self.console.prompt_option("Years of experience:", &years)? else {
                return Ok(false);
            };
            self.controller
                .set_experience_years(&exp)
                .map_err(AppError::from)?;
        }

        Ok(true)
    }

    /// 确认并提交；失败且策略允许时询问是否重试
    async fn submit_with_retry(&mut self) -> Result<bool> {
        if !self.controller.submit_enabled() {
            return Ok(false);
        }
        if !self.console.confirm("Submit your answers? [y/N]: ")? {
            return Ok(false);
        }

        loop {
            let result = self.controller.submit().await;
            self.show_status()?;

            match result {
                Ok(_) => return Ok(true),
                Err(SubmissionError::NotAllowed) => return Ok(false),
                Err(_) if self.controller.submission_state() == SubmissionState::Idle => {
                    if !self.console.confirm("Try again? [y/N]: ")? {
                        return Ok(false);
                    }
                }
                Err(_) => return Ok(false),
            }
        }
    }

    fn show_status(&mut self) -> Result<()> {
        let status = self.controller.status();
        self.console.show_status(&status)?;
        Ok(())
    }
}

/// clientMeta.page：优先使用配置，否则为带 scenario / llm 参数的端点地址（不含口令）
pub fn page_url(config: &Config, endpoint: &Url) -> String {
    if let Some(page) = &config.page_url {
        return page.clone();
    }

    let mut url = endpoint.clone();
    if config.scenario_override.is_some() || config.llm_override.is_some() {
        let mut pairs = url.query_pairs_mut();
        if let Some(scenario) = &config.scenario_override {
            pairs.append_pair("scenario", scenario);
        }
        if let Some(llm) = &config.llm_override {
            pairs.append_pair("llm", llm);
        }
    }
    url.to_string()
}
