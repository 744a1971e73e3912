use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// 提交失败后的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitFailurePolicy {
    /// 回到 Idle，允许重新提交
    #[default]
    Retry,
    /// 锁定表单，不再允许提交
    Lock,
}

impl std::str::FromStr for SubmitFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "lock" => Ok(Self::Lock),
            other => Err(format!("未知的失败策略: {}", other)),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 清单与提交共用的端点
    pub endpoint_url: String,
    /// 强制指定场景（仅测试用）
    pub scenario_override: Option<String>,
    /// 强制指定模型（仅测试用）
    pub llm_override: Option<String>,
    /// 是否收集人口统计信息
    pub collect_demographics: bool,
    /// 是否提供"无法决定"选项
    pub allow_undecided: bool,
    /// 是否随提交附带 layoutHash
    pub include_layout_hash: bool,
    /// 提交成功后是否提供"再来一组"
    pub offer_reload: bool,
    pub submit_failure_policy: SubmitFailurePolicy,
    /// 内联图片的落盘目录
    pub image_dir: String,
    pub user_agent: String,
    /// 提交时写入 clientMeta.page，未设置时使用清单请求地址
    pub page_url: Option<String>,
    pub age_ranges: Vec<String>,
    pub experience_ranges: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: "https://script.google.com/macros/s/AKfycbymbBFdMtqLzCEWgHV89tkFsFrv_QJOpVOpNxGcQljNK_4C9OeI3W6lP7r_g1mFGWx2Pw/exec".to_string(),
            scenario_override: None,
            llm_override: None,
            collect_demographics: true,
            allow_undecided: false,
            include_layout_hash: true,
            offer_reload: true,
            submit_failure_policy: SubmitFailurePolicy::Retry,
            image_dir: "survey_images".to_string(),
            user_agent: format!("pair_survey/{}", env!("CARGO_PKG_VERSION")),
            page_url: None,
            age_ranges: ["18-24", "25-34", "35-44", "45-54", "55+"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            experience_ranges: ["0-2", "3-5", "6-10", "11-20", "20+"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            verbose_logging: false,
            output_log_file: "survey_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：`SURVEY_CONFIG` 指向的 TOML 文件（可选）+ 环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("SURVEY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        base.with_env_overrides()?.validated()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()?.validated()
    }

    /// 从 TOML 文件读取，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
            .map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?
            .validated()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 收集人口统计信息时，两个选项列表都不能为空
    fn validated(self) -> Result<Self, ConfigError> {
        if self.collect_demographics {
            if self.age_ranges.is_empty() {
                return Err(ConfigError::EmptyOptions { field: "age_ranges" });
            }
            if self.experience_ranges.is_empty() {
                return Err(ConfigError::EmptyOptions {
                    field: "experience_ranges",
                });
            }
        }
        Ok(self)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint_url: env_string("SURVEY_ENDPOINT").unwrap_or(self.endpoint_url),
            scenario_override: env_string("SURVEY_SCENARIO").or(self.scenario_override),
            llm_override: env_string("SURVEY_LLM").or(self.llm_override),
            collect_demographics: env_parse("SURVEY_DEMOGRAPHICS", "bool")?
                .unwrap_or(self.collect_demographics),
            allow_undecided: env_parse("SURVEY_ALLOW_UNDECIDED", "bool")?
                .unwrap_or(self.allow_undecided),
            include_layout_hash: env_parse("SURVEY_LAYOUT_HASH", "bool")?
                .unwrap_or(self.include_layout_hash),
            offer_reload: env_parse("SURVEY_OFFER_RELOAD", "bool")?.unwrap_or(self.offer_reload),
            submit_failure_policy: env_parse("SURVEY_FAILURE_POLICY", "retry|lock")?
                .unwrap_or(self.submit_failure_policy),
            image_dir: env_string("SURVEY_IMAGE_DIR").unwrap_or(self.image_dir),
            user_agent: env_string("SURVEY_USER_AGENT").unwrap_or(self.user_agent),
            page_url: env_string("SURVEY_PAGE_URL").or(self.page_url),
            age_ranges: self.age_ranges,
            experience_ranges: self.experience_ranges,
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(
    name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
