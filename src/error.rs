use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 知情同意未完成
    #[error("同意流程未完成: {0}")]
    Consent(#[from] ConsentError),
    /// 问卷清单加载错误
    #[error("清单加载错误: {0}")]
    Manifest(#[from] ManifestLoadError),
    /// 表单校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 提交错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 知情同意错误
///
/// 正常情况下不会作为错误展示，只会让"继续"保持禁用
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsentError {
    /// 未勾选同意
    #[error("You must consent to continue.")]
    NotConsented,
    /// 未填写口令
    #[error("Please enter the secret token.")]
    MissingToken,
    /// 输入流在完成同意前结束
    #[error("输入已结束，未完成知情同意")]
    InputClosed,
}

/// 问卷清单加载错误
#[derive(Debug, Error)]
pub enum ManifestLoadError {
    /// 尚未获得口令
    #[error("Please enter the secret token.")]
    MissingToken,
    /// 已有清单、正在加载或正在提交时不允许再次加载
    #[error("A form is already loaded.")]
    NotAllowed,
    /// 只有提交成功后才能加载下一组
    #[error("Submit the current set before loading another one.")]
    ReloadNotAllowed,
    /// 网络请求失败
    #[error("{source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 端点返回 ok=false
    #[error("{message}")]
    Rejected { message: String },
    /// 响应解析失败
    #[error("Could not read the form: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ManifestLoadError {
    /// 端点未给出原因时使用的兜底文案
    pub const FALLBACK_MESSAGE: &'static str = "manifest error";

    /// 根据端点返回的 error 字段构造错误
    pub fn rejected(message: Option<String>) -> Self {
        ManifestLoadError::Rejected {
            message: non_empty_or(message, Self::FALLBACK_MESSAGE),
        }
    }

    /// 创建网络请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ManifestLoadError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}

/// 表单校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 仍有未作答的题目
    #[error("Please answer all questions.")]
    UnansweredQuestions,
    /// 人口统计信息不完整
    #[error("Please complete the demographics section before submitting.")]
    IncompleteDemographics,
    /// 题目序号不存在
    #[error("Question {index} does not exist (there are {total}).")]
    UnknownQuestion { index: usize, total: usize },
    /// 当前变体不允许的选项
    #[error("Choice {choice} is not available.")]
    ChoiceNotAllowed { choice: String },
    /// 当前变体不收集人口统计信息
    #[error("This survey does not collect demographics.")]
    DemographicsDisabled,
    /// 选项值不在允许列表中
    #[error("'{value}' is not a valid {field}.")]
    UnknownOption { field: &'static str, value: String },
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 当前状态不允许提交（正在提交或已提交）
    #[error("These answers have already been submitted.")]
    NotAllowed,
    /// 本地校验未通过
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// 网络请求失败
    #[error("{source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 端点返回 ok=false
    #[error("{message}")]
    Rejected { message: String },
    /// 序列化或解析失败
    #[error("Could not prepare the submission: {source}")]
    JsonFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SubmissionError {
    /// 端点未给出原因时使用的兜底文案
    pub const FALLBACK_MESSAGE: &'static str = "submit failed";

    /// 根据端点返回的 error 字段构造错误
    pub fn rejected(message: Option<String>) -> Self {
        SubmissionError::Rejected {
            message: non_empty_or(message, Self::FALLBACK_MESSAGE),
        }
    }

    /// 创建网络请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SubmissionError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 选项列表为空
    #[error("配置项 {field} 不能为空列表")]
    EmptyOptions { field: &'static str },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {source}")]
    HttpClientBuildFailed {
        #[source]
        source: reqwest::Error,
    },
    /// 端点地址非法
    #[error("端点地址非法 '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 图片内容不是合法的 base64
    #[error("图片解码失败 ({name}): {source}")]
    DecodeFailed {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn non_empty_or(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
