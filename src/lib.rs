//! # Pair Survey
//!
//! 一个终端 A/B 图片对比问卷客户端：从端点拉取图片对清单，逐组作答后把结果提交回同一端点
//!
//! ## 架构设计
//!
//! ### ① 端点层（Clients）
//! - `clients/` - `SurveyEndpoint` 能力定义与 reqwest 实现（清单读取、结果提交）
//!
//! ### ② 业务能力层（Services）
//! - `ImageStore` - 把内联 base64 图片写成文件
//!
//! ### ③ 流程层（Workflow）
//! - `Session` - 会话状态（口令、受访者 ID、清单、作答、提交状态）
//! - `SessionController` - 提交门控状态机 Idle → Submitting → Submitted
//! - `ConsentForm` - 知情同意表单
//!
//! ### ④ 编排层（App）
//! - `app` - 同意 → 加载 → 渲染 → 作答 → 提交 → 再来一组
//! - `frontend/` - 终端提示与卡片渲染
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod frontend;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{HttpSurveyClient, ManifestQuery, SurveyEndpoint};
pub use config::{Config, SubmitFailurePolicy};
pub use error::AppError;
pub use models::{Choice, Manifest, Pair, Question, Selection, SubmissionPayload};
pub use workflow::{SessionController, SubmissionState, SurveyOptions};
