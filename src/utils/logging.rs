use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::{info, warn};

use crate::models::Manifest;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n问卷会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `page`: 问卷页面地址（不含口令）
/// - `participant_id`: 本次会话的受访者 ID
pub fn log_startup(page: &str, participant_id: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 问卷客户端启动");
    info!("🌐 页面: {}", truncate_text(page, 60));
    info!("🆔 受访者: {}", participant_id);
    info!("{}", "=".repeat(60));
}

/// 记录清单加载信息
pub fn log_manifest_loaded(manifest: &Manifest) {
    info!("✓ 清单加载完成: 共 {} 组图片", manifest.pairs.len());
    info!("📋 scenarioId={} llmId={}", manifest.scenario_id, manifest.llm_id);
}

/// 记录提交结果
///
/// # 参数
/// - `answered`: 已提交的题目数量
/// - `error`: 失败原因（成功时为 `None`）
pub fn log_submission_result(answered: usize, error: Option<&str>) {
    info!("\n{}", "─".repeat(60));
    match error {
        None => info!("✅ 提交成功: {} 题", answered),
        Some(reason) => warn!("❌ 提交失败: {}", reason),
    }
    info!("{}", "─".repeat(60));
}

/// 口令脱敏，只保留前 2 个字符
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(2).collect();
    format!("{}***", visible)
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
