//! 文件名中方括号标签的提取
//!
//! 图片文件名形如 `[layoutA]_park_v2.png`，方括号内是用于事后分组分析的"模式"标签。
//! 这些标签只作为提交数据里的元信息，不参与任何流程判断。

use regex::Regex;

/// 提取名称中第一个方括号片段（包含方括号）
///
/// `"[grid]_park_v2.png"` → `Some("[grid]")`，没有方括号时返回 `None`
pub fn extract_mode(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let re = Regex::new(r"\[[^\]]*\]").ok()?;
    re.find(name).map(|m| m.as_str().to_string())
}

/// 提取第一个非空方括号组的内容（不含方括号）
///
/// 用于从场景 ID 推导 layoutHash，如 `"scenario_[abc123]_v1"` → `Some("abc123")`
pub fn extract_first_bracket_content(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    let re = Regex::new(r"\[([^\]]+)\]").ok()?;
    re.captures(s)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
