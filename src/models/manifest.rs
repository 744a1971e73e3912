use serde::Deserialize;

use crate::error::ManifestLoadError;

/// 清单接口的原始响应
///
/// 端点在失败时只返回 `{ ok: false, error }`，所以除 `ok` 外的字段都允许缺省
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub scenario_id: String,
    #[serde(default)]
    pub llm_id: String,
    #[serde(default)]
    pub pairs: Option<Vec<PairPayload>>,
}

/// 清单中单个图片对的原始字段
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairPayload {
    #[serde(default)]
    pub id: String,
    pub left_name: Option<String>,
    pub right_name: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub left_b64: Option<String>,
    pub left_mime: Option<String>,
    pub right_b64: Option<String>,
    pub right_mime: Option<String>,
}

impl ManifestResponse {
    /// 校验响应信封并转换为清单
    pub fn into_manifest(self) -> Result<Manifest, ManifestLoadError> {
        if !self.ok {
            return Err(ManifestLoadError::rejected(self.error));
        }

        let pairs = self
            .pairs
            .unwrap_or_default()
            .into_iter()
            .map(Pair::from)
            .collect();

        Ok(Manifest {
            scenario_id: self.scenario_id,
            llm_id: self.llm_id,
            pairs,
        })
    }
}

/// 一份问卷清单（场景 + 模型 + 图片对列表）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub scenario_id: String,
    pub llm_id: String,
    pub pairs: Vec<Pair>,
}

/// 一组 A/B 对比
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub id: String,
    pub left_image: ImageRef,
    pub right_image: ImageRef,
    pub left_name: Option<String>,
    pub right_name: Option<String>,
}

impl From<PairPayload> for Pair {
    fn from(raw: PairPayload) -> Self {
        Self {
            id: raw.id,
            left_image: ImageRef::resolve(raw.left_b64, raw.left_mime, raw.left),
            right_image: ImageRef::resolve(raw.right_b64, raw.right_mime, raw.right),
            left_name: raw.left_name.filter(|n| !n.is_empty()),
            right_name: raw.right_name.filter(|n| !n.is_empty()),
        }
    }
}

/// 图片来源：内联 base64 或远程 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Inline { mime: String, base64: String },
    Url(String),
    Missing,
}

impl ImageRef {
    /// base64 + mime 同时存在时优先使用内联数据，否则退回 URL 字段
    pub fn resolve(b64: Option<String>, mime: Option<String>, url: Option<String>) -> Self {
        match (non_empty(b64), non_empty(mime)) {
            (Some(base64), Some(mime)) => ImageRef::Inline { mime, base64 },
            _ => match non_empty(url) {
                Some(url) => ImageRef::Url(url),
                None => ImageRef::Missing,
            },
        }
    }

    /// 可直接放进 `<img src>` 的地址
    pub fn src(&self) -> String {
        match self {
            ImageRef::Inline { mime, base64 } => format!("data:{};base64,{}", mime, base64),
            ImageRef::Url(url) => url.clone(),
            ImageRef::Missing => String::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ManifestResponse {
        serde_json::from_str(json).expect("无法解析测试 JSON")
    }

    #[test]
    fn test_rejected_envelope_carries_endpoint_error() {
        let err = parse(r#"{"ok": false, "error": "expired token"}"#)
            .into_manifest()
            .unwrap_err();
        assert_eq!(err.to_string(), "expired token");
    }

    #[test]
    fn test_rejected_envelope_without_error_uses_fallback() {
        let err = parse(r#"{"ok": false}"#).into_manifest().unwrap_err();
        assert_eq!(err.to_string(), "manifest error");
    }

    #[test]
    fn test_missing_pairs_is_empty_manifest() {
        let manifest = parse(r#"{"ok": true, "scenarioId": "s", "llmId": "m"}"#)
            .into_manifest()
            .unwrap();
        assert!(manifest.pairs.is_empty());
        assert_eq!(manifest.scenario_id, "s");
    }

    #[test]
    fn test_inline_image_preferred_over_url() {
        let manifest = parse(
            r#"{"ok": true, "scenarioId": "s", "llmId": "m", "pairs": [{
                "id": "p1",
                "left": "https://img.example/l.png",
                "leftB64": "iVBORw0KGgo=",
                "leftMime": "image/png",
                "right": "https://img.example/r.png",
                "leftName": "[grid]_a.png",
                "rightName": ""
            }]}"#,
        )
        .into_manifest()
        .unwrap();

        let pair = &manifest.pairs[0];
        assert_eq!(pair.left_image.src(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(pair.right_image, ImageRef::Url("https://img.example/r.png".into()));
        assert_eq!(pair.left_name.as_deref(), Some("[grid]_a.png"));
        assert_eq!(pair.right_name, None);
    }

    #[test]
    fn test_base64_without_mime_falls_back_to_url() {
        let image = ImageRef::resolve(Some("AAAA".into()), None, Some("u".into()));
        assert_eq!(image, ImageRef::Url("u".into()));
        assert_eq!(ImageRef::resolve(None, None, None).src(), "");
    }
}
