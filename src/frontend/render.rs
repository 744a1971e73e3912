//! 题目卡片渲染
//!
//! 终端里每组图片渲染为一张卡片：标题、说明，以及 A/B 两侧的图片位置。
//! 内联图片会先写到磁盘，再输出文件路径。图片对 ID 只写调试日志，不展示给受访者。

use std::io::Write;
use tracing::{debug, warn};

use crate::models::{ImageRef, Manifest};
use crate::services::ImageStore;

pub const CARD_PROMPT: &str =
    "Please select the park design that best balances aesthetic quality and passive surveillance.";

/// 卡片渲染器
pub struct CardRenderer {
    store: ImageStore,
}

impl CardRenderer {
    pub fn new(store: ImageStore) -> Self {
        debug!("内联图片目录: {}", store.dir().display());
        Self { store }
    }

    /// 渲染整份清单
    pub fn render<W: Write>(&self, out: &mut W, manifest: &Manifest) -> std::io::Result<()> {
        if let Err(e) = self.store.clear() {
            warn!("清理旧图片失败: {}", e);
        }

        for (i, pair) in manifest.pairs.iter().enumerate() {
            let qid = format!("q{}", i + 1);
            debug!("pair {} id={}", qid, pair.id);

            writeln!(out)?;
            writeln!(out, "Question {}", i + 1)?;
            writeln!(out, "{}", CARD_PROMPT)?;
            writeln!(out, "  A: {}", self.image_location(&qid, "A", &pair.left_image))?;
            writeln!(out, "  B: {}", self.image_location(&qid, "B", &pair.right_image))?;
        }
        Ok(())
    }

    /// 图片在终端中的展示位置
    fn image_location(&self, qid: &str, side: &str, image: &ImageRef) -> String {
        match image {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Missing => "(no image)".to_string(),
            ImageRef::Inline { mime, base64 } => {
                let stem = format!("{}-{}", qid, side);
                match self.store.write_inline(&stem, mime, base64) {
                    Ok(path) => path.display().to_string(),
                    Err(e) => {
                        warn!("⚠️ {} 图片无法显示: {}", stem, e);
                        "(image unavailable)".to_string()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pair;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    #[test]
    fn test_render_cards_without_pair_ids() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CardRenderer::new(ImageStore::new(dir.path().join("imgs")));

        let manifest = Manifest {
            scenario_id: "s".into(),
            llm_id: "m".into(),
            pairs: vec![Pair {
                id: "secret-folder".into(),
                left_image: ImageRef::Inline {
                    mime: "image/png".into(),
                    base64: STANDARD.encode(b"png"),
                },
                right_image: ImageRef::Url("https://img.example/r.png".into()),
                left_name: None,
                right_name: None,
            }],
        };

        let mut out = Vec::new();
        renderer.render(&mut out, &manifest).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Question 1"));
        assert!(text.contains(CARD_PROMPT));
        assert!(text.contains("q1-A.png"));
        assert!(text.contains("B: https://img.example/r.png"));
        assert!(!text.contains("secret-folder"));
    }

    #[test]
    fn test_broken_inline_image_is_reported_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CardRenderer::new(ImageStore::new(dir.path()));
        let image = ImageRef::Inline {
            mime: "image/png".into(),
            base64: "%%%".into(),
        };
        assert_eq!(renderer.image_location("q1", "A", &image), "(image unavailable)");
    }
}
