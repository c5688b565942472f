use crate::utils::error::{Result, StatusError};
use scraper::{ElementRef, Html, Selector};

// 這些元素的內容不會顯示給讀者（內嵌 JS、CSS、樣板）
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// 已解析的 HTML 文件。`Html` 不是 `Send`，不要跨 `.await` 持有
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// 所有符合 selector 的元素文字；沒有符合或 selector 無效時回傳 `None`
    pub fn select(&self, selector: &str) -> Option<String> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("Ignoring unparseable selector '{}': {}", selector, e);
                return None;
            }
        };

        let parts: Vec<String> = self
            .html
            .select(&selector)
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// 讀者看得到的文字，略過 `script` / `style` / `noscript` / `template`
    pub fn text(&self) -> String {
        visible_text(self.html.root_element())
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let fragments = element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        (!hidden).then_some(&**text)
    });
    collapse_whitespace(fragments)
}

fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 啟動時檢查 selector 語法，錯誤視為設定錯誤
pub fn validate_selector(field_name: &str, selector: &str) -> Result<()> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| StatusError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: selector.to_string(),
            reason: format!("Invalid CSS selector: {}", e),
        })
}
