use crate::adapters::Document;
use crate::domain::model::{ContextWindow, KeywordRules, SourceDescriptor, Verdict};

/// 將抓回來的文件轉成單一來源的判定。不會失敗：結構不符時退回較寬的掃描，
/// 沒有任何報告則視為 `OPEN`
pub struct Extractor<'a> {
    descriptor: &'a SourceDescriptor,
}

impl<'a> Extractor<'a> {
    pub fn new(descriptor: &'a SourceDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn extract(&self, body: &str, aliases: &[String]) -> Verdict {
        let text = self.scoped_text(body);
        self.classify(&text, aliases)
    }

    fn scoped_text(&self, body: &str) -> String {
        let document = Document::parse(body);

        if let Some(selector) = self.descriptor.strategy.selector_query() {
            match document.select(selector) {
                Some(region) => return region,
                None => tracing::debug!(
                    "{}: selector '{}' matched nothing, scanning whole document",
                    self.descriptor.name,
                    selector
                ),
            }
        }

        document.text()
    }

    pub fn classify(&self, text: &str, aliases: &[String]) -> Verdict {
        let haystack = text.to_lowercase();

        let scopes = if self.descriptor.match_entity {
            let scopes = alias_scopes(&haystack, aliases, self.descriptor.strategy.context_window());
            if scopes.is_empty() {
                return Verdict::Open;
            }
            scopes
        } else {
            vec![haystack.as_str()]
        };

        classify_scopes(&scopes, &self.descriptor.keywords)
    }
}

fn classify_scopes(scopes: &[&str], keywords: &KeywordRules) -> Verdict {
    if any_keyword(scopes, &keywords.closed) {
        Verdict::Closed
    } else if any_keyword(scopes, &keywords.delayed) {
        Verdict::Delayed
    } else {
        Verdict::Open
    }
}

/// 每個別名出現處前後的文字範圍（不含別名本身）；沒有 window 時只要出現就回傳整份文件
fn alias_scopes<'t>(
    haystack: &'t str,
    aliases: &[String],
    window: Option<ContextWindow>,
) -> Vec<&'t str> {
    let mut scopes = Vec::new();

    for alias in aliases {
        let needle = alias.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }

        for (start, matched) in haystack.match_indices(needle.as_str()) {
            let Some(window) = window else {
                return vec![haystack];
            };

            if window.before > 0 {
                let from = haystack[..start]
                    .char_indices()
                    .rev()
                    .nth(window.before - 1)
                    .map_or(0, |(offset, _)| offset);
                scopes.push(&haystack[from..start]);
            }

            let after = start + matched.len();
            let end = haystack[after..]
                .char_indices()
                .nth(window.after)
                .map(|(offset, _)| after + offset)
                .unwrap_or(haystack.len());
            scopes.push(&haystack[after..end]);
        }
    }

    scopes
}

fn any_keyword(scopes: &[&str], keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        let keyword = keyword.trim().to_lowercase();
        !keyword.is_empty() && scopes.iter().any(|scope| contains_word(scope, &keyword))
    })
}

// "disclosed" 不應該命中 "closed"
fn contains_word(scope: &str, word: &str) -> bool {
    scope.match_indices(word).any(|(start, matched)| {
        let before = scope[..start].chars().next_back();
        let after = scope[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ExtractionStrategy;

    fn aliases() -> Vec<String> {
        vec!["Example District".to_string(), "EXD".to_string()]
    }

    fn windowed(window: usize) -> SourceDescriptor {
        SourceDescriptor::new("news", "https://news.example.com")
            .with_strategy(ExtractionStrategy::windowed(window))
    }

    #[test]
    fn test_entity_absent_is_open() {
        let source = SourceDescriptor::new("news", "https://news.example.com");
        let verdict = Extractor::new(&source).classify("Other County: CLOSED", &aliases());
        assert_eq!(verdict, Verdict::Open);
    }

    #[test]
    fn test_whole_document_scan() {
        let source = SourceDescriptor::new("news", "https://news.example.com");
        let extractor = Extractor::new(&source);

        assert_eq!(
            extractor.classify("Schools CLOSED due to weather. Example District confirmed.", &aliases()),
            Verdict::Closed
        );
        assert_eq!(
            extractor.classify("example district will operate on a 2-hour delay", &aliases()),
            Verdict::Delayed
        );
        assert_eq!(
            extractor.classify("Example District: normal schedule", &aliases()),
            Verdict::Open
        );
    }

    #[test]
    fn test_window_excludes_unrelated_mentions() {
        let source = windowed(30);
        let extractor = Extractor::new(&source);

        let outside = "Lakeside CLOSED due to weather ... Example District open as usual";
        assert_eq!(extractor.classify(outside, &aliases()), Verdict::Open);

        let inside = "Lakeside open ... Example District CLOSED due to weather";
        assert_eq!(extractor.classify(inside, &aliases()), Verdict::Closed);
    }

    #[test]
    fn test_window_reaching_back_before_the_name() {
        let text = "... CLOSED due to weather ... Example District ...";

        let forward_only = windowed(40);
        assert_eq!(Extractor::new(&forward_only).classify(text, &aliases()), Verdict::Open);

        let looking_back = SourceDescriptor::new("news", "https://news.example.com")
            .with_strategy(ExtractionStrategy::windowed(40).looking_back(40));
        assert_eq!(Extractor::new(&looking_back).classify(text, &aliases()), Verdict::Closed);

        let too_short = SourceDescriptor::new("news", "https://news.example.com")
            .with_strategy(ExtractionStrategy::windowed(40).looking_back(10));
        assert_eq!(Extractor::new(&too_short).classify(text, &aliases()), Verdict::Open);
    }

    #[test]
    fn test_window_bounds_are_in_characters() {
        let source = windowed(10);
        let extractor = Extractor::new(&source);

        let text = "Example District – école ouverte, puis CLOSED";
        assert_eq!(extractor.classify(text, &aliases()), Verdict::Open);
    }

    #[test]
    fn test_any_alias_occurrence_counts() {
        let source = windowed(20);
        let extractor = Extractor::new(&source);

        let text = "Example District: open. Later update: EXD two-hour delay";
        assert_eq!(extractor.classify(text, &aliases()), Verdict::Delayed);
    }

    #[test]
    fn test_closure_outranks_delay() {
        let source = SourceDescriptor::new("news", "https://news.example.com");
        let text = "Example District: delayed opening cancelled, now closed";
        assert_eq!(Extractor::new(&source).classify(text, &aliases()), Verdict::Closed);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let source = SourceDescriptor::new("news", "https://news.example.com");
        let text = "Example District disclosed its budget";
        assert_eq!(Extractor::new(&source).classify(text, &aliases()), Verdict::Open);
    }

    #[test]
    fn test_custom_keywords() {
        let mut source = SourceDescriptor::new("news", "https://news.example.com");
        source.keywords.closed = vec!["cancelled".to_string()];
        let text = "Example District classes cancelled";
        assert_eq!(Extractor::new(&source).classify(text, &aliases()), Verdict::Closed);
    }

    #[test]
    fn test_selector_narrows_document() {
        let source = SourceDescriptor::new("district", "https://district.example.com")
            .with_strategy(ExtractionStrategy::selector("div.alert", None))
            .without_entity_match();
        let page = r#"<html><body>
            <div class="alert">Two-hour delay today</div>
            <footer>Office closed on Sundays</footer>
        </body></html>"#;

        assert_eq!(Extractor::new(&source).extract(page, &aliases()), Verdict::Delayed);
    }

    #[test]
    fn test_selector_missing_region_falls_back() {
        let source = SourceDescriptor::new("district", "https://district.example.com")
            .with_strategy(ExtractionStrategy::selector("div.alert", None));
        let page = "<html><body><p>Example District is CLOSED</p></body></html>";

        assert_eq!(Extractor::new(&source).extract(page, &aliases()), Verdict::Closed);
    }

    #[test]
    fn test_selector_with_window() {
        let source = SourceDescriptor::new("tv", "https://tv.example.com")
            .with_strategy(ExtractionStrategy::selector("ul.closings li", Some(25)));
        let page = r#"<html><body>
            <p>Storm coverage: dozens of schools closed</p>
            <ul class="closings">
              <li>Lakeside Schools: Closed</li>
              <li>Example District: 2-Hour Delay</li>
            </ul>
        </body></html>"#;

        assert_eq!(Extractor::new(&source).extract(page, &aliases()), Verdict::Delayed);
    }

    #[test]
    fn test_inline_script_does_not_count_as_report() {
        let source = SourceDescriptor::new("district", "https://district.example.com");
        let page = r#"<head><script>var bannerState = "closed";</script></head><body><h1>Example District</h1><p>Have a great week!</p></body>"#;

        assert_eq!(Extractor::new(&source).extract(page, &aliases()), Verdict::Open);
    }

    #[test]
    fn test_garbage_input_never_errors() {
        let source = SourceDescriptor::new("news", "https://news.example.com");
        assert_eq!(Extractor::new(&source).extract("", &aliases()), Verdict::Open);
        assert_eq!(
            Extractor::new(&source).extract("<<<>>> \u{0} </div>", &aliases()),
            Verdict::Open
        );
    }
}
