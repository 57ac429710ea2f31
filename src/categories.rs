//! Category recommendations embedded in assistant replies
//!
//! The assistant marks a recommendation block with a fixed banner and lists
//! codes as `品类编码：1000-04-09-01` (full- or half-width colon).

use once_cell::sync::Lazy;
use regex::Regex;

/// Banner opening a recommendation block
pub const RECOMMENDATION_MARKER: &str = "🎯 推荐品类";

/// Tag on the preferred recommendation
pub const PREFERRED_MARKER: &str = "【首选】";

static RE_CATEGORY_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:品类编码|(?i:category code))[：:]\s*([0-9-]+)").expect("valid regex")
});

/// Every category code in `answer`, in order of appearance
pub fn extract_category_codes(answer: &str) -> Vec<String> {
    RE_CATEGORY_CODE
        .captures_iter(answer)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Whether `answer` carries a category recommendation block
pub fn has_categories(answer: &str) -> bool {
    answer.contains(RECOMMENDATION_MARKER) || answer.contains(PREFERRED_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_none() {
        assert!(extract_category_codes("没有任何编码").is_empty());
        assert!(extract_category_codes("").is_empty());
    }

    #[test]
    fn test_extract_single() {
        assert_eq!(
            extract_category_codes("🎯 推荐品类 品类编码：1000-04-09-01"),
            vec!["1000-04-09-01"]
        );
    }

    #[test]
    fn test_extract_multiple_mixed_colons() {
        let answer = "品类编码：1000-04-09-01 其他文字 品类编码:2000-01";
        assert_eq!(
            extract_category_codes(answer),
            vec!["1000-04-09-01", "2000-01"]
        );
    }

    #[test]
    fn test_extract_skips_whitespace_after_colon() {
        let answer = "【首选】品类编码：  3000-12\n备选 品类编码:\t4000";
        assert_eq!(extract_category_codes(answer), vec!["3000-12", "4000"]);
    }

    #[test]
    fn test_extract_english_label() {
        assert_eq!(
            extract_category_codes("Category code: 1000-04 and category code：55"),
            vec!["1000-04", "55"]
        );
    }

    #[test]
    fn test_label_without_code_is_ignored() {
        assert!(extract_category_codes("品类编码：暂无").is_empty());
    }

    #[test]
    fn test_has_categories() {
        assert!(has_categories("🎯 推荐品类\n1. 办公家具"));
        assert!(has_categories("【首选】办公椅"));
        assert!(!has_categories("hello world"));
        assert!(!has_categories("推荐品类"));
    }
}
