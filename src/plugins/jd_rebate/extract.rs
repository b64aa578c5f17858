use regex::Regex;
use std::collections::HashMap;

/// 清理后链接的最小长度，过短的匹配视为残缺链接
pub const MIN_LINK_LEN: usize = 13;

/// 清理后仍需包含的京东域名片段
const RETAILER_MARKERS: [&str; 3] = ["jd.", "3.cn", "jingxi"];

/// 文本中匹配到的一个候选链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// 原文中的匹配片段
    pub raw: String,
    /// 去除参数后的链接
    pub cleaned: String,
    /// 匹配片段在原文中的字节区间
    pub start: usize,
    pub end: usize,
}

/// 去除 URL 中 `?` 之后的参数部分
pub fn clean_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}

pub fn is_valid_candidate(cleaned: &str) -> bool {
    cleaned.len() >= MIN_LINK_LEN && RETAILER_MARKERS.iter().any(|m| cleaned.contains(m))
}

/// 按出现顺序提取所有有效候选链接
pub fn extract_links(pattern: &Regex, text: &str) -> Vec<CandidateLink> {
    pattern
        .find_iter(text)
        .filter_map(|m| {
            let cleaned = clean_url(m.as_str());
            is_valid_candidate(cleaned).then(|| CandidateLink {
                raw: m.as_str().to_string(),
                cleaned: cleaned.to_string(),
                start: m.start(),
                end: m.end(),
            })
        })
        .collect()
}

/// 去重后的清理链接 (保持首次出现顺序)
pub fn distinct_links(candidates: &[CandidateLink]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for c in candidates {
        if !seen.contains(&c.cleaned.as_str()) {
            seen.push(&c.cleaned);
        }
    }
    seen
}

/// 按匹配区间逐段替换原文中的链接，未转换成功的片段原样保留
pub fn replace_links(
    text: &str,
    candidates: &[CandidateLink],
    converted: &HashMap<String, String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for c in candidates {
        if c.start < cursor || c.end > text.len() {
            continue;
        }
        let Some(replacement) = converted.get(&c.cleaned) else {
            continue;
        };
        out.push_str(&text[cursor..c.start]);
        out.push_str(replacement);
        cursor = c.end;
    }

    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINK_PATTERN;

    fn pattern() -> Regex {
        Regex::new(DEFAULT_LINK_PATTERN).unwrap()
    }

    #[test]
    fn finds_item_link_and_strips_query() {
        let links = extract_links(
            &pattern(),
            "看看 https://item.jd.com/100012043978.html?abc=1 不错",
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw, "https://item.jd.com/100012043978.html?abc=1");
        assert_eq!(links[0].cleaned, "https://item.jd.com/100012043978.html");
    }

    #[test]
    fn ignores_text_without_links() {
        assert!(extract_links(&pattern(), "今天天气不错 https://example.com/page").is_empty());
        assert!(extract_links(&pattern(), "").is_empty());
    }

    #[test]
    fn recognises_short_and_app_hosts() {
        let text = "a https://u.jd.com/AbCdEf b https://3.cn/1x2y3z c https://m.jingxi.com/item/1";
        let cleaned: Vec<_> = extract_links(&pattern(), text)
            .into_iter()
            .map(|c| c.cleaned)
            .collect();
        assert_eq!(
            cleaned,
            vec![
                "https://u.jd.com/AbCdEf",
                "https://3.cn/1x2y3z",
                "https://m.jingxi.com/item/1"
            ]
        );
    }

    #[test]
    fn drops_marker_found_only_in_query() {
        let links = extract_links(&pattern(), "https://example.com/?from=u.jd.com");
        assert!(links.is_empty());
    }

    #[test]
    fn drops_too_short_links() {
        assert!(!is_valid_candidate("http://jd.x"));
        assert!(is_valid_candidate("https://jd.com/a"));
    }

    #[test]
    fn cleaning_is_idempotent_and_never_grows() {
        let samples = [
            "https://item.jd.com/1.html?a=1&b=2",
            "https://item.jd.com/1.html",
            "https://u.jd.com/x??y",
            "?",
            "",
            "https://jd.com/商品?参数=值",
        ];
        for s in samples {
            let once = clean_url(s);
            assert_eq!(clean_url(once), once);
            assert!(once.len() <= s.len());
        }
    }

    #[test]
    fn replaces_each_occurrence_in_place() {
        let text = "A https://item.jd.com/1.html?x=1 B https://item.jd.com/2.html C https://item.jd.com/1.html";
        let links = extract_links(&pattern(), text);
        let mut converted = HashMap::new();
        converted.insert(
            "https://item.jd.com/1.html".to_string(),
            "https://u.jd.com/one".to_string(),
        );
        converted.insert(
            "https://item.jd.com/2.html".to_string(),
            "https://u.jd.com/two".to_string(),
        );

        assert_eq!(
            replace_links(text, &links, &converted),
            "A https://u.jd.com/one B https://u.jd.com/two C https://u.jd.com/one"
        );
    }

    #[test]
    fn unconverted_links_stay_verbatim() {
        let text = "A https://item.jd.com/1.html?x=1 B https://item.jd.com/2.html";
        let links = extract_links(&pattern(), text);
        let mut converted = HashMap::new();
        converted.insert(
            "https://item.jd.com/2.html".to_string(),
            "https://u.jd.com/two".to_string(),
        );

        assert_eq!(
            replace_links(text, &links, &converted),
            "A https://item.jd.com/1.html?x=1 B https://u.jd.com/two"
        );
    }
}
