use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::FlowError;

static RE_PAGE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\s*-\s*(\d+))?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub first: u32,
    pub last: u32,
}

pub fn parse_page_range(range: &str) -> Result<Vec<PageSpan>, FlowError> {
    let mut spans = Vec::new();

    for item in range.split(',') {
        let item = item.trim();
        let capture = RE_PAGE_ITEM
            .captures(item)
            .ok_or_else(|| FlowError::invalid(format!("invalid page range item '{item}'")))?;

        let first = parse_page(capture.get(1).map(|m| m.as_str()), item)?;
        let last = match capture.get(2) {
            Some(m) => parse_page(Some(m.as_str()), item)?,
            None => first,
        };

        if first == 0 || last < first {
            return Err(FlowError::invalid(format!(
                "invalid page range item '{item}'"
            )));
        }

        spans.push(PageSpan { first, last });
    }

    Ok(spans)
}

fn parse_page(value: Option<&str>, item: &str) -> Result<u32, FlowError> {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| FlowError::invalid(format!("invalid page number in '{item}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_spans_and_pages() {
        let spans = parse_page_range("1-3, 5").unwrap();
        assert_eq!(
            spans,
            vec![
                PageSpan { first: 1, last: 3 },
                PageSpan { first: 5, last: 5 }
            ]
        );
    }

    #[test]
    fn rejects_bad_items() {
        assert!(parse_page_range("").is_err());
        assert!(parse_page_range("0").is_err());
        assert!(parse_page_range("5-2").is_err());
        assert!(parse_page_range("1,,2").is_err());
        assert!(parse_page_range("a-b").is_err());
        assert!(parse_page_range("3-").is_err());
    }
}
