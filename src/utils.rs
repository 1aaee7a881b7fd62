//! Text, number and URL helpers shared by every extractor
//!
//! All functions here are pure and total: malformed input yields `None`
//! (or the input unchanged), never a panic or an error. They do not depend on
//! the order in which extraction strategies call them.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref DECIMAL_NUMBER: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
    static ref GROUPED_COUNT: Regex = Regex::new(r"\d+[\d,]*").unwrap();
    static ref LABELLED_COUNT: Regex =
        Regex::new(r"(?i)(\d+[\d,]*)\s*(?:global\s+)?(?:ratings?|reviews?)").unwrap();
    static ref ASIN_PATTERNS: [Regex; 4] = [
        Regex::new(r"/dp/([A-Z0-9]{10})").unwrap(),
        Regex::new(r"/product/([A-Z0-9]{10})").unwrap(),
        Regex::new(r"/gp/product/([A-Z0-9]{10})").unwrap(),
        Regex::new(r"asin=([A-Z0-9]{10})").unwrap(),
    ];
}

/// Strip everything except digits and decimal points, then parse.
///
/// `"₹1,499.00"` becomes `1499.0`. Dots ahead of the first digit belong to a
/// currency abbreviation (`Rs. 1,250`) and are dropped. Empty residue or a
/// residue that is not a valid float (for example two decimal points)
/// yields `None`.
pub fn extract_numeric_price(s: &str) -> Option<f64> {
    let numeric: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let numeric = numeric.trim_start_matches('.');

    if numeric.is_empty() {
        return None;
    }

    numeric.parse::<f64>().ok()
}

/// First `digits[.digits]` substring anywhere in free text.
pub fn extract_rating(text: &str) -> Option<f64> {
    DECIMAL_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// First digit group (thousands separators allowed), separators removed.
pub fn extract_count(text: &str) -> Option<u64> {
    GROUPED_COUNT
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok())
}

/// Review count from free text.
///
/// When the text labels a number with `ratings` or `reviews`, that number is
/// taken, so `"4.4 out of 5 stars 2,345 ratings"` gives `2345`. Otherwise
/// this is [`extract_count`].
pub fn extract_review_count(text: &str) -> Option<u64> {
    match LABELLED_COUNT.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().replace(',', "").parse::<u64>().ok(),
        None => extract_count(text),
    }
}

/// Render a price the way listing pages display it, e.g. `₹1,499.00`.
pub fn format_price_display(value: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{currency}{grouped}.{fraction}")
}

/// Collapse whitespace runs to a single space and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters, no ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Cut at the last space before `max_length` characters and append `...`.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let head = truncate_chars(text, max_length);
    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };
    format!("{cut}...")
}

/// Resolve `path` against `base_url`; absolute URLs pass through untouched.
pub fn normalize_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
    }
}

/// Amazon item identifier embedded in a product URL.
pub fn extract_asin(url: &str) -> Option<String> {
    ASIN_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).map(|c| c[1].to_string()))
}

pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("₹1,499.00", Some(1499.0))]
    #[case("Rs. 2,350", Some(2350.0))]
    #[case("$19.99", Some(19.99))]
    #[case("", None)]
    #[case("Currently unavailable", None)]
    #[case("1.2.3", None)]
    #[case("Rs. 1,250", Some(1250.0))]
    #[case("Rs.. 99", Some(99.0))]
    fn numeric_price_cases(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(extract_numeric_price(input), expected);
    }

    #[rstest]
    #[case("4.5 out of 5 stars", Some(4.5))]
    #[case("Rated 4 stars", Some(4.0))]
    #[case("no stars yet", None)]
    fn rating_cases(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(extract_rating(input), expected);
    }

    #[rstest]
    #[case("12,345 ratings", Some(12345))]
    #[case("(87)", Some(87))]
    #[case("ratings", None)]
    fn count_cases(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(extract_count(input), expected);
    }

    #[rstest]
    #[case("4.4 out of 5 stars 2,345 ratings", Some(2345))]
    #[case("1 review", Some(1))]
    #[case("12,001 global ratings", Some(12001))]
    #[case("(1,204)", Some(1204))]
    #[case("no reviews yet", None)]
    fn review_count_cases(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(extract_review_count(input), expected);
    }

    #[test]
    fn leading_currency_dot_is_not_a_decimal_point() {
        assert_eq!(extract_numeric_price("₹1,499.00"), Some(1499.00));
        assert_eq!(extract_numeric_price("Rs. 1,250"), Some(1250.0));
        assert_ne!(extract_numeric_price("Rs. 1,250"), Some(0.125));
    }

    #[test]
    fn count_overflow_is_absent() {
        assert_eq!(extract_count("99999999999999999999999"), None);
    }

    #[test]
    fn price_display_groups_thousands() {
        assert_eq!(format_price_display(1499.0, "₹"), "₹1,499.00");
        assert_eq!(format_price_display(1_234_567.5, "Rs. "), "Rs. 1,234,567.50");
        assert_eq!(format_price_display(12.3, "$"), "$12.30");
    }

    proptest! {
        #[test]
        fn display_then_parse_is_identity(cents in 0u64..10_000_000_000u64) {
            let value = cents as f64 / 100.0;
            let shown = format_price_display(value, "₹");
            prop_assert_eq!(extract_numeric_price(&shown), Some(value));
        }

        #[test]
        fn normalizers_never_panic(s in "\\PC*") {
            let _ = extract_numeric_price(&s);
            let _ = extract_rating(&s);
            let _ = extract_count(&s);
            let _ = extract_review_count(&s);
        }
    }

    #[test]
    fn text_helpers() {
        assert_eq!(clean_text("  Echo   Dot\n (5th Gen) "), "Echo Dot (5th Gen)");
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("alpha beta gamma", 12), "alpha beta...");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }

    #[test]
    fn url_helpers() {
        assert_eq!(
            normalize_url("https://www.amazon.in", "/dp/B0BSHF7WHW"),
            "https://www.amazon.in/dp/B0BSHF7WHW"
        );
        assert_eq!(
            normalize_url("https://www.amazon.in/", "/gp/bestsellers/"),
            "https://www.amazon.in/gp/bestsellers/"
        );
        assert_eq!(
            normalize_url("https://www.daraz.np", "//www.daraz.np/products/x.html"),
            "https://www.daraz.np/products/x.html"
        );
        assert_eq!(
            normalize_url("https://www.daraz.np", "https://other.com/a"),
            "https://other.com/a"
        );
        assert_eq!(
            extract_asin("https://www.amazon.in/Echo/dp/B09B8YWXDF/ref=zg"),
            Some("B09B8YWXDF".to_string())
        );
        assert_eq!(extract_asin("https://www.amazon.in/s?k=echo"), None);
        assert_eq!(hostname("https://www.daraz.np/x"), Some("www.daraz.np".into()));
    }
}
