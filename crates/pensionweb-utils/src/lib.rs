//! Utility functions and helpers

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a number with thousands separators (French style, space grouped)
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::new();
    let mut count = 0;
    for c in int_part.chars().rev() {
        if count == 3 {
            grouped.push(' ');
            count = 0;
        }
        grouped.push(c);
        count += 1;
    }
    let mut result: String = sign.to_string();
    result.extend(grouped.chars().rev());
    if let Some(frac) = frac_part {
        result.push(',');
        result.push_str(frac);
    }
    result
}

/// Format a currency amount with two decimals, e.g. `3 500,00 MAD`
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded);
    format!("{} {}", format_number(text), currency)
}

/// Escape text for safe inclusion in HTML element content and attribute values
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text and keep its line breaks visible in HTML
pub fn escape_multiline(content: &str) -> String {
    escape_html(content).replace('\n', "<br>")
}

/// Generate a unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Truncate a string to `max` characters, appending an ellipsis when cut
pub fn truncate_chars(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(max).collect();
    cut.push_str("...");
    cut
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(1247), "1 247");
        assert_eq!(format_number(4250000), "4 250 000");
        assert_eq!(format_number(12), "12");
        assert_eq!(format_number(-123456), "-123 456");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::from(3500), "MAD"), "3 500,00 MAD");
        assert_eq!(format_currency(Decimal::new(15005, 2), "MAD"), "150,05 MAD");
    }

    #[test]
    fn test_escape_html_neutralizes_markup() {
        let escaped = escape_html("<script>alert('x')</script> & \"q\"");
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert_eq!(
            escaped,
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; &quot;q&quot;"
        );
    }

    #[test]
    fn test_escape_multiline() {
        assert_eq!(escape_multiline("a<b\nc"), "a&lt;b<br>c");
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("Fès", 5), "Fès");
    }
}
