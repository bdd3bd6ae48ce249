//! Price display helpers for Vietnamese listings.
//!
//! Prices are stored as whole VND amounts. A zero price means the seller
//! did not publish one, which renders as the contact sentinel instead of "0".

/// Format a raw price for display: billions as "tỷ", millions as "triệu",
/// thousands as "k", anything smaller grouped per vi-VN convention.
pub fn format_price(price: i64, currency: &str) -> String {
    if price == 0 {
        return "Liên hệ".to_string();
    }

    if currency == "VND" {
        if price >= 1_000_000_000 {
            return format!("{:.1} tỷ", price as f64 / 1_000_000_000.0);
        } else if price >= 1_000_000 {
            return format!("{} triệu", (price + 500_000) / 1_000_000);
        } else if price >= 1_000 {
            return format!("{}k", (price + 500) / 1_000);
        }
        return group_digits(price, ".");
    }

    format!("{} {}", group_digits(price, ","), currency)
}

/// Format a project price range; zero marks an absent bound.
pub fn format_price_range(price_from: i64, price_to: i64) -> String {
    match (price_from, price_to) {
        (0, 0) => "Liên hệ".to_string(),
        (from, 0) => format!("Từ {}", format_price(from, "VND")),
        (0, to) => format!("Đến {}", format_price(to, "VND")),
        (from, to) => format!(
            "{} - {}",
            format_price(from, "VND"),
            format_price(to, "VND")
        ),
    }
}

fn group_digits(value: i64, sep: &str) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    while end > 3 {
        groups.push(&digits[end - 3..end]);
        end -= 3;
    }
    groups.push(&digits[..end]);
    groups.reverse();
    let joined = groups.join(sep);
    if value < 0 {
        format!("-{}", joined)
    } else {
        joined
    }
}
