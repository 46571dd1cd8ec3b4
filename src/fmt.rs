pub const CURRENCY_SYMBOL: &str = "R$";

/// Format minor units as Brazilian reais with thousands separators: R$ 1.234,56
pub fn money(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let int_part = (abs / 100).to_string();
    let dec_part = abs % 100;

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-{CURRENCY_SYMBOL} {with_dots},{dec_part:02}")
    } else {
        format!("{CURRENCY_SYMBOL} {with_dots},{dec_part:02}")
    }
}

/// Plain decimal form used in exports and edit prompts: 1234.56
pub fn decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
