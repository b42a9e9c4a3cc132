use crate::domain::balance_sheet::BalanceSheetRecord;

pub const NO_DATA: &str = "No data available";

/// Human-readable balance sheet: a dated header, one line per required field,
/// then one line per optional metric present on the record.
pub fn format_report(record: Option<&BalanceSheetRecord>) -> String {
    let Some(record) = record else {
        return NO_DATA.to_string();
    };

    let mut lines = vec![format!(
        "Most Recent Balance Sheet Data (as of {}):",
        record.report_date
    )];

    for (label, value) in record.required_fields() {
        lines.push(format!("{label}: {}", format_currency(value)));
    }

    for (metric, value) in record.present_metrics() {
        lines.push(format!(
            "{}: {}",
            title_case(metric.key()),
            format_currency(value)
        ));
    }

    lines.join("\n")
}

/// `$` amount with two decimals and comma thousands separators, e.g. `$-1,234.50`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    let sign = if value.is_sign_negative() && fixed != "0.00" {
        "-"
    } else {
        ""
    };
    format!("${sign}{grouped}.{frac_part}")
}

/// `total_revenue` -> `Total Revenue`.
pub fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
