use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

/// Fresh record id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC time as RFC 3339 text (`2024-05-01T18:30:00.000Z`)
///
/// Stored timestamps use this form so that lexicographic order equals
/// chronological order inside the data store.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Inclusive bounds covering one calendar day, as the order filter uses them
pub fn day_window(date: NaiveDate) -> (String, String) {
    let day = date.format("%Y-%m-%d");
    (format!("{day}T00:00:00"), format!("{day}T23:59:59"))
}

/// Format a money value as Brazilian Real (`R$ 12,50`)
pub fn format_currency(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("R$ {:.2}", v.round_dp(2)).replace('.', ","),
        None => "R$ 0,00".to_string(),
    }
}

/// Format a stored timestamp as `dd/MM/yyyy HH:mm`
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` and plain dates.
/// Returns an empty string when the input is empty or unparsable.
pub fn format_order_date(value: &str) -> String {
    const OUT: &str = "%d/%m/%Y %H:%M";
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format(OUT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return dt.format(OUT).to_string();
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return d.format("%d/%m/%Y 00:00").to_string();
    }
    String::new()
}
