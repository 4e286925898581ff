//! Display formatting for the dates and times the API returns.
//!
//! The API sends dates as `YYYY-MM-DD`, sometimes followed by `T` and a time.
//! Screens show them as `13 Jun 2025` with Spanish month abbreviations.

use tracing::warn;

const MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Formatter used by the ticket detail screen and the PDF.
///
/// Blank or missing input yields `None`; anything that cannot be split into
/// three numeric segments comes back unchanged.
pub fn format_ticket_date(input: Option<&str>) -> Option<String> {
    let input = input.filter(|s| !s.trim().is_empty())?;
    Some(format_or_original(input))
}

/// Formatter used by the flight list. Blank input is returned as-is.
pub fn format_flight_date(input: &str) -> String {
    if input.trim().is_empty() {
        return input.to_string();
    }
    format_or_original(input)
}

/// Drop the trailing seconds of a `HH:MM:SS` time.
pub fn short_time(input: &str) -> &str {
    match input.rfind(':') {
        Some(idx) => &input[..idx],
        None => input,
    }
}

fn format_or_original(input: &str) -> String {
    match format_date(input) {
        Ok(Some(formatted)) => formatted,
        Ok(None) => input.to_string(),
        Err(e) => {
            warn!(input, "failed to format date: {}", e);
            input.to_string()
        }
    }
}

/// `Ok(None)` means the input is not a three-part date at all.
fn format_date(input: &str) -> Result<Option<String>, std::num::ParseIntError> {
    let date_part = input.split('T').next().unwrap_or(input);
    let parts: Vec<&str> = date_part.split('-').collect();
    let &[year, month, day] = parts.as_slice() else {
        return Ok(None);
    };

    let month_number: i32 = month.parse()?;
    let month_name = usize::try_from(month_number)
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|idx| MONTHS.get(idx))
        .copied()
        .unwrap_or(month);
    let day_number: i32 = day.parse()?;

    Ok(Some(format!("{} {} {}", day_number, month_name, year)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_plain_date() {
        assert_eq!(format_flight_date("2025-06-13"), "13 Jun 2025");
        assert_eq!(format_ticket_date(Some("2025-06-13")).as_deref(), Some("13 Jun 2025"));
    }

    #[test]
    fn test_strips_leading_zero_from_day() {
        assert_eq!(format_flight_date("2024-01-05"), "5 Ene 2024");
    }

    #[test]
    fn test_ignores_time_part() {
        assert_eq!(format_flight_date("2025-12-01T08:45:00"), "1 Dic 2025");
    }

    #[test]
    fn test_every_month_has_spanish_abbreviation() {
        let expected = [
            "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
        ];
        for (i, name) in expected.iter().enumerate() {
            let input = format!("2025-{:02}-10", i + 1);
            assert_eq!(format_flight_date(&input), format!("10 {} 2025", name));
        }
    }

    #[test]
    fn test_out_of_range_month_keeps_raw_segment() {
        assert_eq!(format_flight_date("2025-13-02"), "2 13 2025");
        assert_eq!(format_flight_date("2025-00-02"), "2 00 2025");
    }

    #[test]
    fn test_blank_input_differs_by_call_site() {
        assert_eq!(format_flight_date(""), "");
        assert_eq!(format_flight_date("   "), "   ");
        assert_eq!(format_ticket_date(Some("")), None);
        assert_eq!(format_ticket_date(Some("  ")), None);
        assert_eq!(format_ticket_date(None), None);
    }

    #[test]
    fn test_wrong_segment_count_returns_input() {
        assert_eq!(format_flight_date("13/06/2025"), "13/06/2025");
        assert_eq!(format_flight_date("2025-06"), "2025-06");
        assert_eq!(format_ticket_date(Some("-")).as_deref(), Some("-"));
    }

    #[test]
    fn test_non_numeric_segments_return_input() {
        assert_eq!(format_flight_date("2025-jun-13"), "2025-jun-13");
        assert_eq!(format_flight_date("2025-06-xx"), "2025-06-xx");
        assert_eq!(
            format_ticket_date(Some("2025-ab-13")).as_deref(),
            Some("2025-ab-13")
        );
    }

    #[test]
    fn test_short_time() {
        assert_eq!(short_time("08:30:00"), "08:30");
        assert_eq!(short_time("08:30"), "08");
        assert_eq!(short_time("0830"), "0830");
        assert_eq!(short_time(""), "");
    }
}
