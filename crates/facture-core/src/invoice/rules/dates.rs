//! Date extraction.
//!
//! Formats are tried in a fixed priority order; an earlier format wins over
//! a later one regardless of where each occurs in the text:
//!
//! 1. `YYYY-MM-DD` (also `/` and `.` separators)
//! 2. `DD/MM/YYYY` day-first numeric (also `.` and `-`; 2-digit years)
//! 3. `Month D, YYYY` with English or French month names
//! 4. `D Month YYYY` with English or French month names

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_DMY, DATE_MONTH_DAY_YEAR, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_ymd(&self, text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
        DATE_YMD
            .captures_iter(text)
            .filter_map(|caps| {
                let year: i32 = caps[1].parse().ok()?;
                let month: u32 = caps[2].parse().ok()?;
                let day: u32 = caps[3].parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                let m = caps.get(0).unwrap();
                Some(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }

    fn extract_dmy(&self, text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
        DATE_DMY
            .captures_iter(text)
            .filter_map(|caps| {
                let day: u32 = caps[1].parse().ok()?;
                let month: u32 = caps[2].parse().ok()?;
                let year = parse_year(&caps[3]);
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                let m = caps.get(0).unwrap();
                Some(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }

    fn extract_month_day_year(&self, text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
        DATE_MONTH_DAY_YEAR
            .captures_iter(text)
            .filter_map(|caps| {
                let month = month_to_number(&caps[1])?;
                let day: u32 = caps[2].parse().ok()?;
                let year: i32 = caps[3].parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                let m = caps.get(0).unwrap();
                Some(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }

    fn extract_day_month_year(&self, text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
        DATE_DAY_MONTH_YEAR
            .captures_iter(text)
            .filter_map(|caps| {
                let day: u32 = caps[1].parse().ok()?;
                let month = month_to_number(&caps[2])?;
                let year: i32 = caps[3].parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                let m = caps.get(0).unwrap();
                Some(ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_ymd(text)
            .into_iter()
            .next()
            .or_else(|| self.extract_dmy(text).into_iter().next())
            .or_else(|| self.extract_month_day_year(text).into_iter().next())
            .or_else(|| self.extract_day_month_year(text).into_iter().next())
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = self.extract_ymd(text);
        for candidate in self
            .extract_dmy(text)
            .into_iter()
            .chain(self.extract_month_day_year(text))
            .chain(self.extract_day_month_year(text))
        {
            if !results.iter().any(|r| r.value == candidate.value) {
                results.push(candidate);
            }
        }
        results
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: 00-50 are 2000s, 51-99 are 1900s.
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

/// Month name to number, English and French, accent- and case-insensitive,
/// accepting common three-letter abbreviations.
fn month_to_number(name: &str) -> Option<u32> {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    const MONTHS: [(&str, &str, u32); 12] = [
        ("january", "janvier", 1),
        ("february", "fevrier", 2),
        ("march", "mars", 3),
        ("april", "avril", 4),
        ("may", "mai", 5),
        ("june", "juin", 6),
        ("july", "juillet", 7),
        ("august", "aout", 8),
        ("september", "septembre", 9),
        ("october", "octobre", 10),
        ("november", "novembre", 11),
        ("december", "decembre", 12),
    ];

    MONTHS.iter().find_map(|(english, french, number)| {
        let abbreviated = folded.len() >= 3 && (english.starts_with(&folded) || french.starts_with(&folded));
        (folded == *english || folded == *french || abbreviated).then_some(*number)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<NaiveDate> {
        DateExtractor::new().extract(text).map(|m| m.value)
    }

    #[test]
    fn test_iso_format() {
        assert_eq!(extract("2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("2024/01/15"), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(extract("15/01/2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("15.01.2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_english_month_name() {
        assert_eq!(extract("Jan 15, 2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("January 15 2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("15 January 2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_french_month_name() {
        assert_eq!(extract("15 janvier 2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("1 août 2023"), NaiveDate::from_ymd_opt(2023, 8, 1));
        assert_eq!(extract("3 février 2024"), NaiveDate::from_ymd_opt(2024, 2, 3));
    }

    #[test]
    fn test_common_formats_normalize_identically() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        for sample in ["Jan 15, 2024", "15/01/2024", "2024-01-15"] {
            assert_eq!(extract(sample), expected, "failed for {}", sample);
            assert_eq!(
                extract(sample).unwrap().format("%Y-%m-%d").to_string(),
                "2024-01-15"
            );
        }
    }

    #[test]
    fn test_priority_order_beats_text_position() {
        // The day-first date occurs earlier, but ISO has higher priority.
        let date = extract("paid 28/02/2023 issued 2024-03-09");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(extract("15.01.24"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(extract("15.01.99"), NaiveDate::from_ymd_opt(1999, 1, 15));
    }

    #[test]
    fn test_invalid_calendar_date_skipped() {
        assert_eq!(extract("31/02/2024"), None);
        assert_eq!(extract("no date here"), None);
    }

    #[test]
    fn test_extract_all_dedupes() {
        let all = DateExtractor::new().extract_all("2024-01-15 and 15/01/2024");
        assert_eq!(all.len(), 1);
    }
}
