use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use fitlog_core::metrics::GoalProgress;

/// Resolve a date argument against `today`. `None` means today.
pub(crate) fn parse_date(date_str: Option<String>, today: NaiveDate) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today),
        Some(s) => match s.as_str() {
            "today" => Ok(today),
            "yesterday" => Ok(today - chrono::Duration::days(1)),
            "tomorrow" => Ok(today + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Fixed-width text progress bar, e.g. `[#####-----]`.
pub(crate) fn progress_bar(percent: f64, width: usize) -> String {
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Status line for calories against the daily goal.
pub(crate) fn calorie_status(progress: &GoalProgress) -> String {
    match progress.over_budget_by() {
        Some(over) => format!("{over} cal over budget"),
        None => format!("{} cal remaining", progress.remaining.max(0)),
    }
}

/// Status line for water against the daily goal.
pub(crate) fn water_status(progress: &GoalProgress) -> String {
    if progress.is_met() {
        "Daily goal achieved!".to_string()
    } else {
        format!("{}ml remaining", progress.remaining.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitlog_core::metrics::goal_progress;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None, today()).unwrap(), today());
    }

    #[test]
    fn test_parse_date_keywords() {
        assert_eq!(parse_date(Some("today".to_string()), today()).unwrap(), today());
        assert_eq!(
            parse_date(Some("yesterday".to_string()), today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string()), today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string()), today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string()), today()).is_err());
        assert!(parse_date(Some("2024-02-30".to_string()), today()).is_err());
    }

    #[test]
    fn test_json_error_escapes() {
        let json: serde_json::Value =
            serde_json::from_str(&json_error("Entry \"7\" not found")).unwrap();
        assert_eq!(json["error"], "Entry \"7\" not found");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème brûlée tart", 10), "Crème b...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]");
        assert_eq!(progress_bar(75.0, 4), "[###-]");
        assert_eq!(progress_bar(100.0, 4), "[####]");
        assert_eq!(progress_bar(250.0, 4), "[####]");
    }

    #[test]
    fn test_calorie_status() {
        assert_eq!(
            calorie_status(&goal_progress(1500, 2000).unwrap()),
            "500 cal remaining"
        );
        assert_eq!(
            calorie_status(&goal_progress(2500, 2000).unwrap()),
            "500 cal over budget"
        );
    }

    #[test]
    fn test_water_status() {
        assert_eq!(
            water_status(&goal_progress(2000, 2000).unwrap()),
            "Daily goal achieved!"
        );
        assert_eq!(
            water_status(&goal_progress(750, 2000).unwrap()),
            "1250ml remaining"
        );
    }
}
