use std::fmt::Write;

use serde::Serialize;

use crate::models::{AthleteRecord, DirectorStats};
use crate::roster::RosterState;

pub const ALL_CLEAR: &str = "All Clear";

impl DirectorStats {
    /// Totals for the director dashboard, taken over the whole roster.
    pub fn from_roster(records: &[AthleteRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total_athletes += 1;
            stats.deals_completed += i64::from(record.deals_completed());
            stats.total_revenue += record.total_revenue();
            if record.compliance_status.as_deref() != Some(ALL_CLEAR) {
                stats.compliance_alerts += 1;
            }
            stats
        })
    }
}

/// Whole dollars with thousands separators, e.g. `$85,000`.
pub fn format_dollars(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::new();

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn build_report(
    school: Option<&str>,
    state: &RosterState,
    stats: &DirectorStats,
    visible: &[&AthleteRecord],
) -> String {
    let mut output = String::new();
    let school_label = school.unwrap_or("all schools");

    let _ = writeln!(output, "# Athlete Roster Report");
    let _ = writeln!(output, "Generated for {school_label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Program Totals");
    let _ = writeln!(output, "- Total athletes: {}", stats.total_athletes);
    let _ = writeln!(output, "- Deals completed: {}", stats.deals_completed);
    let _ = writeln!(output, "- Deal value: {}", format_dollars(stats.total_revenue));
    let _ = writeln!(output, "- Compliance alerts: {}", stats.compliance_alerts);

    let _ = writeln!(output);
    let _ = writeln!(output, "## View");
    if state.search_term.is_empty() {
        let _ = writeln!(output, "- Search: none");
    } else {
        let _ = writeln!(output, "- Search: \"{}\"", state.search_term);
    }

    if state.filters.is_empty() {
        let _ = writeln!(output, "- Filters: none");
    } else {
        for (category, value) in state.filters.active_filters() {
            let _ = writeln!(output, "- Filter {category}: {value}");
        }
    }
    let _ = writeln!(
        output,
        "- Sorted by {} ({:?})",
        state.sort.key, state.sort.direction
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Athletes ({})", visible.len());

    if visible.is_empty() {
        let _ = writeln!(output, "No athletes match this view.");
    } else {
        let _ = writeln!(
            output,
            "| Name | Sport | Class Year | Profile % | Deals | Revenue | Compliance |"
        );
        let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- | --- |");
        for athlete in visible {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {}% | {} | {} | {} |",
                athlete.full_name(),
                athlete.sport(),
                athlete.class_year(),
                athlete.profile_completion(),
                athlete.deals_completed(),
                format_dollars(athlete.total_revenue()),
                athlete.compliance_status()
            );
        }
    }

    output
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    full_name: &'a str,
    email: &'a str,
    phone_number: &'a str,
    sport: &'a str,
    class_year: &'a str,
    grad_year: &'a str,
    profile_completion: i32,
    deals_completed: i32,
    total_revenue: f64,
    compliance_status: &'a str,
}

pub fn export_csv<W: std::io::Write>(writer: W, visible: &[&AthleteRecord]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    for athlete in visible {
        csv.serialize(ExportRow {
            id: &athlete.id,
            full_name: athlete.full_name(),
            email: athlete.email.as_deref().unwrap_or(""),
            phone_number: athlete.phone_number.as_deref().unwrap_or(""),
            sport: athlete.sport(),
            class_year: athlete.class_year(),
            grad_year: athlete.grad_year.as_deref().unwrap_or(""),
            profile_completion: athlete.profile_completion(),
            deals_completed: athlete.deals_completed(),
            total_revenue: athlete.total_revenue(),
            compliance_status: athlete.compliance_status(),
        })?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{DirectorContext, FilterCategory, RosterView};

    fn roster() -> Vec<AthleteRecord> {
        vec![
            AthleteRecord {
                id: "1".to_string(),
                full_name: Some("Drew Brees".to_string()),
                sport: Some("Football".to_string()),
                deals_completed: Some(3),
                total_revenue: Some(12500.0),
                compliance_status: Some("All Clear".to_string()),
                profile_completion: Some(100),
                ..AthleteRecord::default()
            },
            AthleteRecord {
                id: "2".to_string(),
                full_name: Some("Ryan Newman".to_string()),
                sport: Some("Racing".to_string()),
                deals_completed: Some(2),
                total_revenue: Some(800.0),
                compliance_status: Some("Missing Docs".to_string()),
                ..AthleteRecord::default()
            },
            AthleteRecord {
                id: "3".to_string(),
                full_name: Some("Brian Lamb".to_string()),
                ..AthleteRecord::default()
            },
        ]
    }

    #[test]
    fn stats_cover_the_whole_roster() {
        let stats = DirectorStats::from_roster(&roster());
        assert_eq!(stats.total_athletes, 3);
        assert_eq!(stats.deals_completed, 5);
        assert!((stats.total_revenue - 13300.0).abs() < f64::EPSILON);
        // missing status counts as an alert
        assert_eq!(stats.compliance_alerts, 2);
    }

    #[test]
    fn dollars_are_grouped() {
        assert_eq!(format_dollars(0.0), "$0");
        assert_eq!(format_dollars(999.4), "$999");
        assert_eq!(format_dollars(85000.0), "$85,000");
        assert_eq!(format_dollars(1234567.0), "$1,234,567");
    }

    #[test]
    fn report_lists_view_and_rows_in_order() {
        let records = roster();
        let mut view = RosterView::new(DirectorContext::default());
        view.toggle_filter(FilterCategory::Sport, "Football");
        let visible = view.visible(&records);
        let report = build_report(
            Some("Purdue University"),
            view.state(),
            &DirectorStats::from_roster(&records),
            &visible,
        );

        assert!(report.contains("Generated for Purdue University"));
        assert!(report.contains("- Deal value: $13,300"));
        assert!(report.contains("- Filter sport: Football"));
        assert!(report.contains("- Sorted by full_name (Ascending)"));
        assert!(report.contains("## Athletes (1)"));
        assert!(report.contains("| Drew Brees | Football |  | 100% | 3 | $12,500 | All Clear |"));
        assert!(!report.contains("Ryan Newman"));
    }

    #[test]
    fn empty_view_is_reported() {
        let report = build_report(None, &RosterState::default(), &DirectorStats::default(), &[]);
        assert!(report.contains("Generated for all schools"));
        assert!(report.contains("No athletes match this view."));
    }

    #[test]
    fn csv_export_applies_defaults() {
        let records = roster();
        let visible: Vec<&AthleteRecord> = records.iter().collect();
        let mut buffer = Vec::new();
        export_csv(&mut buffer, &visible).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,full_name,email,phone_number,sport,class_year,grad_year,profile_completion,deals_completed,total_revenue,compliance_status"
        );
        assert_eq!(lines[3], "3,Brian Lamb,,,,,,0,0,0.0,");
        assert_eq!(lines.len(), 4);
    }
}
