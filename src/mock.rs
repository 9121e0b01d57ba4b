use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::ParseError;
use crate::models::AthleteRecord;
use crate::roster::CLASS_YEARS;

pub struct DemoSchool {
    pub key: &'static str,
    pub name: &'static str,
    /// `(full name, sport)`
    pub alumni: &'static [(&'static str, &'static str)],
}

pub const DEMO_SCHOOLS: &[DemoSchool] = &[
    DemoSchool {
        key: "stanford",
        name: "Stanford University",
        alumni: &[
            ("John Elway", "Football"),
            ("Tiger Woods", "Golf"),
            ("Andrew Luck", "Football"),
            ("Christian McCaffrey", "Football"),
            ("Katie Ledecky", "Swimming"),
            ("Simone Manuel", "Swimming"),
            ("Kerri Walsh Jennings", "Volleyball"),
            ("Brook Lopez", "Basketball"),
            ("Richard Sherman", "Football"),
            ("Michelle Wie", "Golf"),
            ("Julie Foudy", "Soccer"),
            ("Zach Ertz", "Football"),
        ],
    },
    DemoSchool {
        key: "purdue",
        name: "Purdue University",
        alumni: &[
            ("Drew Brees", "Football"),
            ("Neil Armstrong", "Astronautics"),
            ("Orville Redenbacher", "Popcorn"),
            ("Bob Griese", "Football"),
            ("Glenn Robinson", "Basketball"),
            ("Brian Lamb", "Broadcasting"),
            ("Akin Ayodele", "Football"),
            ("Ryan Newman", "Racing"),
        ],
    },
];

pub fn demo_school(key: &str) -> Result<&'static DemoSchool, ParseError> {
    DEMO_SCHOOLS
        .iter()
        .find(|school| school.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| ParseError::DemoSchool(key.to_string()))
}

const LOGIN_WINDOW_MS: i64 = 10 * 24 * 60 * 60 * 1000;

/// Builds a demo roster of distinct alumni. The same `seed` and `now` always
/// produce the same roster. `count` is capped at the number of alumni.
pub fn generate_mock_roster(
    school: &DemoSchool,
    count: usize,
    seed: u64,
    now: DateTime<Utc>,
) -> Vec<AthleteRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..school.alumni.len()).collect();
    order.shuffle(&mut rng);

    order
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, index)| {
            let (name, sport) = school.alumni[index];
            let class_year = CLASS_YEARS[rng.random_range(0..CLASS_YEARS.len())];
            let login_offset = Duration::milliseconds(rng.random_range(0..LOGIN_WINDOW_MS));

            AthleteRecord {
                id: format!("mock{}", i + 1),
                full_name: Some(name.to_string()),
                sport: Some(sport.to_string()),
                class_year: Some(class_year.to_string()),
                grad_year: Some((2024 + rng.random_range(0..4)).to_string()),
                school: Some(school.name.to_string()),
                email: Some(demo_email(name)),
                phone_number: Some(format!(
                    "+1 (555) {}-{}",
                    rng.random_range(100..1000),
                    rng.random_range(1000..10000)
                )),
                profile_completion: Some(50 + rng.random_range(0..51)),
                deals_completed: Some(rng.random_range(0..20)),
                total_revenue: Some(f64::from(rng.random_range(0..20000_u32))),
                compliance_status: Some(if rng.random_bool(0.85) {
                    "All Clear".to_string()
                } else {
                    "Missing Docs".to_string()
                }),
                onboarding_complete: Some(rng.random_bool(0.8)),
                last_login: Some(now - login_offset),
            }
        })
        .collect()
}

fn demo_email(name: &str) -> String {
    format!(
        "{}@demo.edu",
        name.split_whitespace().collect::<Vec<_>>().join(".").to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_same_roster() {
        let school = demo_school("stanford").unwrap();
        let first = generate_mock_roster(school, 12, 7, fixed_now());
        let second = generate_mock_roster(school, 12, 7, fixed_now());
        assert_eq!(first, second);
    }

    #[test]
    fn alumni_are_not_repeated_and_count_is_capped() {
        let school = demo_school("Purdue").unwrap();
        let roster = generate_mock_roster(school, 50, 3, fixed_now());
        assert_eq!(roster.len(), school.alumni.len());
        let names: HashSet<&str> = roster.iter().map(|r| r.full_name()).collect();
        assert_eq!(names.len(), roster.len());
    }

    #[test]
    fn generated_values_stay_in_range() {
        let school = demo_school("stanford").unwrap();
        let now = fixed_now();
        for record in generate_mock_roster(school, 12, 99, now) {
            assert!((50..=100).contains(&record.profile_completion()));
            assert!((0..20).contains(&record.deals_completed()));
            assert!(record.total_revenue() >= 0.0 && record.total_revenue() < 20000.0);
            assert!(CLASS_YEARS.contains(&record.class_year()));
            let login = record.last_login.unwrap();
            assert!(login <= now && login > now - Duration::days(10));
            assert!(record.email.as_deref().unwrap().ends_with("@demo.edu"));
            assert_eq!(record.school.as_deref(), Some("Stanford University"));
        }
    }

    #[test]
    fn demo_email_joins_name_parts() {
        assert_eq!(demo_email("Kerri Walsh Jennings"), "kerri.walsh.jennings@demo.edu");
    }

    #[test]
    fn unknown_school_is_rejected() {
        assert!(matches!(demo_school("yale"), Err(ParseError::DemoSchool(_))));
    }
}
