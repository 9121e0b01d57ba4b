use std::collections::BTreeMap;

use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::mock;
use crate::models::{AthleteRecord, Profile, QuizQuestion, Role};
use crate::quiz::QuizAnswer;

const SEED_ROSTER_SEED: u64 = 2024;

const ATHLETE_COLUMNS: &str = "id::text AS id, full_name, sport, class_year, grad_year, school, \
     email, phone_number, profile_completion, deals_completed, total_revenue, \
     compliance_status, onboarding_complete, last_login";

/// Insert or refresh an athlete by email. A re-import also turns a row that
/// held another role back into an athlete.
const UPSERT_ATHLETE: &str = r#"
    INSERT INTO rootd.profiles
    (id, role, full_name, sport, class_year, grad_year, school, email, phone_number,
     profile_completion, deals_completed, total_revenue, compliance_status,
     onboarding_complete, last_login)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    ON CONFLICT (email) DO UPDATE
    SET role = EXCLUDED.role,
        full_name = EXCLUDED.full_name,
        sport = EXCLUDED.sport,
        class_year = EXCLUDED.class_year,
        grad_year = EXCLUDED.grad_year,
        school = EXCLUDED.school,
        phone_number = EXCLUDED.phone_number,
        profile_completion = EXCLUDED.profile_completion,
        deals_completed = EXCLUDED.deals_completed,
        total_revenue = EXCLUDED.total_revenue,
        compliance_status = EXCLUDED.compliance_status,
        onboarding_complete = EXCLUDED.onboarding_complete,
        last_login = EXCLUDED.last_login,
        updated_at = NOW()
    RETURNING id
"#;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_athlete(pool: &PgPool, athlete: &AthleteRecord) -> anyhow::Result<Uuid> {
    let email = athlete
        .email
        .as_deref()
        .with_context(|| format!("athlete {} has no email", athlete.full_name()))?;

    let id: Uuid = sqlx::query(UPSERT_ATHLETE)
        .bind(Uuid::new_v4())
        .bind(Role::Athlete.as_str())
        .bind(&athlete.full_name)
        .bind(&athlete.sport)
        .bind(&athlete.class_year)
        .bind(&athlete.grad_year)
        .bind(&athlete.school)
        .bind(email)
        .bind(&athlete.phone_number)
        .bind(athlete.profile_completion)
        .bind(athlete.deals_completed)
        .bind(athlete.total_revenue)
        .bind(&athlete.compliance_status)
        .bind(athlete.onboarding_complete.unwrap_or(false))
        .bind(athlete.last_login)
        .fetch_one(pool)
        .await?
        .get("id");

    Ok(id)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();

    for school in mock::DEMO_SCHOOLS {
        let director_email = format!("director@{}.edu", school.key);
        sqlx::query(
            r#"
            INSERT INTO rootd.profiles (id, role, full_name, school, email, onboarding_complete)
            VALUES ($1, 'director', $2, $3, $4, TRUE)
            ON CONFLICT (email) DO UPDATE
            SET school = EXCLUDED.school, role = EXCLUDED.role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(format!("{} NIL Director", school.name))
        .bind(school.name)
        .bind(&director_email)
        .execute(pool)
        .await?;

        let roster = mock::generate_mock_roster(school, school.alumni.len(), SEED_ROSTER_SEED, now);
        for athlete in &roster {
            upsert_athlete(pool, athlete).await?;
        }
        info!(school = school.name, athletes = roster.len(), "seeded demo roster");
    }

    let questions = vec![
        (
            1,
            "How comfortable are you promoting a local business on social media?",
            "likert",
            json!({ "label_min": "Not at all", "label_max": "Very comfortable" }),
        ),
        (
            2,
            "Which kinds of businesses would you like to partner with?",
            "checkbox",
            json!({
                "options": ["Coffee Shops", "Fitness Studios", "Restaurants", "Apparel Stores", "Bookstores", "Other"],
                "max_select": 3
            }),
        ),
        (
            3,
            "Which platform do you post on most?",
            "radio",
            json!({ "options": ["Instagram", "TikTok", "X", "YouTube", "Other"] }),
        ),
    ];

    for (id, text, question_type, options) in questions {
        sqlx::query(
            r#"
            INSERT INTO rootd.quiz_questions (id, question_text, question_type, options)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET question_text = EXCLUDED.question_text,
                question_type = EXCLUDED.question_type,
                options = EXCLUDED.options
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(question_type)
        .bind(options)
        .execute(pool)
        .await?;
    }

    Ok(())
}

fn athlete_from_row(row: &PgRow) -> AthleteRecord {
    AthleteRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        sport: row.get("sport"),
        class_year: row.get("class_year"),
        grad_year: row.get("grad_year"),
        school: row.get("school"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        profile_completion: row.get("profile_completion"),
        deals_completed: row.get("deals_completed"),
        total_revenue: row.get("total_revenue"),
        compliance_status: row.get("compliance_status"),
        onboarding_complete: row.get("onboarding_complete"),
        last_login: row.get("last_login"),
    }
}

/// Every athlete registered at `school`, in storage order.
pub async fn fetch_roster(pool: &PgPool, school: &str) -> anyhow::Result<Vec<AthleteRecord>> {
    let query = format!(
        "SELECT {ATHLETE_COLUMNS} FROM rootd.profiles WHERE school = $1 AND role = 'athlete'"
    );
    let rows = sqlx::query(&query)
        .bind(school)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to fetch roster for {school}"))?;

    debug!(school, athletes = rows.len(), "fetched roster");
    Ok(rows.iter().map(athlete_from_row).collect())
}

pub async fn fetch_profile(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Profile>> {
    let row = sqlx::query(
        "SELECT role, full_name, onboarding_complete FROM rootd.profiles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Profile {
        role: Role::from(row.get::<String, _>("role")),
        full_name: row.get("full_name"),
        onboarding_complete: row.get("onboarding_complete"),
    }))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut imported = 0usize;

    for (line, result) in reader.deserialize::<AthleteRecord>().enumerate() {
        let athlete = result.with_context(|| format!("invalid row {}", line + 1))?;
        if athlete.email.is_none() {
            warn!(row = line + 1, "skipping athlete without email");
            continue;
        }
        upsert_athlete(pool, &athlete).await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn fetch_quiz_questions(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<QuizQuestion>> {
    let rows = sqlx::query(
        "SELECT id, question_text, question_type, options FROM rootd.quiz_questions \
         ORDER BY id ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| QuizQuestion {
            id: row.get("id"),
            question_text: row.get("question_text"),
            question_type: row.get("question_type"),
            options: row.get("options"),
        })
        .collect())
}

/// Stored answers keyed by question id. Rows that cannot be read are skipped.
pub async fn fetch_quiz_answers(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<BTreeMap<i32, QuizAnswer>> {
    let rows = sqlx::query("SELECT question_id, answer FROM rootd.quiz_answers WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let mut answers = BTreeMap::new();
    for row in rows {
        let question_id: i32 = row.get("question_id");
        let raw: String = row.get("answer");
        match QuizAnswer::decode(&raw) {
            Ok(answer) => {
                answers.insert(question_id, answer);
            }
            Err(e) => warn!(question_id, error = %e, "ignoring unreadable quiz answer"),
        }
    }

    Ok(answers)
}

pub async fn upsert_quiz_answer(
    pool: &PgPool,
    user_id: Uuid,
    question_id: i32,
    answer: &QuizAnswer,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rootd.quiz_answers (user_id, question_id, answer)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, question_id) DO UPDATE
        SET answer = EXCLUDED.answer, updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .bind(answer.encode()?)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn finish_onboarding(pool: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let result = sqlx::query(
        "UPDATE rootd.profiles SET onboarding_complete = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("no profile found for {user_id}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inserted_columns() -> Vec<&'static str> {
        let start = UPSERT_ATHLETE.find('(').unwrap() + 1;
        let end = UPSERT_ATHLETE.find(')').unwrap();
        UPSERT_ATHLETE[start..end].split(',').map(str::trim).collect()
    }

    #[test]
    fn athlete_upsert_refreshes_every_column_but_the_keys() {
        let columns = inserted_columns();
        assert_eq!(columns.len(), 15);
        for column in columns {
            let assignment = format!("{column} = EXCLUDED.{column}");
            if column == "id" || column == "email" {
                assert!(!UPSERT_ATHLETE.contains(&assignment), "{column} must not change");
            } else {
                assert!(UPSERT_ATHLETE.contains(&assignment), "{column} is not refreshed");
            }
        }
    }

    #[test]
    fn athlete_upsert_binds_one_placeholder_per_column() {
        let placeholders = (1..=inserted_columns().len())
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(", ");
        assert!(UPSERT_ATHLETE.contains(&format!("VALUES ({placeholders})")));
    }
}
