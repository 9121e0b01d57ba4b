use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

mod access;
mod config;
mod db;
mod error;
mod mock;
mod models;
mod quiz;
mod report;
mod roster;

use access::Session;
use config::Config;
use models::{AthleteRecord, DirectorStats, Role};
use quiz::{QuestionKind, QuizAnswer, QuizWizard};
use roster::{DirectorContext, FilterCategory, RosterView, SortKey};

#[derive(Parser)]
#[command(name = "rootd-roster")]
#[command(about = "NIL director console for athlete rosters and onboarding", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo schools, rosters and quiz questions
    Seed,
    /// Import athlete profiles from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the filtered and sorted roster
    Roster {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate a markdown roster report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "roster-report.md")]
        out: PathBuf,
    },
    /// Export the visible roster as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "roster.csv")]
        out: PathBuf,
    },
    /// Show where a visitor requesting a path would land
    Route {
        #[arg(long)]
        signed_in: bool,
        /// Profile role; implies --signed-in
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        onboarded: bool,
        #[arg(long)]
        path: String,
        /// Navigation coming from the demo director portal
        #[arg(long)]
        demo_state: bool,
    },
    /// Work through the onboarding quiz for one athlete
    Quiz {
        #[arg(long)]
        user: Uuid,
        #[command(subcommand)]
        action: QuizAction,
    },
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .args(["school", "demo"])
        .required(true)
        .multiple(false)
))]
struct ViewArgs {
    /// School whose roster is fetched from the database
    #[arg(long)]
    school: Option<String>,
    /// Demo school key (stanford, purdue); no database needed
    #[arg(long)]
    demo: Option<String>,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    sport: Vec<String>,
    #[arg(long)]
    class_year: Vec<String>,
    /// Completion bucket label, e.g. "Complete (100%)"
    #[arg(long)]
    completion: Vec<String>,
    /// Sort requests applied in order; repeating a key flips its direction
    #[arg(long)]
    sort: Vec<SortKey>,
}

#[derive(Subcommand)]
enum QuizAction {
    /// Walk every question with the stored answers
    Show,
    /// Record an answer for one question
    Answer {
        #[arg(long)]
        question: i32,
        #[arg(long)]
        scale: Option<i64>,
        /// Option to select (radio) or toggle (checkbox)
        #[arg(long)]
        choice: Vec<String>,
        /// Free text for the "Other" option
        #[arg(long)]
        other: Option<String>,
    },
    /// Mark onboarding as complete
    Finish,
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_roster(args: &ViewArgs) -> anyhow::Result<(DirectorContext, Vec<AthleteRecord>)> {
    if let Some(key) = args.demo.as_deref() {
        let school = mock::demo_school(key)?;
        let records = mock::generate_mock_roster(school, school.alumni.len(), args.seed, Utc::now());
        info!(school = school.name, seed = args.seed, "generated demo roster");
        let context = DirectorContext {
            school: Some(school.name.to_string()),
            demo: true,
        };
        return Ok((context, records));
    }

    let school = args
        .school
        .as_deref()
        .context("either --school or --demo is required")?;
    let pool = connect(&Config::from_env()?).await?;
    let records = db::fetch_roster(&pool, school).await?;
    let context = DirectorContext {
        school: Some(school.to_string()),
        demo: false,
    };
    Ok((context, records))
}

fn build_view(context: DirectorContext, args: &ViewArgs) -> RosterView {
    let mut view = RosterView::new(context);
    view.set_search_term(args.search.as_str());

    let selections = [
        (FilterCategory::Sport, &args.sport),
        (FilterCategory::ClassYear, &args.class_year),
        (FilterCategory::ProfileCompletion, &args.completion),
    ];
    for (category, values) in selections {
        let options = category.options();
        for value in values {
            if !options.contains(&value.as_str()) {
                warn!(
                    %category,
                    value = value.as_str(),
                    "filter value is not a known option and will match nothing"
                );
            }
            view.toggle_filter(category, value);
        }
    }

    for key in &args.sort {
        view.request_sort(*key);
    }

    view
}

fn describe_answer(kind: &QuestionKind, answer: Option<&QuizAnswer>) -> String {
    match kind {
        QuestionKind::Likert {
            label_min,
            label_max,
        } => {
            let value = match answer {
                Some(QuizAnswer::Scale(value)) => value.to_string(),
                _ => format!("{} (default)", quiz::DEFAULT_SCALE),
            };
            format!("{label_min} <- {value} -> {label_max}")
        }
        QuestionKind::Radio { options } | QuestionKind::Checkbox { options, .. } => options
            .iter()
            .map(|option| {
                let selected = answer.is_some_and(|a| a.is_selected(option));
                let mark = if selected { "x" } else { " " };
                match answer.and_then(QuizAnswer::other_text) {
                    Some(text) if selected && option == quiz::OTHER => {
                        format!("[{mark}] {option}: {text}")
                    }
                    _ => format!("[{mark}] {option}"),
                }
            })
            .collect::<Vec<_>>()
            .join("  "),
    }
}

async fn run_quiz(user: Uuid, action: QuizAction) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let pool = connect(&config).await?;
    let profile = db::fetch_profile(&pool, user)
        .await?
        .with_context(|| format!("no profile found for {user}"))?;

    let session = Session::Profiled {
        role: profile.role.clone(),
        onboarding_complete: profile.onboarding_complete,
    };
    let route = access::allowed_route(&session, "/quiz", false);
    if profile.role != Role::Athlete {
        anyhow::bail!(
            "the onboarding quiz is only for athletes, {user} is a {} (lands on {route})",
            profile.role.as_str()
        );
    }
    if route != "/quiz" {
        info!(route, "onboarding already complete, answers can still be revised");
    }
    let name = profile.full_name.as_deref().unwrap_or("athlete");

    match action {
        QuizAction::Show => {
            let questions = db::fetch_quiz_questions(&pool, config.quiz_limit).await?;
            let answers = db::fetch_quiz_answers(&pool, user).await?;
            let mut wizard = QuizWizard::new(questions, answers);

            println!(
                "{name}: {} of {} questions answered.",
                wizard.answers().len(),
                wizard.question_count()
            );
            while let Some(question) = wizard.current() {
                let kind = QuestionKind::of(question)?;
                let answer = describe_answer(&kind, wizard.answer_for(question.id));
                let marker = if wizard.is_next_disabled() { " (answer required)" } else { "" };
                println!(
                    "[{:>3.0}%] Q{}: {}\n       {}{}",
                    wizard.progress(),
                    question.id,
                    question.question_text,
                    answer,
                    marker
                );
                if wizard.is_last() {
                    println!("Run `quiz finish` once every question is answered.");
                    break;
                }
                wizard.next();
            }
        }
        QuizAction::Answer {
            question,
            scale,
            choice,
            other,
        } => {
            let questions = db::fetch_quiz_questions(&pool, config.quiz_limit).await?;
            let target = questions
                .iter()
                .find(|q| q.id == question)
                .with_context(|| format!("question {question} does not exist"))?;
            let answers = db::fetch_quiz_answers(&pool, user).await?;
            let current = answers.get(&question);

            let kind = QuestionKind::of(target)?;
            let mut answer = match &kind {
                QuestionKind::Likert { .. } => {
                    QuizAnswer::scale(scale.context("--scale is required for this question")?)?
                }
                QuestionKind::Radio { options } => {
                    let picked = match choice.as_slice() {
                        [picked] => picked,
                        [] => anyhow::bail!("--choice is required for this question"),
                        _ => anyhow::bail!("question {question} takes a single --choice"),
                    };
                    quiz::select_radio(options, current, picked)?
                }
                QuestionKind::Checkbox {
                    options,
                    max_select,
                } => {
                    let mut answer = current.cloned();
                    for option in &choice {
                        quiz::check_option(options, option)?;
                        answer = Some(quiz::toggle_choice(answer.as_ref(), option, *max_select)?);
                    }
                    answer.unwrap_or(QuizAnswer::Multiple(Vec::new()))
                }
            };

            if let Some(text) = other.as_deref() {
                answer = quiz::with_other_text(Some(&answer), text)?;
            }

            db::upsert_quiz_answer(&pool, user, question, &answer).await?;
            println!(
                "Saved Q{question} for {name}: {}",
                describe_answer(&kind, Some(&answer))
            );
        }
        QuizAction::Finish => {
            db::finish_onboarding(&pool, user).await?;
            println!("Thank you {name}, your results will be emailed to you shortly.");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&Config::from_env()?).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&Config::from_env()?).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(&Config::from_env()?).await?;
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} athletes from {}.", csv.display());
        }
        Commands::Roster { view, json, limit } => {
            let (context, records) = load_roster(&view).await?;
            let roster_view = build_view(context, &view);
            let visible = roster_view.visible(&records);
            let shown = &visible[..limit.unwrap_or(visible.len()).min(visible.len())];

            if json {
                println!("{}", serde_json::to_string_pretty(shown)?);
                return Ok(());
            }

            let stats = DirectorStats::from_roster(&records);
            let context = roster_view.context();
            println!(
                "{}{}: {} athletes, {} deals, {} deal value, {} compliance alerts",
                context.school.as_deref().unwrap_or("Roster"),
                if context.demo { " (demo)" } else { "" },
                stats.total_athletes,
                stats.deals_completed,
                report::format_dollars(stats.total_revenue),
                stats.compliance_alerts
            );

            if shown.is_empty() {
                println!("No athletes match this view.");
                return Ok(());
            }

            for athlete in shown {
                println!(
                    "- {} ({}, {}) profile {}%, {} deals, {} [{}]",
                    athlete.full_name(),
                    athlete.sport(),
                    athlete.class_year(),
                    athlete.profile_completion(),
                    athlete.deals_completed(),
                    report::format_dollars(athlete.total_revenue()),
                    athlete.compliance_status()
                );
            }
        }
        Commands::Report { view, out } => {
            let (context, records) = load_roster(&view).await?;
            let roster_view = build_view(context, &view);
            let visible = roster_view.visible(&records);
            let report = report::build_report(
                roster_view.context().school.as_deref(),
                roster_view.state(),
                &DirectorStats::from_roster(&records),
                &visible,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { view, out } => {
            let (context, records) = load_roster(&view).await?;
            let roster_view = build_view(context, &view);
            let visible = roster_view.visible(&records);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::export_csv(file, &visible)?;
            println!("Exported {} athletes to {}.", visible.len(), out.display());
        }
        Commands::Route {
            signed_in,
            role,
            onboarded,
            path,
            demo_state,
        } => {
            let role = role.as_deref().map(Role::from);
            let session = Session::from_parts(signed_in || role.is_some(), role, onboarded);
            let target = access::allowed_route(&session, &path, demo_state);
            if target == path {
                println!("{path} is allowed.");
            } else {
                println!("{path} redirects to {target}.");
            }
        }
        Commands::Quiz { user, action } => run_quiz(user, action).await?,
    }

    Ok(())
}
