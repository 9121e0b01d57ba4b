use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One athlete row as delivered by the profile store or the demo generator.
///
/// Every metric and display field is optional because rows written by older
/// onboarding flows may lack them. Use the accessors, which apply defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteRecord {
    pub id: String,
    pub full_name: Option<String>,
    pub sport: Option<String>,
    pub class_year: Option<String>,
    pub grad_year: Option<String>,
    pub school: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub profile_completion: Option<i32>,
    pub deals_completed: Option<i32>,
    pub total_revenue: Option<f64>,
    pub compliance_status: Option<String>,
    pub onboarding_complete: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

impl AthleteRecord {
    pub fn full_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }

    pub fn sport(&self) -> &str {
        self.sport.as_deref().unwrap_or("")
    }

    pub fn class_year(&self) -> &str {
        self.class_year.as_deref().unwrap_or("")
    }

    pub fn compliance_status(&self) -> &str {
        self.compliance_status.as_deref().unwrap_or("")
    }

    pub fn profile_completion(&self) -> i32 {
        self.profile_completion.unwrap_or(0)
    }

    pub fn deals_completed(&self) -> i32 {
        self.deals_completed.unwrap_or(0)
    }

    pub fn total_revenue(&self) -> f64 {
        self.total_revenue.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Athlete,
    Director,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Athlete => "athlete",
            Role::Director => "director",
            Role::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "athlete" => Role::Athlete,
            "director" => Role::Director,
            _ => Role::Other(value.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub role: Role,
    pub full_name: Option<String>,
    pub onboarding_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectorStats {
    pub total_athletes: usize,
    pub deals_completed: i64,
    pub total_revenue: f64,
    pub compliance_alerts: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestion {
    pub id: i32,
    pub question_text: String,
    pub question_type: String,
    pub options: serde_json::Value,
}
