//! Director roster view: search, per-category filters and a single sort key
//! over an already-loaded list of athletes.
//!
//! Everything here is a pure function of its inputs. Records are only ever
//! borrowed, selected and reordered.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::models::AthleteRecord;

pub const SPORTS: &[&str] = &[
    "Football",
    "Golf",
    "Swimming",
    "Volleyball",
    "Basketball",
    "Soccer",
    "Tennis",
    "Baseball",
    "Track & Field",
    "Astronautics",
    "Popcorn",
    "Broadcasting",
    "Racing",
];

pub const CLASS_YEARS: &[&str] = &["Freshman", "Sophomore", "Junior", "Senior", "Graduate"];

/// Named, mutually exclusive ranges over the 0-100 profile completion value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionBucket {
    Complete,
    InProgress,
    Incomplete,
}

impl CompletionBucket {
    pub const ALL: [CompletionBucket; 3] = [
        CompletionBucket::Complete,
        CompletionBucket::InProgress,
        CompletionBucket::Incomplete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompletionBucket::Complete => "Complete (100%)",
            CompletionBucket::InProgress => "In Progress (50-99%)",
            CompletionBucket::Incomplete => "Incomplete (<50%)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }

    pub fn contains(self, completion: i32) -> bool {
        match self {
            CompletionBucket::Complete => completion == 100,
            CompletionBucket::InProgress => (50..100).contains(&completion),
            CompletionBucket::Incomplete => completion < 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    Sport,
    ClassYear,
    ProfileCompletion,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 3] = [
        FilterCategory::Sport,
        FilterCategory::ClassYear,
        FilterCategory::ProfileCompletion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterCategory::Sport => "sport",
            FilterCategory::ClassYear => "class_year",
            FilterCategory::ProfileCompletion => "profile_completion",
        }
    }

    /// Values a director can pick from for this category.
    pub fn options(self) -> Vec<&'static str> {
        match self {
            FilterCategory::Sport => SPORTS.to_vec(),
            FilterCategory::ClassYear => CLASS_YEARS.to_vec(),
            FilterCategory::ProfileCompletion => {
                CompletionBucket::ALL.iter().map(|b| b.label()).collect()
            }
        }
    }
}

impl FromStr for FilterCategory {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FilterCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| ParseError::FilterCategory(value.to_string()))
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected values per category. An empty set means the category does not
/// constrain the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub sport: BTreeSet<String>,
    pub class_year: BTreeSet<String>,
    pub profile_completion: BTreeSet<String>,
}

impl FilterState {
    pub fn selection(&self, category: FilterCategory) -> &BTreeSet<String> {
        match category {
            FilterCategory::Sport => &self.sport,
            FilterCategory::ClassYear => &self.class_year,
            FilterCategory::ProfileCompletion => &self.profile_completion,
        }
    }

    fn selection_mut(&mut self, category: FilterCategory) -> &mut BTreeSet<String> {
        match category {
            FilterCategory::Sport => &mut self.sport,
            FilterCategory::ClassYear => &mut self.class_year,
            FilterCategory::ProfileCompletion => &mut self.profile_completion,
        }
    }

    pub fn is_empty(&self) -> bool {
        FilterCategory::ALL
            .iter()
            .all(|category| self.selection(*category).is_empty())
    }

    /// Every selection flattened to `(category, value)` pairs, in category order.
    pub fn active_filters(&self) -> Vec<(FilterCategory, &str)> {
        FilterCategory::ALL
            .iter()
            .flat_map(|category| {
                self.selection(*category)
                    .iter()
                    .map(move |value| (*category, value.as_str()))
            })
            .collect()
    }

    fn matches(&self, record: &AthleteRecord) -> bool {
        let sport_match = self.sport.is_empty() || self.sport.contains(record.sport());
        let year_match = self.class_year.is_empty() || self.class_year.contains(record.class_year());
        let completion_match = self.profile_completion.is_empty()
            || self
                .profile_completion
                .iter()
                .filter_map(|label| CompletionBucket::from_label(label))
                .any(|bucket| bucket.contains(record.profile_completion()));

        sport_match && year_match && completion_match
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    FullName,
    Sport,
    ClassYear,
    ProfileCompletion,
    DealsCompleted,
    TotalRevenue,
    ComplianceStatus,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::FullName,
        SortKey::Sport,
        SortKey::ClassYear,
        SortKey::ProfileCompletion,
        SortKey::DealsCompleted,
        SortKey::TotalRevenue,
        SortKey::ComplianceStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::FullName => "full_name",
            SortKey::Sport => "sport",
            SortKey::ClassYear => "class_year",
            SortKey::ProfileCompletion => "profile_completion",
            SortKey::DealsCompleted => "deals_completed",
            SortKey::TotalRevenue => "total_revenue",
            SortKey::ComplianceStatus => "compliance_status",
        }
    }

    fn compare(self, a: &AthleteRecord, b: &AthleteRecord) -> Ordering {
        match self {
            SortKey::FullName => a.full_name().cmp(b.full_name()),
            SortKey::Sport => a.sport().cmp(b.sport()),
            SortKey::ClassYear => a.class_year().cmp(b.class_year()),
            SortKey::ProfileCompletion => a.profile_completion().cmp(&b.profile_completion()),
            SortKey::DealsCompleted => a.deals_completed().cmp(&b.deals_completed()),
            SortKey::TotalRevenue => a.total_revenue().total_cmp(&b.total_revenue()),
            SortKey::ComplianceStatus => a.compliance_status().cmp(b.compliance_status()),
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| ParseError::SortKey(value.to_string()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::FullName,
            direction: SortDirection::Ascending,
        }
    }
}

/// Filters then stably sorts `records`. Ties keep their input order in both
/// directions.
pub fn visible_roster<'a>(
    records: &'a [AthleteRecord],
    search_term: &str,
    filters: &FilterState,
    sort: SortSpec,
) -> Vec<&'a AthleteRecord> {
    let needle = search_term.to_lowercase();

    let mut visible: Vec<&AthleteRecord> = records
        .iter()
        .filter(|record| {
            needle.is_empty()
                || record.full_name().to_lowercase().contains(&needle)
                || record.sport().to_lowercase().contains(&needle)
        })
        .filter(|record| filters.matches(record))
        .collect();

    visible.sort_by(|a, b| {
        let ordering = sort.key.compare(a, b);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    visible
}

/// Adds `value` to the category's selection if absent, removes it if present.
/// Values outside the category's options are accepted and simply match nothing.
pub fn toggle_filter_value(
    filters: &FilterState,
    category: FilterCategory,
    value: &str,
) -> FilterState {
    let mut next = filters.clone();
    let selection = next.selection_mut(category);
    if !selection.remove(value) {
        selection.insert(value.to_string());
    }
    next
}

pub fn request_sort(current: SortSpec, key: SortKey) -> SortSpec {
    if current.key == key {
        SortSpec {
            key,
            direction: current.direction.flip(),
        }
    } else {
        SortSpec {
            key,
            direction: SortDirection::Ascending,
        }
    }
}

/// Interactive state owned by one roster view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterState {
    pub search_term: String,
    pub filters: FilterState,
    pub sort: SortSpec,
}

impl RosterState {
    /// Empties every filter category and the search term. Sort is kept.
    pub fn clear_filters(&self) -> RosterState {
        RosterState {
            search_term: String::new(),
            filters: FilterState::default(),
            sort: self.sort,
        }
    }

    pub fn visible<'a>(&self, records: &'a [AthleteRecord]) -> Vec<&'a AthleteRecord> {
        visible_roster(records, &self.search_term, &self.filters, self.sort)
    }
}

/// Who the roster is being shown to. Passed in explicitly by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorContext {
    pub school: Option<String>,
    pub demo: bool,
}

#[derive(Debug, Clone)]
pub struct RosterView {
    context: DirectorContext,
    state: RosterState,
}

impl RosterView {
    pub fn new(context: DirectorContext) -> Self {
        Self {
            context,
            state: RosterState::default(),
        }
    }

    pub fn context(&self) -> &DirectorContext {
        &self.context
    }

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.state.search_term = term.into();
    }

    pub fn toggle_filter(&mut self, category: FilterCategory, value: &str) {
        self.state.filters = toggle_filter_value(&self.state.filters, category, value);
    }

    pub fn request_sort(&mut self, key: SortKey) {
        self.state.sort = request_sort(self.state.sort, key);
    }

    pub fn clear_filters(&mut self) {
        self.state = self.state.clear_filters();
    }

    pub fn visible<'a>(&self, records: &'a [AthleteRecord]) -> Vec<&'a AthleteRecord> {
        self.state.visible(records)
    }
}
