//! crates/jobs_dashboard_core/src/aggregate.rs
//!
//! Pure derivations over rows that were already fetched. Nothing in here touches the
//! network, and every function tolerates empty or partially loaded inputs.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{CompanyCount, JobRow, Location, SkillCount};
use crate::query::active_selection;

/// Counts names while remembering the order in which they were first seen.
#[derive(Debug, Default)]
struct Tally {
    order: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn seed(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.order.len());
            self.order.push((name.to_string(), 0));
        }
    }

    fn add(&mut self, name: &str, amount: u64) {
        self.seed(name);
        self.bump(name, amount);
    }

    /// Increments only names already present.
    fn bump(&mut self, name: &str, amount: u64) {
        if let Some(&i) = self.index.get(name) {
            self.order[i].1 += amount;
        }
    }

    /// Highest count first; ties keep first-seen order.
    fn ranked(mut self) -> Vec<(String, u64)> {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

fn named(pairs: Vec<(String, u64)>) -> Vec<NamedCount> {
    pairs
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect()
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    distinct.sort();
    distinct
}

//=========================================================================================
// Skills
//=========================================================================================

/// Jobs per skill, most demanded first.
///
/// With an active skills filter the result holds exactly the filtered skills, seeded
/// at zero; skills outside the filter are never added.
pub fn count_skills(rows: &[JobRow], filter: &[String]) -> Vec<SkillCount> {
    let filter = active_selection(filter).unwrap_or_default();
    let mut tally = Tally::default();
    for skill in filter {
        tally.seed(skill);
    }
    for skill in rows.iter().flat_map(|row| row.extracted_skills.iter()) {
        if filter.is_empty() {
            tally.add(skill, 1);
        } else {
            tally.bump(skill, 1);
        }
    }
    tally
        .ranked()
        .into_iter()
        .map(|(skill_name, job_count)| SkillCount { skill_name, job_count })
        .collect()
}

pub fn distinct_skills(rows: &[JobRow]) -> Vec<String> {
    sorted_distinct(
        rows.iter()
            .flat_map(|row| row.extracted_skills.iter().map(String::as_str)),
    )
}

/// Jobs mentioning the skill, matched case-insensitively as a substring.
pub fn jobs_for_skill<'a>(rows: &'a [JobRow], skill_name: &str) -> Vec<&'a JobRow> {
    rows.iter().filter(|row| row.has_skill_like(skill_name)).collect()
}

/// One skill's total over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillTotal {
    pub skill: String,
    pub skill_count: u64,
}

/// Sums `(skill, count)` pairs per skill, in first-seen order.
pub fn sum_by_skill<'a>(items: impl IntoIterator<Item = (&'a str, u64)>) -> Vec<SkillTotal> {
    let mut tally = Tally::default();
    for (skill, count) in items {
        tally.add(skill, count);
    }
    tally
        .order
        .into_iter()
        .map(|(skill, skill_count)| SkillTotal { skill, skill_count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillChange {
    pub skill: String,
    pub current: u64,
    pub prev: u64,
    /// Percentage; a skill absent from the previous period counts as +100.
    pub change: f64,
}

pub fn skill_changes(current: &[SkillTotal], previous: &[SkillTotal]) -> Vec<SkillChange> {
    let prev: HashMap<&str, u64> = previous
        .iter()
        .map(|item| (item.skill.as_str(), item.skill_count))
        .collect();
    current
        .iter()
        .map(|item| {
            let prev = prev.get(item.skill.as_str()).copied().unwrap_or(0);
            let change = if prev == 0 {
                100.0
            } else {
                (item.skill_count as f64 - prev as f64) / prev as f64 * 100.0
            };
            SkillChange {
                skill: item.skill.clone(),
                current: item.skill_count,
                prev,
                change,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthKpi {
    #[serde(flatten)]
    pub change: SkillChange,
    /// No skill grew; this is the one that declined least.
    pub is_least_declining: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SkillKpis {
    pub most_demanded: Option<SkillTotal>,
    pub highest_growth: Option<GrowthKpi>,
    pub biggest_drop: Option<SkillChange>,
}

/// Period-over-period skill KPIs. On ties the later skill wins.
pub fn skill_kpis(current: &[SkillTotal], previous: &[SkillTotal]) -> SkillKpis {
    let most_demanded = current
        .iter()
        .fold(None::<&SkillTotal>, |best, item| match best {
            Some(b) if b.skill_count > item.skill_count => Some(b),
            _ => Some(item),
        })
        .cloned();

    let changes = skill_changes(current, previous);
    let any_growth = changes.iter().any(|c| c.change > 0.0);
    let highest_growth = highest_change(changes.iter().filter(|c| !any_growth || c.change > 0.0))
        .map(|c| GrowthKpi {
            change: c.clone(),
            is_least_declining: !any_growth,
        });

    let biggest_drop = changes
        .iter()
        .filter(|c| c.prev > 0 && c.change < 0.0)
        .fold(None::<&SkillChange>, |best, c| match best {
            Some(b) if b.change < c.change => Some(b),
            _ => Some(c),
        })
        .cloned();

    SkillKpis {
        most_demanded,
        highest_growth,
        biggest_drop,
    }
}

fn highest_change<'a>(
    candidates: impl Iterator<Item = &'a SkillChange>,
) -> Option<&'a SkillChange> {
    candidates.fold(None, |best, c| match best {
        Some(b) if b.change > c.change => Some(b),
        _ => Some(c),
    })
}

//=========================================================================================
// Companies, cities, publishers
//=========================================================================================

/// Jobs per company, most active first. Rows without an employer are skipped.
pub fn count_companies(rows: &[JobRow]) -> Vec<CompanyCount> {
    let mut tally = Tally::default();
    for name in rows.iter().filter_map(|row| row.employer_name.as_deref()) {
        tally.add(name, 1);
    }
    tally
        .ranked()
        .into_iter()
        .map(|(employer_name, job_count)| CompanyCount { employer_name, job_count })
        .collect()
}

pub fn distinct_companies(rows: &[JobRow]) -> Vec<String> {
    sorted_distinct(rows.iter().filter_map(|row| row.employer_name.as_deref()))
}

pub fn jobs_for_company<'a>(rows: &'a [JobRow], employer_name: &str) -> Vec<&'a JobRow> {
    rows.iter()
        .filter(|row| row.employer_name.as_deref() == Some(employer_name))
        .collect()
}

pub fn distinct_cities(rows: &[JobRow]) -> Vec<String> {
    sorted_distinct(rows.iter().filter_map(|row| row.job_city.as_deref()))
}

pub fn distinct_publishers(rows: &[JobRow]) -> Vec<String> {
    let publishers: Vec<String> = rows.iter().flat_map(JobRow::publishers).collect();
    sorted_distinct(publishers.iter().map(String::as_str))
}

/// Headline numbers for a set of rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EntityOverview {
    pub total_jobs: usize,
    pub companies: usize,
    pub cities: usize,
    pub publishers: usize,
    pub remote_jobs: usize,
}

pub fn entity_overview(rows: &[JobRow]) -> EntityOverview {
    EntityOverview {
        total_jobs: rows.len(),
        companies: distinct_companies(rows).len(),
        cities: distinct_cities(rows).len(),
        publishers: distinct_publishers(rows).len(),
        remote_jobs: rows.iter().filter(|row| row.job_is_remote).count(),
    }
}

//=========================================================================================
// Matrix pivot
//=========================================================================================

/// A dense two-key count matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Matrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<u64>>,
}

impl Matrix {
    pub fn value(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.rows.iter().position(|label| label == row)?;
        let c = self.columns.iter().position(|label| label == column)?;
        Some(self.values[r][c])
    }

    /// `(row index, column index, value)` for every cell, row-major.
    pub fn cells(&self) -> Vec<(usize, usize, u64)> {
        self.values
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, v)| (r, c, *v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

fn first_seen<T>(items: &[T], key: &impl Fn(&T) -> &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut axis = Vec::new();
    for item in items {
        let label = key(item);
        if seen.insert(label.to_string()) {
            axis.push(label.to_string());
        }
    }
    axis
}

/// Pivots over the distinct keys of the input, each axis in first-seen order.
pub fn pivot<T>(
    items: &[T],
    row_key: impl Fn(&T) -> &str,
    column_key: impl Fn(&T) -> &str,
    count: impl Fn(&T) -> u64,
) -> Matrix {
    let rows = first_seen(items, &row_key);
    let columns = first_seen(items, &column_key);
    pivot_over(items, &rows, &columns, row_key, column_key, count)
}

/// Pivots over explicit axes. Missing cells are 0; the first matching item wins.
pub fn pivot_over<T>(
    items: &[T],
    rows: &[String],
    columns: &[String],
    row_key: impl Fn(&T) -> &str,
    column_key: impl Fn(&T) -> &str,
    count: impl Fn(&T) -> u64,
) -> Matrix {
    let row_index: HashMap<&str, usize> =
        rows.iter().enumerate().map(|(i, r)| (r.as_str(), i)).collect();
    let column_index: HashMap<&str, usize> =
        columns.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();

    let mut cells: Vec<Vec<Option<u64>>> = vec![vec![None; columns.len()]; rows.len()];
    for item in items {
        let (Some(&r), Some(&c)) = (row_index.get(row_key(item)), column_index.get(column_key(item)))
        else {
            continue;
        };
        let cell = &mut cells[r][c];
        if cell.is_none() {
            *cell = Some(count(item));
        }
    }

    Matrix {
        rows: rows.to_vec(),
        columns: columns.to_vec(),
        values: cells
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(0)).collect())
            .collect(),
    }
}

//=========================================================================================
// Time series
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Timeline {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<Series>,
}

/// One running total per series over the sorted distinct dates. A repeated
/// `(series, date)` keeps its last count; a missing one contributes 0.
pub fn cumulative_series<T>(
    items: &[T],
    series_key: impl Fn(&T) -> &str,
    date: impl Fn(&T) -> Option<NaiveDate>,
    count: impl Fn(&T) -> u64,
) -> Timeline {
    let dated: Vec<&T> = items.iter().filter(|item| date(item).is_some()).collect();
    let mut dates: Vec<NaiveDate> = dated.iter().filter_map(|item| date(item)).collect();
    dates.sort();
    dates.dedup();

    let mut names: Vec<String> = Vec::new();
    let mut points: HashMap<(String, NaiveDate), u64> = HashMap::new();
    for item in dated {
        let name = series_key(item);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        if let Some(day) = date(item) {
            points.insert((name.to_string(), day), count(item));
        }
    }

    let series = names
        .into_iter()
        .map(|name| {
            let mut running = 0;
            let data = dates
                .iter()
                .map(|day| {
                    running += points.get(&(name.clone(), *day)).copied().unwrap_or(0);
                    running
                })
                .collect();
            Series { name, data }
        })
        .collect();

    Timeline { dates, series }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Jobs posted per day, oldest first. Undated rows are ignored.
pub fn daily_counts(rows: &[JobRow]) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for day in rows.iter().filter_map(|row| row.job_posted_at_date) {
        *per_day.entry(day).or_default() += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

//=========================================================================================
// Chart helpers
//=========================================================================================

/// Distinct city/state pairs, first-seen order. Rows missing either are skipped.
pub fn unique_locations(rows: &[JobRow]) -> Vec<Location> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| {
            Some(Location {
                title: row.job_city.clone()?,
                state: row.job_state.clone()?,
            })
        })
        .filter(|location| seen.insert(location.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RemoteSplit {
    pub remote: u64,
    pub on_site: u64,
}

impl RemoteSplit {
    pub fn remote_percentage(&self) -> f64 {
        let total = self.remote + self.on_site;
        if total == 0 {
            0.0
        } else {
            self.remote as f64 / total as f64 * 100.0
        }
    }
}

pub fn remote_split(rows: &[JobRow]) -> RemoteSplit {
    rows.iter().fold(RemoteSplit::default(), |mut split, row| {
        if row.job_is_remote {
            split.remote += 1;
        } else {
            split.on_site += 1;
        }
        split
    })
}

pub fn top_cities(rows: &[JobRow], limit: usize) -> Vec<NamedCount> {
    let mut tally = Tally::default();
    for city in rows.iter().filter_map(|row| row.job_city.as_deref()) {
        tally.add(city, 1);
    }
    let mut ranked = named(tally.ranked());
    ranked.truncate(limit);
    ranked
}

pub fn employment_types(rows: &[JobRow]) -> Vec<NamedCount> {
    let mut tally = Tally::default();
    for kind in rows.iter().filter_map(|row| row.job_employment_type.as_deref()) {
        tally.add(kind, 1);
    }
    named(tally.ranked())
}

pub fn active_companies(rows: &[JobRow]) -> usize {
    rows.iter()
        .filter_map(|row| row.employer_name.as_deref())
        .collect::<HashSet<_>>()
        .len()
}
