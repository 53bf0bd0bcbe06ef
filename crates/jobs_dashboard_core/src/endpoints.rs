//! crates/jobs_dashboard_core/src/endpoints.rs
//!
//! Backend paths, relative to the configured API base URL.

// Reports
pub const PREVIEW_EXPORT: &str = "/api/reports/preview-export";
pub const COUNT_EXPORT_RECORDS: &str = "/api/reports/count-export-records";
pub const EXPORT_CSV: &str = "/api/reports/export-csv";
pub const AVAILABLE_EMPLOYMENT_TYPES: &str = "/api/reports/available-employment-types";
pub const SKILLS_JOBS: &str = "/api/skills/jobs";

// Reports, unauthenticated
pub const PUBLIC_PREVIEW_EXPORT: &str = "/api/public/preview-export";
pub const PUBLIC_COUNT_EXPORT_RECORDS: &str = "/api/public/count-export-records";
pub const PUBLIC_AVAILABLE_POSITIONS: &str = "/api/public/available-positions";

// Option lists
pub const AVAILABLE_POSITIONS: &str = "/api/dashboard/available-positions";
pub const AVAILABLE_COMPANIES: &str = "/api/dashboard/available-companies";
pub const AVAILABLE_PUBLISHERS: &str = "/api/dashboard/available-publishers";
pub const AVAILABLE_SENIORITY_LEVELS: &str = "/api/dashboard/available-seniority-levels";
pub const AVAILABLE_SKILLS: &str = "/api/dashboard/available-skills";
pub const LOCATIONS: &str = "/api/dashboard/locations";

// Dashboard overview
pub const DASHBOARD_JOBS: &str = "/api/dashboard/jobs";

// Trending
pub const TOP_SKILLS: &str = "/api/dashboard/top-skills";
pub const SKILLS_TREND: &str = "/api/dashboard/skills-trend";

// Publishers
pub const PUBLISHERS_KPIS: &str = "/api/dashboard/publishers-kpis";
pub const TOP_PUBLISHERS: &str = "/api/dashboard/top-publishers";
pub const PUBLISHERS_SENIORITY: &str = "/api/dashboard/publishers-seniority-distribution";
pub const PUBLISHERS_COMPANIES_MATRIX: &str = "/api/dashboard/publishers-companies-matrix";
pub const PUBLISHERS_TIMELINE: &str = "/api/dashboard/publishers-timeline";
pub const DIRECT_VS_INDIRECT: &str = "/api/dashboard/direct-vs-indirect-distribution";

// Companies
pub const COMPANIES_KPIS: &str = "/api/dashboard/companies-kpis";
pub const TOP_COMPANIES: &str = "/api/dashboard/top-companies";
pub const COMPANIES_SENIORITY: &str = "/api/dashboard/companies-seniority-distribution";
pub const EMPLOYMENT_TYPE_DISTRIBUTION: &str = "/api/dashboard/employment-type-distribution";
pub const COMPANIES_REMOTE_PERCENTAGE: &str = "/api/dashboard/companies-remote-percentage";
pub const COMPANIES_JOBS_TIMELINE: &str = "/api/dashboard/companies-jobs-timeline";
pub const COMPANIES_TOP_SKILLS: &str = "/api/dashboard/companies-top-skills";
