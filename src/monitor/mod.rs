//! Change detection between two reports of the same site
//!
//! Comparison is field-by-field equality over a fixed list of tracked
//! fields. A missing baseline is a normal outcome, not an error.

use crate::analysis::SiteReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Message carried by an outcome that had nothing to compare against
pub const NO_BASELINE_MESSAGE: &str = "No previous data for comparison";

/// Report fields watched for changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedField {
    Title,
    Description,
    PricingPage,
    PricingUrl,
    TechnologyStack,
    SocialPlatforms,
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        Self::Title,
        Self::Description,
        Self::PricingPage,
        Self::PricingUrl,
        Self::TechnologyStack,
        Self::SocialPlatforms,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::PricingPage => "pricing_page",
            Self::PricingUrl => "pricing_url",
            Self::TechnologyStack => "technology_stack",
            Self::SocialPlatforms => "social_platforms",
        }
    }

    /// The field's value in `report`
    ///
    /// A missing title reads as an empty string and a missing pricing
    /// section as "no pricing page", so an absent section does not flap
    /// against an empty one.
    pub fn value(&self, report: &SiteReport) -> Value {
        let metadata = report.basic_info.as_ref();
        let pricing = report.pricing_info.as_ref();

        match self {
            Self::Title => Value::from(
                metadata
                    .and_then(|m| m.title.clone())
                    .unwrap_or_default(),
            ),
            Self::Description => Value::from(metadata.and_then(|m| m.description.clone())),
            Self::PricingPage => Value::from(pricing.is_some_and(|p| p.has_pricing_page)),
            Self::PricingUrl => Value::from(pricing.and_then(|p| p.pricing_url.clone())),
            Self::TechnologyStack => Value::from(report.technology_stack.clone()),
            Self::SocialPlatforms => Value::from(
                report
                    .social_presence
                    .as_ref()
                    .map(|social| social.keys().cloned().collect::<Vec<_>>()),
            ),
        }
    }
}

/// One tracked field whose value differs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Differences between a baseline and a current report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub changes_detected: bool,
    pub changes: Vec<FieldChange>,
}

/// Result of monitoring a site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonitorOutcome {
    /// No baseline was supplied; only the current report is returned
    NoBaseline {
        url: String,
        message: String,
        current_data: SiteReport,
    },
    Compared {
        #[serde(flatten)]
        changes: ChangeReport,
        current_data: SiteReport,
    },
}

impl MonitorOutcome {
    /// The freshly captured report
    pub fn current(&self) -> &SiteReport {
        match self {
            Self::NoBaseline { current_data, .. } | Self::Compared { current_data, .. } => {
                current_data
            }
        }
    }

    pub fn into_current(self) -> SiteReport {
        match self {
            Self::NoBaseline { current_data, .. } | Self::Compared { current_data, .. } => {
                current_data
            }
        }
    }

    /// None when there was no baseline to compare against
    pub fn changes_detected(&self) -> Option<bool> {
        match self {
            Self::NoBaseline { .. } => None,
            Self::Compared { changes, .. } => Some(changes.changes_detected),
        }
    }

    pub fn has_baseline(&self) -> bool {
        matches!(self, Self::Compared { .. })
    }
}

/// Compares every tracked field of two reports
pub fn diff_reports(previous: &SiteReport, current: &SiteReport) -> ChangeReport {
    let changes: Vec<FieldChange> = TrackedField::ALL
        .iter()
        .filter_map(|field| {
            let old_value = field.value(previous);
            let new_value = field.value(current);
            (old_value != new_value).then(|| FieldChange {
                field: field.name().to_string(),
                old_value,
                new_value,
            })
        })
        .collect();

    ChangeReport {
        url: current.url.clone(),
        captured_at: current.captured_at,
        changes_detected: !changes.is_empty(),
        changes,
    }
}

/// Wraps `current` into an outcome, diffing against `previous` when present
pub fn compare_reports(url: &str, previous: Option<&SiteReport>, current: SiteReport) -> MonitorOutcome {
    match previous {
        None => {
            tracing::info!("No baseline for {}", url);
            MonitorOutcome::NoBaseline {
                url: url.to_string(),
                message: NO_BASELINE_MESSAGE.to_string(),
                current_data: current,
            }
        }
        Some(previous) => {
            let mut changes = diff_reports(previous, &current);
            changes.url = url.to_string();
            tracing::info!("{} tracked field(s) changed for {}", changes.changes.len(), url);
            MonitorOutcome::Compared {
                changes,
                current_data: current,
            }
        }
    }
}
