// 📌 Business Profile - registry row → display record
//
// Only rows whose name equals the selection exactly are considered. When a
// name repeats, the last row in source order wins (the registry is
// append-ordered, so that is the most recent record).

use crate::data::RegistryRow;
use crate::error::{LookupError, LookupResult};
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_VIOLATIONS: &str = "No known violations";
pub const VIOLATION_SEPARATOR: &str = " | ";

// ============================================================================
// VIOLATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    LaborTaxLaw,
    SafetyStandard,
    OutstandingWages,
}

impl Violation {
    pub fn label(&self) -> &'static str {
        match self {
            Violation::LaborTaxLaw => "Labor/Tax Law Violation",
            Violation::SafetyStandard => "Safety Standard Violation",
            Violation::OutstandingWages => "Outstanding Wage Assessments",
        }
    }

    /// Flags that are exactly "Yes". Nothing else counts, not even "yes".
    pub fn flagged(row: &RegistryRow) -> Vec<Violation> {
        [
            (Violation::LaborTaxLaw, &row.labor_tax_violation),
            (Violation::SafetyStandard, &row.safety_violation),
            (Violation::OutstandingWages, &row.wage_assessment),
        ]
        .into_iter()
        .filter(|(_, flag)| flag.as_deref() == Some("Yes"))
        .map(|(violation, _)| violation)
        .collect()
    }
}

pub fn violation_summary(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return NO_VIOLATIONS.to_string();
    }
    violations
        .iter()
        .map(Violation::label)
        .collect::<Vec<_>>()
        .join(VIOLATION_SEPARATOR)
}

// ============================================================================
// PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub mwbe_status: String,
    pub debarment: String,
    pub apprenticeship_program: String,
    pub violations: Vec<Violation>,
    pub violation_summary: String,

    /// Source row the profile was projected from
    pub source_row: usize,
}

impl BusinessProfile {
    pub fn from_row(row: &RegistryRow) -> Self {
        let violations = Violation::flagged(row);
        let summary = violation_summary(&violations);

        BusinessProfile {
            business_name: or_placeholder(&row.business_name),
            address: or_placeholder(&row.address),
            city: or_placeholder(&row.city),
            state: or_placeholder(&row.state),
            zip_code: or_placeholder(&row.zip_code),
            phone: or_placeholder(&row.phone),
            mwbe_status: or_placeholder(&row.mwbe_owned),
            debarment: or_placeholder(&row.debarred),
            apprenticeship_program: or_placeholder(&row.apprenticeship_program),
            violations,
            violation_summary: summary,
            source_row: row.row,
        }
    }

    /// "City, State Zip"
    pub fn locality(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip_code)
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

fn or_placeholder(value: &Option<String>) -> String {
    value
        .clone()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Pick the record for an exact business name (last in source order)
pub fn select_record<'a>(registry: &'a [RegistryRow], name: &str) -> Option<&'a RegistryRow> {
    registry.iter().rev().find(|row| row.is_named(name))
}

pub fn build_profile(registry: &[RegistryRow], name: &str) -> LookupResult<BusinessProfile> {
    select_record(registry, name)
        .map(BusinessProfile::from_row)
        .ok_or_else(|| LookupError::UnknownBusiness {
            name: name.to_string(),
        })
}
