// 📑 Contract Aggregator - resolved business → contract table + total
//
// A contract belongs to a business when either vendor column contains the
// business name (case-insensitive). Amounts are normalized into the
// projection only; source rows are never touched.
//
// Amount policy:
//   empty cell         → no amount, contributes nothing to the total
//   "1,234.56" / "987" → parsed after stripping ',' separators
//   anything else      → LookupError::AmountParse for the whole lookup

use crate::data::ContractRow;
use crate::error::{LookupError, LookupResult};
use crate::matcher::contains_ignore_case;
use crate::profile::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// PROJECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractLine {
    pub contract_id: String,
    pub amount: Option<f64>,
    pub start_date: String,
    pub end_date: String,
    pub agency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSummary {
    pub lines: Vec<ContractLine>,
    pub total: f64,
}

impl ContractSummary {
    pub fn total_display(&self) -> String {
        format_currency(self.total)
    }
}

/// "No contracts" is its own outcome, never a table with a zero total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContractsOutcome {
    NoContracts,
    Found(ContractSummary),
}

impl ContractsOutcome {
    pub fn summary(&self) -> Option<&ContractSummary> {
        match self {
            ContractsOutcome::NoContracts => None,
            ContractsOutcome::Found(summary) => Some(summary),
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

pub fn is_vendor(row: &ContractRow, business_name: &str) -> bool {
    let needle = business_name.to_lowercase();
    [row.prime_vendor.as_deref(), row.sub_vendor.as_deref()]
        .into_iter()
        .flatten()
        .any(|vendor| contains_ignore_case(vendor, &needle))
}

/// Parse a currency-formatted amount. `Ok(None)` for an empty cell.
pub fn normalize_amount(raw: Option<&str>) -> Result<Option<f64>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let stripped: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if stripped.is_empty() {
        return Ok(None);
    }

    stripped
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| raw.to_string())
}

pub fn aggregate(contracts: &[ContractRow], business_name: &str) -> LookupResult<ContractsOutcome> {
    let mut lines = Vec::new();

    for row in contracts.iter().filter(|row| is_vendor(row, business_name)) {
        let amount = normalize_amount(row.amount.as_deref()).map_err(|value| {
            warn!(row = row.row, value = %value, "unparsable contract amount");
            LookupError::AmountParse {
                contract_id: row.contract_id.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                row: row.row,
                value,
            }
        })?;

        lines.push(ContractLine {
            contract_id: text_or_placeholder(&row.contract_id),
            amount,
            start_date: text_or_placeholder(&row.start_date),
            end_date: text_or_placeholder(&row.end_date),
            agency: text_or_placeholder(&row.agency),
        });
    }

    if lines.is_empty() {
        debug!(business = business_name, "no contracts");
        return Ok(ContractsOutcome::NoContracts);
    }

    let total: f64 = lines.iter().filter_map(|line| line.amount).sum();
    debug!(business = business_name, contracts = lines.len(), total, "contracts aggregated");

    Ok(ContractsOutcome::Found(ContractSummary { lines, total }))
}

fn text_or_placeholder(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

// ============================================================================
// DISPLAY
// ============================================================================

/// `$1,234.56` style rendering
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}
