// 📂 Source Tables - contractor registry + contracts ledger
//
// Both tables are read from CSV once, every cell as text. An empty cell or
// one of the NA tokens below becomes `None` and never matches a search.
// Rows are immutable after load.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// MISSING CELLS
// ============================================================================

/// Cell values that count as missing, compared exactly (no trimming, case
/// as listed). Same set a pandas `read_csv` treats as NaN by default.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

fn na_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let cell = Option::<String>::deserialize(deserializer)?;
    Ok(cell.filter(|value| !value.is_empty() && !is_na_token(value)))
}

// ============================================================================
// REGISTRY ROW
// ============================================================================

/// One contractor from the registry (one row per business, names not
/// guaranteed unique).
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RegistryRow {
    /// Zero-based position in the source file
    #[serde(skip)]
    pub row: usize,

    #[serde(rename = "Business Name", default, deserialize_with = "na_cell")]
    pub business_name: Option<String>,

    #[serde(rename = "Address", default, deserialize_with = "na_cell")]
    pub address: Option<String>,

    #[serde(rename = "City", default, deserialize_with = "na_cell")]
    pub city: Option<String>,

    #[serde(rename = "State", default, deserialize_with = "na_cell")]
    pub state: Option<String>,

    #[serde(rename = "Zip Code", default, deserialize_with = "na_cell")]
    pub zip_code: Option<String>,

    #[serde(rename = "Phone", default, deserialize_with = "na_cell")]
    pub phone: Option<String>,

    // ========================================================================
    // FLAGS ("Yes" / "No" as published)
    // ========================================================================
    #[serde(rename = "Business is MWBE Owned", default, deserialize_with = "na_cell")]
    pub mwbe_owned: Option<String>,

    #[serde(rename = "Business has been debarred", default, deserialize_with = "na_cell")]
    pub debarred: Option<String>,

    #[serde(rename = "Business is associated with an apprenticeship program", default, deserialize_with = "na_cell")]
    pub apprenticeship_program: Option<String>,

    #[serde(rename = "Business has final determination for violation of Labor or Tax Law", default, deserialize_with = "na_cell")]
    pub labor_tax_violation: Option<String>,

    #[serde(rename = "Business has final determination safety standard violations", default, deserialize_with = "na_cell")]
    pub safety_violation: Option<String>,

    #[serde(rename = "Business has outstanding wage assessments", default, deserialize_with = "na_cell")]
    pub wage_assessment: Option<String>,
}

impl RegistryRow {
    pub fn name(&self) -> Option<&str> {
        self.business_name.as_deref()
    }

    /// Exact (case-sensitive) name equality, used once a selection exists
    pub fn is_named(&self, name: &str) -> bool {
        self.name() == Some(name)
    }
}

// ============================================================================
// CONTRACT ROW
// ============================================================================

/// One contract from the ledger. Vendor columns are free text and only
/// loosely related to registry names.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ContractRow {
    #[serde(skip)]
    pub row: usize,

    #[serde(rename = "Prime Vendor Match", default, deserialize_with = "na_cell")]
    pub prime_vendor: Option<String>,

    #[serde(rename = "Sub Vendor Match", default, deserialize_with = "na_cell")]
    pub sub_vendor: Option<String>,

    #[serde(rename = "Prime Contract ID", default, deserialize_with = "na_cell")]
    pub contract_id: Option<String>,

    /// Currency formatted, e.g. "1,234.56"
    #[serde(rename = "Prime Contract Current Amount", default, deserialize_with = "na_cell")]
    pub amount: Option<String>,

    #[serde(rename = "Prime Contract Start Date", default, deserialize_with = "na_cell")]
    pub start_date: Option<String>,

    #[serde(rename = "Prime Contract End Date", default, deserialize_with = "na_cell")]
    pub end_date: Option<String>,

    #[serde(rename = "Prime Contracting Agency", default, deserialize_with = "na_cell")]
    pub agency: Option<String>,
}

// ============================================================================
// DATASET
// ============================================================================

/// Both tables, loaded once and shared read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub registry: Arc<[RegistryRow]>,
    pub contracts: Arc<[ContractRow]>,

    /// SHA-256 (hex). `load` hashes the raw bytes of both files;
    /// `from_rows` hashes the rows' debug rendering instead.
    pub fingerprint: String,
}

impl Dataset {
    /// Build a dataset from rows already in memory, numbering them in order.
    /// Cells are taken as given; NA tokens are only recognized by `load`.
    pub fn from_rows(registry: Vec<RegistryRow>, contracts: Vec<ContractRow>) -> Self {
        let registry = number_rows(registry, |r, i| r.row = i);
        let contracts = number_rows(contracts, |c, i| c.row = i);

        let mut hasher = Sha256::new();
        for r in &registry {
            hasher.update(format!("{:?}", r));
        }
        for c in &contracts {
            hasher.update(format!("{:?}", c));
        }

        Dataset {
            registry: registry.into(),
            contracts: contracts.into(),
            fingerprint: format!("{:x}", hasher.finalize()),
        }
    }

    /// Read both CSV files
    pub fn load(registry_path: &Path, contracts_path: &Path) -> Result<Self> {
        let registry_bytes = std::fs::read(registry_path)
            .with_context(|| format!("Failed to read registry CSV {}", registry_path.display()))?;
        let contracts_bytes = std::fs::read(contracts_path)
            .with_context(|| format!("Failed to read contracts CSV {}", contracts_path.display()))?;

        let registry: Vec<RegistryRow> = parse_csv(&registry_bytes)
            .with_context(|| format!("Failed to parse registry CSV {}", registry_path.display()))?;
        let contracts: Vec<ContractRow> = parse_csv(&contracts_bytes)
            .with_context(|| format!("Failed to parse contracts CSV {}", contracts_path.display()))?;

        let mut hasher = Sha256::new();
        hasher.update(&registry_bytes);
        hasher.update(&contracts_bytes);
        let fingerprint = format!("{:x}", hasher.finalize());

        let registry = number_rows(registry, |r, i| r.row = i);
        let contracts = number_rows(contracts, |c, i| c.row = i);

        info!(
            registry_rows = registry.len(),
            contract_rows = contracts.len(),
            fingerprint = %&fingerprint[..12],
            "dataset loaded"
        );

        Ok(Dataset {
            registry: registry.into(),
            contracts: contracts.into(),
            fingerprint,
        })
    }
}

fn parse_csv<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(bytes);

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: T = result.with_context(|| format!("Failed to deserialize data row {}", line + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

fn number_rows<T>(mut rows: Vec<T>, set: impl Fn(&mut T, usize)) -> Vec<T> {
    for (i, row) in rows.iter_mut().enumerate() {
        set(row, i);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_maps_headers_and_empty_cells() {
        let registry = write_csv(
            "Business Name,Address,City,State,Zip Code,Phone,Business is MWBE Owned,\
Business has been debarred,Business is associated with an apprenticeship program,\
Business has final determination for violation of Labor or Tax Law,\
Business has final determination safety standard violations,\
Business has outstanding wage assessments,Extra Column\n\
ACME BUILDERS,12 MAIN ST,ALBANY,NY,12207,,Yes,No,No,Yes,No,No,ignored\n\
,99 RIVER RD,TROY,NY,12180,555-0100,No,No,No,No,No,No,ignored\n",
        );
        let contracts = write_csv(
            "Prime Vendor Match,Sub Vendor Match,Prime Contract ID,Prime Contract Current Amount,\
Prime Contract Start Date,Prime Contract End Date,Prime Contracting Agency\n\
ACME BUILDERS INC,,C-1,\"1,234.56\",01/01/2023,12/31/2024,DOT\n",
        );

        let data = Dataset::load(registry.path(), contracts.path()).unwrap();

        assert_eq!(data.registry.len(), 2);
        assert_eq!(data.registry[0].name(), Some("ACME BUILDERS"));
        assert_eq!(data.registry[0].phone, None, "empty cell should be absent");
        assert_eq!(data.registry[0].labor_tax_violation.as_deref(), Some("Yes"));
        assert_eq!(data.registry[1].business_name, None);
        assert_eq!(data.registry[1].row, 1);

        assert_eq!(data.contracts.len(), 1);
        assert_eq!(data.contracts[0].amount.as_deref(), Some("1,234.56"));
        assert_eq!(data.contracts[0].sub_vendor, None);
        assert_eq!(data.fingerprint.len(), 64);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let contracts = write_csv("Prime Contract ID\n");
        let err = Dataset::load(Path::new("/nonexistent/registry.csv"), contracts.path()).unwrap_err();

        assert!(format!("{:#}", err).contains("/nonexistent/registry.csv"));
    }

    #[test]
    fn test_fingerprint_is_stable_for_same_rows() {
        let rows = || {
            vec![RegistryRow {
                business_name: Some("ACME".to_string()),
                ..Default::default()
            }]
        };

        let a = Dataset::from_rows(rows(), vec![]);
        let b = Dataset::from_rows(rows(), vec![]);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_na_tokens_load_as_missing() {
        let registry = write_csv(
            "Business Name,Address\n\
NULL,1 Main St\n\
ACME,N/A\n\
n/a,9 Elm Ave\n",
        );
        let contracts = write_csv(
            "Prime Vendor Match,Prime Contract ID,Prime Contract Current Amount\n\
ACME,C-1,100\n\
ACME,C-2,N/A\n\
ACME,C-3,nan\n",
        );

        let data = Dataset::load(registry.path(), contracts.path()).unwrap();

        assert_eq!(data.registry[0].business_name, None);
        assert_eq!(data.registry[1].address, None);
        assert_eq!(data.registry[2].business_name, None);
        assert_eq!(data.contracts[1].amount, None);
        assert_eq!(data.contracts[2].amount, None);

        // Missing amounts are skipped, the table still renders
        let engine = crate::engine::LookupEngine::new(data);
        let outcome = engine.contracts("ACME").unwrap();
        let summary = outcome.summary().expect("contracts should be found");
        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.total, 100.0);

        // NA names are not selectable businesses
        assert_eq!(engine.search("n/a"), crate::engine::SearchOutcome::NoMatch);
        assert_eq!(engine.search("null"), crate::engine::SearchOutcome::NoMatch);
    }

    #[test]
    fn test_na_tokens_are_exact() {
        assert!(is_na_token("N/A"));
        assert!(is_na_token("NULL"));
        assert!(!is_na_token("n/a "));
        assert!(!is_na_token("Null"));
        assert!(!is_na_token("NA CONSTRUCTION"));
    }

    #[test]
    fn test_load_fingerprint_covers_file_bytes() {
        let registry_text = "Business Name\nACME\n";
        let contracts_text = "Prime Contract ID\nC-1\n";
        let registry = write_csv(registry_text);
        let contracts = write_csv(contracts_text);

        let data = Dataset::load(registry.path(), contracts.path()).unwrap();

        let mut hasher = Sha256::new();
        hasher.update(registry_text.as_bytes());
        hasher.update(contracts_text.as_bytes());
        assert_eq!(data.fingerprint, format!("{:x}", hasher.finalize()));
    }
}
