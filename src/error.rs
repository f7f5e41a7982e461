// ⚠️ Lookup Errors - recoverable failures of a single interaction
//
// Informational outcomes (awaiting input, no match, several candidates,
// no contracts) are statuses, not errors. See session::SearchStatus and
// contracts::ContractsOutcome.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupError {
    /// A matched contract carries an amount that is not a number once
    /// thousands separators are stripped.
    #[error("contract {contract_id} (row {row}) has an unparsable amount: {value:?}")]
    AmountParse {
        contract_id: String,
        row: usize,
        value: String,
    },

    /// Selection attempted with a name outside the current candidate list.
    #[error("{name:?} is not one of the current candidates")]
    NotACandidate { name: String },

    /// No registry row carries this exact business name.
    #[error("no registry record named {name:?}")]
    UnknownBusiness { name: String },
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse_message_names_row() {
        let err = LookupError::AmountParse {
            contract_id: "CT-9".to_string(),
            row: 4,
            value: "TBD".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("CT-9"));
        assert!(message.contains("row 4"));
        assert!(message.contains("\"TBD\""));
    }

    #[test]
    fn test_errors_serialize_with_kind_tag() {
        let err = LookupError::NotACandidate {
            name: "ACME".to_string(),
        };

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "not_a_candidate");
        assert_eq!(json["name"], "ACME");
    }
}
