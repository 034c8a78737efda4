//! Emission computation
//!
//! Turns a raw activity submission into a factor-adjusted [`EmissionRecord`]
//! and appends it to the submitting user's history.
//!
//! Every failure is detected before the single write at the end, so a
//! rejected submission leaves all maps untouched. The read-modify-write on
//! `UserData` assumes the host runs one invocation at a time; the
//! [`crate::Ledger`] facade takes `&mut self` for this path to make that
//! explicit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::identity::CallerIdentity;
use crate::keys::{factor_key, record_key};
use crate::models::EmissionRecord;
use crate::store::Stores;

/// Raw activity as submitted by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionSubmission {
    pub activity_type: String,
    pub description: String,
    /// Raw quantity before factor adjustment
    pub emissions: u64,
    pub date: String,
}

impl EmissionSubmission {
    pub fn new(
        activity_type: impl Into<String>,
        description: impl Into<String>,
        emissions: u64,
        date: impl Into<String>,
    ) -> Self {
        Self {
            activity_type: activity_type.into(),
            description: description.into(),
            emissions,
            date: date.into(),
        }
    }

    /// Presence and positivity checks only
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.activity_type.is_empty() {
            return Err(LedgerError::InvalidInput("activity type is empty".into()));
        }
        if self.description.is_empty() {
            return Err(LedgerError::InvalidInput("description is empty".into()));
        }
        if self.emissions == 0 {
            return Err(LedgerError::InvalidInput("emissions must be greater than zero".into()));
        }
        if self.date.is_empty() {
            return Err(LedgerError::InvalidInput("date is empty".into()));
        }
        Ok(())
    }
}

/// Multiply a raw quantity by its factor, refusing to wrap on overflow
pub fn adjust_emissions(raw: u64, factor_value: u64) -> Result<u64, LedgerError> {
    raw.checked_mul(factor_value).ok_or_else(|| {
        LedgerError::InvalidInput(format!("{raw} * {factor_value} overflows u64"))
    })
}

/// Record `submission` for `caller`.
///
/// Fails with `InvalidInput`, `FactorNotFound` or `UserNotFound` without
/// writing anything. On success exactly one write happens: the caller's
/// `UserData`, replaced with the new record appended.
pub fn record_emission(
    stores: &Stores,
    caller: &CallerIdentity,
    submission: &EmissionSubmission,
) -> Result<EmissionRecord, LedgerError> {
    if let Err(e) = submission.validate() {
        warn!(caller = %caller, error = ?e, "Rejected emission submission");
        return Err(e);
    }

    let key = factor_key(&submission.activity_type, &submission.date);
    let factor = stores.environmental_factors.get(&key)?.ok_or_else(|| {
        debug!(
            activity_type = %submission.activity_type,
            date = %submission.date,
            "No environmental factor provisioned"
        );
        LedgerError::FactorNotFound {
            activity_type: submission.activity_type.clone(),
            date: submission.date.clone(),
        }
    })?;

    let adjusted = match adjust_emissions(submission.emissions, factor.factor_value) {
        Ok(v) => v,
        Err(e) => {
            warn!(caller = %caller, error = ?e, "Rejected emission submission");
            return Err(e);
        }
    };

    let user = stores
        .user_data
        .get(caller)?
        .ok_or_else(|| LedgerError::UserNotFound(caller.to_string()))?;

    let sequence = user.emissions_records.len() as u64;
    let record = EmissionRecord {
        id: record_key(caller, &submission.activity_type, &submission.date, sequence),
        activity_type: submission.activity_type.clone(),
        description: submission.description.clone(),
        emissions: adjusted,
        date: submission.date.clone(),
    };

    stores.user_data.insert(caller, &user.with_record(record.clone()))?;

    info!(
        caller = %caller,
        activity_type = %record.activity_type,
        emissions = record.emissions,
        sequence,
        "Recorded emission"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnvironmentalFactors, UserData};

    fn setup(factor_value: u64) -> (Stores, CallerIdentity) {
        let stores = Stores::temporary().unwrap();
        let key = factor_key("commute", "2024-01-01");
        stores
            .environmental_factors
            .insert(
                &key,
                &EnvironmentalFactors {
                    id: key.clone(),
                    factor_name: "car".into(),
                    factor_description: "petrol car".into(),
                    factor_value,
                },
            )
            .unwrap();
        let caller = CallerIdentity::new("uhCAk_alice");
        stores
            .user_data
            .insert(&caller, &UserData::new(caller.clone(), "alice"))
            .unwrap();
        (stores, caller)
    }

    fn history(stores: &Stores, caller: &CallerIdentity) -> Vec<EmissionRecord> {
        stores.user_data.get(caller).unwrap().unwrap().emissions_records
    }

    #[test]
    fn test_commute_scenario() {
        let (stores, caller) = setup(2);
        let submission = EmissionSubmission::new("commute", "drove to work", 50, "2024-01-01");

        let record = record_emission(&stores, &caller, &submission).unwrap();

        assert_eq!(record.emissions, 100);
        assert_eq!(record.activity_type, "commute");
        assert_eq!(history(&stores, &caller), vec![record]);
    }

    #[test]
    fn test_history_grows_in_submission_order() {
        let (stores, caller) = setup(3);
        let first = record_emission(&stores, &caller, &EmissionSubmission::new("commute", "bus", 1, "2024-01-01")).unwrap();
        let second = record_emission(&stores, &caller, &EmissionSubmission::new("commute", "car", 10, "2024-01-01")).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(history(&stores, &caller), vec![first, second]);
    }

    #[test]
    fn test_zero_emissions_is_invalid() {
        let (stores, caller) = setup(2);
        let err = record_emission(&stores, &caller, &EmissionSubmission::new("commute", "walk", 0, "2024-01-01"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(history(&stores, &caller).is_empty());
    }

    #[test]
    fn test_empty_fields_are_invalid() {
        let cases = [
            EmissionSubmission::new("", "d", 1, "2024-01-01"),
            EmissionSubmission::new("commute", "", 1, "2024-01-01"),
            EmissionSubmission::new("commute", "d", 1, ""),
        ];
        for submission in cases {
            assert!(matches!(submission.validate(), Err(LedgerError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_missing_factor() {
        let (stores, caller) = setup(2);
        let err = record_emission(&stores, &caller, &EmissionSubmission::new("commute", "car", 5, "2024-01-02"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::FactorNotFound { .. }));
        assert!(history(&stores, &caller).is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let (stores, _) = setup(2);
        let stranger = CallerIdentity::new("uhCAk_stranger");
        let err = record_emission(&stores, &stranger, &EmissionSubmission::new("commute", "car", 5, "2024-01-01"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::UserNotFound(_)));
        assert!(!stores.user_data.contains_key(&stranger).unwrap());
        assert_eq!(stores.user_data.len(), 1);
    }

    #[test]
    fn test_overflow_is_rejected_not_wrapped() {
        let (stores, caller) = setup(u64::MAX);
        let err = record_emission(&stores, &caller, &EmissionSubmission::new("commute", "car", 2, "2024-01-01"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(history(&stores, &caller).is_empty());
        assert_eq!(adjust_emissions(u64::MAX, 1).unwrap(), u64::MAX);
    }
}
