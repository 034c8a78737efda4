//! Aggregation and reporting over a user's emission history. Read-only.

use tracing::debug;

use crate::error::LedgerError;
use crate::identity::CallerIdentity;
use crate::models::EmissionRecord;
use crate::store::Stores;

/// Totals strictly above this many kg CO2e get the reduction advice
pub const REPORT_THRESHOLD: u64 = 1000;

pub const REDUCE_RECOMMENDATION: &str = "Please consider reducing energy consumption, using public transportation, and choosing sustainable food options to reduce emissions.";

pub const POSITIVE_RECOMMENDATION: &str =
    "Great job! You are making a very significant impact on the environment, and for future generations.";

/// Sum of `emissions` in sequence order, saturating at `u64::MAX`
pub fn sum_emissions(records: &[EmissionRecord]) -> u64 {
    records
        .iter()
        .fold(0u64, |total, record| total.saturating_add(record.emissions))
}

pub fn recommendation(total: u64) -> &'static str {
    if total > REPORT_THRESHOLD {
        REDUCE_RECOMMENDATION
    } else {
        POSITIVE_RECOMMENDATION
    }
}

pub fn format_report(total: u64) -> String {
    format!(
        "Total emissions: {} kg CO2 equivalent\n\nRecommendations:\n{}",
        total,
        recommendation(total)
    )
}

pub fn total_emissions(stores: &Stores, caller: &CallerIdentity) -> Result<u64, LedgerError> {
    let user = stores
        .user_data
        .get(caller)?
        .ok_or_else(|| LedgerError::UserNotFound(caller.to_string()))?;
    let total = sum_emissions(&user.emissions_records);
    debug!(caller = %caller, records = user.emissions_records.len(), total, "Computed total emissions");
    Ok(total)
}

pub fn generate_report(stores: &Stores, caller: &CallerIdentity) -> Result<String, LedgerError> {
    total_emissions(stores, caller).map(format_report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::EntityKey;
    use crate::models::UserData;

    fn record(emissions: u64) -> EmissionRecord {
        EmissionRecord {
            id: EntityKey::from_raw("r"),
            activity_type: "diet".into(),
            description: "beef".into(),
            emissions,
            date: "2024-03-01".into(),
        }
    }

    fn user_with(totals: &[u64]) -> (Stores, CallerIdentity) {
        let stores = Stores::temporary().unwrap();
        let caller = CallerIdentity::new("carol");
        let mut user = UserData::new(caller.clone(), "carol");
        for &e in totals {
            user = user.with_record(record(e));
        }
        stores.user_data.insert(&caller, &user).unwrap();
        (stores, caller)
    }

    #[test]
    fn test_empty_history_totals_zero() {
        let (stores, caller) = user_with(&[]);
        assert_eq!(total_emissions(&stores, &caller).unwrap(), 0);
    }

    #[test]
    fn test_total_is_order_independent() {
        let (a, ca) = user_with(&[5, 300, 70]);
        let (b, cb) = user_with(&[70, 5, 300]);
        assert_eq!(total_emissions(&a, &ca).unwrap(), 375);
        assert_eq!(total_emissions(&b, &cb).unwrap(), 375);
    }

    #[test]
    fn test_total_saturates() {
        assert_eq!(sum_emissions(&[record(u64::MAX), record(1)]), u64::MAX);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (stores, caller) = user_with(&[600, 400]);
        let report = generate_report(&stores, &caller).unwrap();
        assert!(report.starts_with("Total emissions: 1000 kg CO2 equivalent"));
        assert!(report.ends_with(POSITIVE_RECOMMENDATION));

        let (stores, caller) = user_with(&[600, 401]);
        let report = generate_report(&stores, &caller).unwrap();
        assert!(report.starts_with("Total emissions: 1001 kg CO2 equivalent"));
        assert!(report.ends_with(REDUCE_RECOMMENDATION));
    }

    #[test]
    fn test_unknown_user() {
        let stores = Stores::temporary().unwrap();
        let nobody = CallerIdentity::new("nobody");
        assert!(matches!(total_emissions(&stores, &nobody), Err(LedgerError::UserNotFound(_))));
        assert!(matches!(generate_report(&stores, &nobody), Err(LedgerError::UserNotFound(_))));
    }
}
