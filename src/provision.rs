//! Out-of-band provisioning
//!
//! Registration, factor publishing, settings and catalog maintenance. The
//! emission pipeline only reads what these paths write: a user must be
//! registered and a factor published before a submission can succeed.

use tracing::{debug, info};

use crate::error::LedgerError;
use crate::identity::CallerIdentity;
use crate::keys::{activity_history_key, factor_key, EntityKey};
use crate::models::{
    BenchmarkData, EmissionRecord, EnvironmentalFactors, UserActivityHistory, UserData, UserSettings,
};
use crate::store::Stores;

/// Create `UserData` with an empty history for `identity`.
///
/// Refuses to overwrite an existing registration, which would otherwise
/// discard the user's history.
pub fn register_user(stores: &Stores, identity: &CallerIdentity, username: &str) -> Result<UserData, LedgerError> {
    if identity.is_empty() {
        return Err(LedgerError::InvalidInput("identity is empty".into()));
    }
    if username.is_empty() {
        return Err(LedgerError::InvalidInput("username is empty".into()));
    }
    if stores.user_data.contains_key(identity)? {
        return Err(LedgerError::UserAlreadyExists(identity.to_string()));
    }

    let user = UserData::new(identity.clone(), username);
    stores.user_data.insert(identity, &user)?;
    info!(identity = %identity, username, "Registered user");
    Ok(user)
}

pub fn user(stores: &Stores, identity: &CallerIdentity) -> Result<UserData, LedgerError> {
    stores
        .user_data
        .get(identity)?
        .ok_or_else(|| LedgerError::UserNotFound(identity.to_string()))
}

/// Records of `identity` in submission order
pub fn user_history(stores: &Stores, identity: &CallerIdentity) -> Result<Vec<EmissionRecord>, LedgerError> {
    user(stores, identity).map(|u| u.emissions_records)
}

/// Publish the factor for `activity_type` on `date`. Last write wins.
pub fn provision_factor(
    stores: &Stores,
    activity_type: &str,
    date: &str,
    factor_name: &str,
    factor_description: &str,
    factor_value: u64,
) -> Result<EnvironmentalFactors, LedgerError> {
    if activity_type.is_empty() || date.is_empty() {
        return Err(LedgerError::InvalidInput("activity type and date are required".into()));
    }
    if factor_name.is_empty() {
        return Err(LedgerError::InvalidInput("factor name is empty".into()));
    }
    if factor_value == 0 {
        return Err(LedgerError::InvalidInput("factor value must be greater than zero".into()));
    }

    let id = factor_key(activity_type, date);
    let factor = EnvironmentalFactors {
        id: id.clone(),
        factor_name: factor_name.to_string(),
        factor_description: factor_description.to_string(),
        factor_value,
    };
    let replaced = stores.environmental_factors.insert(&id, &factor)?;
    info!(
        activity_type,
        date,
        factor_value,
        replaced = replaced.is_some(),
        "Provisioned environmental factor"
    );
    Ok(factor)
}

pub fn factor(stores: &Stores, activity_type: &str, date: &str) -> Result<Option<EnvironmentalFactors>, LedgerError> {
    stores.environmental_factors.get(&factor_key(activity_type, date))
}

/// Settings are independent of registration; any identity may hold them.
pub fn set_user_settings(
    stores: &Stores,
    identity: &CallerIdentity,
    preferred_units: &str,
    notifications_enabled: bool,
) -> Result<UserSettings, LedgerError> {
    if preferred_units.is_empty() {
        return Err(LedgerError::InvalidInput("preferred units are empty".into()));
    }
    let settings = UserSettings {
        identity: identity.clone(),
        preferred_units: preferred_units.to_string(),
        notifications_enabled,
    };
    stores.user_settings.insert(identity, &settings)?;
    debug!(identity = %identity, preferred_units, notifications_enabled, "Saved user settings");
    Ok(settings)
}

pub fn user_settings(stores: &Stores, identity: &CallerIdentity) -> Result<Option<UserSettings>, LedgerError> {
    stores.user_settings.get(identity)
}

pub fn put_benchmark(stores: &Stores, benchmark: &BenchmarkData) -> Result<(), LedgerError> {
    if benchmark.id.as_str().is_empty() || benchmark.benchmark_name.is_empty() {
        return Err(LedgerError::InvalidInput("benchmark id and name are required".into()));
    }
    stores.benchmarks.insert(&benchmark.id, benchmark)?;
    info!(id = %benchmark.id, threshold = benchmark.emissions_threshold, "Saved benchmark");
    Ok(())
}

pub fn benchmark(stores: &Stores, id: &EntityKey) -> Result<Option<BenchmarkData>, LedgerError> {
    stores.benchmarks.get(id)
}

/// Store a per-activity-type view imported from elsewhere. The pipeline
/// never writes these.
pub fn import_activity_history(stores: &Stores, view: &UserActivityHistory) -> Result<(), LedgerError> {
    if view.activity_type.is_empty() {
        return Err(LedgerError::InvalidInput("activity type is empty".into()));
    }
    let key = activity_history_key(&view.identity, &view.activity_type);
    stores.user_activity_history.insert(&key, view)?;
    debug!(identity = %view.identity, activity_type = %view.activity_type, "Imported activity history");
    Ok(())
}

pub fn activity_history(
    stores: &Stores,
    identity: &CallerIdentity,
    activity_type: &str,
) -> Result<Option<UserActivityHistory>, LedgerError> {
    stores
        .user_activity_history
        .get(&activity_history_key(identity, activity_type))
}
