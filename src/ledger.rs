//! Ledger facade
//!
//! Binds the stores to an [`IdentityProvider`] and exposes the operations a
//! host invokes. The caller is never passed explicitly; each operation asks
//! the provider who is calling. Results carry plain messages as `String`
//! errors, matching what a remote caller receives.

use crate::error::LedgerError;
use crate::identity::{CallerIdentity, IdentityProvider};
use crate::models::{EmissionRecord, UserData, UserSettings};
use crate::pipeline::{self, EmissionSubmission};
use crate::provision;
use crate::report;
use crate::store::Stores;

pub struct Ledger<P> {
    stores: Stores,
    identity: P,
}

impl<P: IdentityProvider> Ledger<P> {
    pub fn new(stores: Stores, identity: P) -> Self {
        Self { stores, identity }
    }

    pub fn caller(&self) -> CallerIdentity {
        self.identity.caller()
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Mutating: requires exclusive access so the read-modify-write of the
    /// caller's history cannot interleave with another invocation.
    pub fn record_emission(
        &mut self,
        activity_type: &str,
        description: &str,
        emissions: u64,
        date: &str,
    ) -> Result<EmissionRecord, String> {
        let submission = EmissionSubmission::new(activity_type, description, emissions, date);
        pipeline::record_emission(&self.stores, &self.caller(), &submission).map_err(public)
    }

    pub fn total_emissions(&self) -> Result<u64, String> {
        report::total_emissions(&self.stores, &self.caller()).map_err(public)
    }

    pub fn generate_report(&self) -> Result<String, String> {
        report::generate_report(&self.stores, &self.caller()).map_err(public)
    }

    /// Register the current caller
    pub fn register(&mut self, username: &str) -> Result<UserData, String> {
        provision::register_user(&self.stores, &self.caller(), username).map_err(public)
    }

    pub fn history(&self) -> Result<Vec<EmissionRecord>, String> {
        provision::user_history(&self.stores, &self.caller()).map_err(public)
    }

    pub fn settings(&self) -> Result<Option<UserSettings>, String> {
        provision::user_settings(&self.stores, &self.caller()).map_err(public)
    }

    pub fn update_settings(&mut self, preferred_units: &str, notifications_enabled: bool) -> Result<UserSettings, String> {
        provision::set_user_settings(&self.stores, &self.caller(), preferred_units, notifications_enabled)
            .map_err(public)
    }

    pub fn into_stores(self) -> Stores {
        self.stores
    }
}

/// Message shown to a caller. Infrastructure failures are not described
/// beyond their category.
fn public(e: LedgerError) -> String {
    if e.is_domain() {
        e.to_string()
    } else {
        tracing::error!(error = %e, "Ledger operation failed");
        "Internal storage error.".to_string()
    }
}
