//! Key derivation
//!
//! Factor and record keys are content-addressed the same way blobs are
//! elsewhere in the stack: `sha256-<hex>` over a canonical encoding of the
//! inputs. Every field is length-prefixed, so `("a-b", "c")` and
//! `("a", "b-c")` never collide, and a domain tag keeps factor keys and
//! record keys in separate spaces.
//!
//! All functions here are pure; the same inputs produce the same key in
//! every process, which is what lets provisioning and computation agree.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::identity::CallerIdentity;

const FACTOR_DOMAIN: &[u8] = b"carbon-ledger/factor/v1";
const RECORD_DOMAIN: &[u8] = b"carbon-ledger/record/v1";
const HISTORY_DOMAIN: &[u8] = b"carbon-ledger/history/v1";

/// Derived identifier for factors, records and catalog entities
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Wrap an already-formed key, e.g. a catalog id chosen by an operator
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of the environmental factor for `activity_type` on `date`
pub fn factor_key(activity_type: &str, date: &str) -> EntityKey {
    digest(FACTOR_DOMAIN, &[activity_type.as_bytes(), date.as_bytes()])
}

/// Key of the `sequence`-th record in `owner`'s history.
///
/// Records from different owners, or repeated submissions of the same
/// activity and date by one owner, get distinct keys.
pub fn record_key(owner: &CallerIdentity, activity_type: &str, date: &str, sequence: u64) -> EntityKey {
    digest(
        RECORD_DOMAIN,
        &[
            owner.as_str().as_bytes(),
            activity_type.as_bytes(),
            date.as_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

/// Key of `owner`'s per-activity-type history view
pub fn activity_history_key(owner: &CallerIdentity, activity_type: &str) -> EntityKey {
    digest(HISTORY_DOMAIN, &[owner.as_str().as_bytes(), activity_type.as_bytes()])
}

fn digest(domain: &[u8], fields: &[&[u8]]) -> EntityKey {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }
    EntityKey(format!("sha256-{}", hex::encode(hasher.finalize())))
}
