//! Retention policy
//!
//! `expires_at = created_at + retention_days`, capped to the category
//! maximum. The biometric category is always capped (default 30 days) and
//! always expires, even when the caller asked for indefinite retention.

use arcana_core::PrivacyLevel;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Applied when the request does not specify `retention_days`.
    pub default_days: u32,
    /// Hard cap for `privacy_level = biometric`.
    pub biometric_cap_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            default_days: 365,
            biometric_cap_days: 30,
        }
    }
}

impl RetentionPolicy {
    /// Effective retention in days for a request.
    pub fn effective_days(&self, requested: Option<u32>, privacy: PrivacyLevel) -> u32 {
        let days = requested.unwrap_or(self.default_days);
        match privacy.retention_cap_days(self.biometric_cap_days) {
            Some(cap) => days.min(cap),
            None => days,
        }
    }

    /// Expiry timestamp for a reading created at `created_at`.
    ///
    /// `requested = Some(0)` means "do not persist beyond the request" and
    /// yields an immediate expiry; `None` uses the default. Non-biometric
    /// readings may opt out of expiry entirely with `u32::MAX`.
    pub fn expires_at(
        &self,
        created_at: DateTime<Utc>,
        requested: Option<u32>,
        privacy: PrivacyLevel,
    ) -> Option<DateTime<Utc>> {
        if privacy != PrivacyLevel::Biometric && requested == Some(u32::MAX) {
            return None;
        }
        let days = self.effective_days(requested, privacy);
        Some(created_at + Duration::days(days as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retention_is_a_year() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.effective_days(None, PrivacyLevel::Standard), 365);
    }

    #[test]
    fn biometric_capped_at_30_days() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.effective_days(Some(365), PrivacyLevel::Biometric), 30);
        assert_eq!(policy.effective_days(None, PrivacyLevel::Biometric), 30);
        assert_eq!(policy.effective_days(Some(7), PrivacyLevel::Biometric), 7);
    }

    #[test]
    fn biometric_expiry_never_exceeds_cap() {
        let policy = RetentionPolicy::default();
        let created = Utc::now();
        let expires = policy
            .expires_at(created, Some(u32::MAX), PrivacyLevel::Biometric)
            .expect("biometric readings always expire");
        assert!(expires - created <= Duration::days(30));
    }

    #[test]
    fn standard_can_opt_out_of_expiry() {
        let policy = RetentionPolicy::default();
        assert!(policy
            .expires_at(Utc::now(), Some(u32::MAX), PrivacyLevel::Standard)
            .is_none());
    }

    #[test]
    fn requested_days_respected_below_cap() {
        let policy = RetentionPolicy::default();
        let created = Utc::now();
        let expires = policy
            .expires_at(created, Some(10), PrivacyLevel::Enhanced)
            .unwrap();
        assert_eq!(expires - created, Duration::days(10));
    }
}
