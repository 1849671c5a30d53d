//! Enrolled person ("legendario") roster model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Roster entry with its deliveries embedded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrolledPerson {
    pub id: Uuid,
    pub name: String,
    /// Tax ID, digits only (unique)
    pub tax_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub enrollment_number: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Merchandise item id -> delivery timestamp; absent means not delivered
    #[serde(default)]
    #[schema(value_type = Object)]
    pub deliveries: BTreeMap<Uuid, DateTime<Utc>>,
}

impl EnrolledPerson {
    pub fn has_received(&self, item_id: Uuid) -> bool {
        self.deliveries.contains_key(&item_id)
    }

    /// Roster match used by the in-memory backend; Postgres does the
    /// equivalent in SQL.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        if looks_like_tax_id(term) && self.tax_id.contains(&normalize_tax_id(term)) {
            return true;
        }
        if self.enrollment_number.as_deref() == Some(term) {
            return true;
        }
        fold_search_key(&self.name).contains(&fold_search_key(term))
    }
}

/// Keep only the digits of a tax ID ("123.456.789-09" -> "12345678909")
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Digits with optional tax-ID punctuation
pub fn looks_like_tax_id(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
        && term.chars().all(|c| c.is_ascii_digit() || ".-/ ".contains(c))
}

/// Lowercase and strip diacritics so "José" matches "jose"
pub fn fold_search_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// New roster entry (single create or confirmed import row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewEnrolledPerson {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Tax ID is required"))]
    pub tax_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub enrollment_number: Option<String>,
}

impl NewEnrolledPerson {
    /// Trim fields, reduce the tax ID to digits and drop empty optionals
    pub fn normalized(mut self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        self.name = self.name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.tax_id = normalize_tax_id(&self.tax_id);
        self.email = clean(self.email);
        self.phone = clean(self.phone);
        self.enrollment_number = clean(self.enrollment_number);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEnrolledPerson {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub enrollment_number: Option<String>,
}

impl EnrolledPerson {
    pub fn apply(&mut self, data: &UpdateEnrolledPerson) {
        if let Some(ref v) = data.name {
            self.name = v.clone();
        }
        if data.email.is_some() {
            self.email = data.email.clone();
        }
        if data.phone.is_some() {
            self.phone = data.phone.clone();
        }
        if data.enrollment_number.is_some() {
            self.enrollment_number = data.enrollment_number.clone();
        }
    }
}

/// Roster search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct RosterQuery {
    /// Name, tax ID or enrollment number
    pub q: Option<String>,
    pub limit: Option<i64>,
    /// Client request sequence, echoed back so stale responses can be dropped
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterSearchResponse {
    pub seq: Option<u64>,
    pub people: Vec<EnrolledPerson>,
}
