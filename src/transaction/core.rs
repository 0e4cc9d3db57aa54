//! Defines the core data models and validation rules for transactions.

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{Error, aggregate_validation_errors, auth::UserID, database_id::TransactionId};

/// The maximum number of characters in a transaction title.
pub const TITLE_MAX_LENGTH: usize = 100;
/// The maximum number of characters in a transaction category.
pub const CATEGORY_MAX_LENGTH: usize = 50;

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Serialized with the keys `_id`, `userId`, `title`, `amount`, `date`, `category`,
/// `createdAt` and `updatedAt`, with timestamps in RFC 3339 format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    #[serde(rename = "_id")]
    pub id: TransactionId,
    /// The user that created the transaction.
    pub user_id: UserID,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned (positive) or spent (negative). Never zero.
    pub amount: f64,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// A free-form category, e.g. "Food & Dining".
    pub category: String,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Transaction fields that have passed validation.
///
/// The only way to get one of these outside of this crate is through
/// [TransactionRequest::validate] or [TransactionPatch::merge].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransaction {
    pub(crate) title: String,
    pub(crate) amount: f64,
    pub(crate) date: OffsetDateTime,
    pub(crate) category: String,
}

impl ValidatedTransaction {
    /// The trimmed, non-empty title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The non-zero amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The date in UTC, truncated to milliseconds.
    pub fn date(&self) -> OffsetDateTime {
        self.date
    }

    /// The trimmed, non-empty category.
    pub fn category(&self) -> &str {
        &self.category
    }
}

/// The body of a request to create a transaction.
///
/// Every field is optional at the parsing stage so that missing fields are
/// reported together by [TransactionRequest::validate].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Required, at most [TITLE_MAX_LENGTH] characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Required and non-zero. Negative for expenses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Either an RFC 3339 timestamp or a `YYYY-MM-DD` date. Defaults to now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Required, at most [CATEGORY_MAX_LENGTH] characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TransactionRequest {
    /// Check every field, defaulting a missing or empty `date` to the current time.
    ///
    /// # Errors
    /// Returns an [Error::Validation] listing every field that failed.
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => Some(now()),
            Some(raw_date) => parse_date(raw_date),
        };

        validate_fields(self.title, self.amount, date, self.category)
    }
}

/// The body of a request to update a transaction. All fields are optional.
///
/// `title`, `date` and `category` keep their previous value when omitted, null or empty.
/// `amount` is replaced whenever the key is present, so `{"amount": null}` fails validation
/// rather than being ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    /// Replaces the title when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `None` if the key is absent, `Some(None)` if it is `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Option<f64>>,
    /// Replaces the date when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Replaces the category when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TransactionPatch {
    /// Apply the supplied fields over `existing` and validate the result.
    ///
    /// # Errors
    /// Returns an [Error::Validation] listing every field of the merged transaction that failed.
    pub fn merge(self, existing: &Transaction) -> Result<ValidatedTransaction, Error> {
        let title = non_empty(self.title).unwrap_or_else(|| existing.title.clone());
        let amount = match self.amount {
            Some(amount) => amount,
            None => Some(existing.amount),
        };
        let date = match non_empty(self.date) {
            Some(raw_date) => parse_date(raw_date.trim()),
            None => Some(existing.date),
        };
        let category = non_empty(self.category).unwrap_or_else(|| existing.category.clone());

        validate_fields(Some(title), amount, date, Some(category))
    }
}

/// Distinguishes a key that is present with a null value from a missing key.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_fields(
    title: Option<String>,
    amount: Option<f64>,
    date: Option<OffsetDateTime>,
    category: Option<String>,
) -> Result<ValidatedTransaction, Error> {
    let title = title.map(|title| title.trim().to_owned()).unwrap_or_default();
    let category = category
        .map(|category| category.trim().to_owned())
        .unwrap_or_default();
    let mut messages = Vec::new();

    if title.is_empty() {
        messages.push("Please add a title");
    } else if title.chars().count() > TITLE_MAX_LENGTH {
        messages.push("Title cannot be more than 100 characters");
    }

    match amount {
        None => messages.push("Please add an amount"),
        Some(amount) if amount == 0.0 => messages.push("Amount cannot be zero"),
        Some(_) => {}
    }

    if date.is_none() {
        messages.push("Please add a valid date");
    }

    if category.is_empty() {
        messages.push("Please add a category");
    } else if category.chars().count() > CATEGORY_MAX_LENGTH {
        messages.push("Category cannot be more than 50 characters");
    }

    aggregate_validation_errors(messages)?;

    match (amount, date) {
        (Some(amount), Some(date)) => Ok(ValidatedTransaction {
            title,
            amount,
            date,
            category,
        }),
        _ => Err(Error::Validation("Please add an amount".to_owned())),
    }
}

// ============================================================================
// DATES
// ============================================================================

/// The current time in UTC, truncated to whole milliseconds.
///
/// All timestamps are kept at millisecond precision so that they survive a round trip through
/// the database unchanged.
pub fn now() -> OffsetDateTime {
    truncate_to_millis(OffsetDateTime::now_utc())
}

pub(crate) fn truncate_to_millis(date_time: OffsetDateTime) -> OffsetDateTime {
    let date_time = date_time.to_offset(UtcOffset::UTC);
    let nanos = date_time.nanosecond();

    date_time
        .replace_nanosecond(nanos - nanos % 1_000_000)
        .unwrap_or(date_time)
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (taken as midnight UTC).
///
/// Returns `None` if `raw_date` is neither.
pub fn parse_date(raw_date: &str) -> Option<OffsetDateTime> {
    if let Ok(date_time) = OffsetDateTime::parse(raw_date, &Rfc3339) {
        return Some(truncate_to_millis(date_time));
    }

    Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}


#[cfg(test)]
mod merge_tests {
    use time::macros::datetime;

    use crate::{
        Error,
        auth::UserID,
        transaction::{Transaction, TransactionPatch},
    };

    fn existing() -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(1),
            title: "Lunch".to_owned(),
            amount: -20.0,
            date: datetime!(2025-01-01 12:00 UTC),
            category: "Food & Dining".to_owned(),
            created_at: datetime!(2025-01-01 12:00 UTC),
            updated_at: datetime!(2025-01-01 12:00 UTC),
        }
    }

    #[test]
    fn omitted_fields_keep_prior_values() {
        let patch = TransactionPatch {
            title: Some("New Title".to_owned()),
            ..Default::default()
        };

        let merged = patch.merge(&existing()).unwrap();

        assert_eq!(merged.title(), "New Title");
        assert_eq!(merged.amount(), -20.0);
        assert_eq!(merged.date(), datetime!(2025-01-01 12:00 UTC));
        assert_eq!(merged.category(), "Food & Dining");
    }

    #[test]
    fn empty_strings_keep_prior_values() {
        let patch = TransactionPatch {
            title: Some(String::new()),
            date: Some(String::new()),
            category: Some(String::new()),
            ..Default::default()
        };

        let merged = patch.merge(&existing()).unwrap();

        assert_eq!(merged.title(), "Lunch");
        assert_eq!(merged.category(), "Food & Dining");
    }

    #[test]
    fn amount_is_replaced_when_present() {
        let patch = TransactionPatch {
            amount: Some(Some(500.0)),
            ..Default::default()
        };

        assert_eq!(patch.merge(&existing()).unwrap().amount(), 500.0);
    }

    #[test]
    fn zero_amount_is_rejected_on_update() {
        let patch = TransactionPatch {
            amount: Some(Some(0.0)),
            ..Default::default()
        };

        assert_eq!(
            patch.merge(&existing()),
            Err(Error::Validation("Amount cannot be zero".to_owned()))
        );
    }

    #[test]
    fn null_amount_is_rejected_on_update() {
        let patch = TransactionPatch {
            amount: Some(None),
            ..Default::default()
        };

        assert_eq!(
            patch.merge(&existing()),
            Err(Error::Validation("Please add an amount".to_owned()))
        );
    }

    #[test]
    fn date_is_replaced_when_supplied() {
        let patch = TransactionPatch {
            date: Some("2024-02-29".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            patch.merge(&existing()).unwrap().date(),
            datetime!(2024-02-29 00:00 UTC)
        );
    }
}
