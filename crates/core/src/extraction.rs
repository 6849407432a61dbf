//! Boundary to the receipt document-extraction service.
//!
//! The extractor is an opaque external collaborator: given receipt bytes and
//! optional payment-voucher bytes it returns a best-effort guess at the
//! expense fields, every one of them nullable. The guess is a prefill only:
//! the submitter's overrides always win, and nothing is persisted until the
//! merged result passes normal submission validation.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use viatix_shared::types::Currency;

/// Best-effort fields guessed from a receipt document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedExpense {
    /// Vendor name.
    pub merchant: Option<String>,
    /// Vendor tax identifier.
    pub tax_id: Option<String>,
    /// Date printed on the receipt.
    pub date: Option<NaiveDate>,
    /// Total amount printed on the receipt.
    pub amount: Option<Decimal>,
    /// Currency of the amount.
    pub currency: Option<Currency>,
    /// Suggested category, if the extractor recognized one of the hints.
    pub category: Option<String>,
    /// Free-text description of the purchase.
    pub description: Option<String>,
}

impl ExtractedExpense {
    /// Overlays the submitter's explicit values on top of the guess. A
    /// `Some` override always replaces the extracted value.
    #[must_use]
    pub fn merged_with(self, overrides: Self) -> Self {
        Self {
            merchant: overrides.merchant.or(self.merchant),
            tax_id: overrides.tax_id.or(self.tax_id),
            date: overrides.date.or(self.date),
            amount: overrides.amount.or(self.amount),
            currency: overrides.currency.or(self.currency),
            category: overrides.category.or(self.category),
            description: overrides.description.or(self.description),
        }
    }
}

/// Errors from the extraction collaborator.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be read at all.
    #[error("Unreadable document: {0}")]
    Unreadable(String),
    /// The service is unavailable; the caller falls back to manual entry.
    #[error("Extraction service unavailable: {0}")]
    Unavailable(String),
}

/// Opaque document-extraction service.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts a best-effort guess from receipt bytes, with an optional
    /// payment voucher and category hints.
    async fn extract(
        &self,
        receipt: &[u8],
        voucher: Option<&[u8]>,
        category_hints: &[String],
    ) -> Result<ExtractedExpense, ExtractionError>;
}

/// Extractor that guesses nothing; used in tests and as the manual-entry
/// fallback.
pub struct NullExtractor;

#[async_trait]
impl DocumentExtractor for NullExtractor {
    async fn extract(
        &self,
        _receipt: &[u8],
        _voucher: Option<&[u8]>,
        _category_hints: &[String],
    ) -> Result<ExtractedExpense, ExtractionError> {
        Ok(ExtractedExpense::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overrides_win() {
        let guessed = ExtractedExpense {
            merchant: Some("Taxis Libres".to_string()),
            amount: Some(dec!(18000)),
            category: Some("Transporte".to_string()),
            ..Default::default()
        };
        let overrides = ExtractedExpense {
            amount: Some(dec!(19140)),
            ..Default::default()
        };

        let merged = guessed.merged_with(overrides);
        assert_eq!(merged.amount, Some(dec!(19140)));
        assert_eq!(merged.merchant.as_deref(), Some("Taxis Libres"));
        assert_eq!(merged.category.as_deref(), Some("Transporte"));
    }

    #[test]
    fn test_merge_with_empty_overrides_is_identity() {
        let guessed = ExtractedExpense {
            merchant: Some("Hotel Andino".to_string()),
            amount: Some(dec!(250000)),
            ..Default::default()
        };
        let merged = guessed.clone().merged_with(ExtractedExpense::default());
        assert_eq!(merged, guessed);
    }

    #[tokio::test]
    async fn test_null_extractor_guesses_nothing() {
        let extracted = NullExtractor
            .extract(b"receipt bytes", None, &[])
            .await
            .unwrap();
        assert_eq!(extracted, ExtractedExpense::default());
    }
}
