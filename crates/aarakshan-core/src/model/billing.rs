//! Payments and the premium catalog.

use super::record;
use crate::{PaymentId, PremiumServiceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// AMOUNT
// =============================================================================

/// A sum of money in paise (1/100 rupee).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    /// Whole rupees.
    #[must_use]
    pub const fn from_rupees(rupees: u64) -> Self {
        Self(rupees.saturating_mul(100))
    }

    #[must_use]
    pub const fn paise(self) -> u64 {
        self.0
    }

    /// Parse a decimal rupee string (`"499"`, `"499.5"`, `"499.00"`).
    ///
    /// At most two fractional digits; anything else is `None`.
    #[must_use]
    pub fn parse_rupees(text: &str) -> Option<Self> {
        let text = text.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let rupees: u64 = whole.parse().ok()?;
        let paise: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()?.checked_mul(10)?,
            _ => frac.parse().ok()?,
        };
        rupees.checked_mul(100)?.checked_add(paise).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// PAYMENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    Card,
    Netbanking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    /// `TXN<yyyymmdd><5 digits>`, unique.
    pub transaction_id: String,
    pub amount: Amount,
    /// Catalog slug of what was bought.
    pub service: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub date_created: DateTime<Utc>,
    pub date_processed: Option<DateTime<Utc>>,
}

// =============================================================================
// CATALOG
// =============================================================================

/// A purchasable item of the premium page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumService {
    pub id: PremiumServiceId,
    /// `premium`, `pro`, `express`; unique.
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Amount,
    /// Human-readable duration ("6 महिने").
    pub duration_label: String,
    /// Subscription length; `None` for one-time services.
    pub duration_days: Option<u32>,
    pub features: Vec<String>,
    pub is_active: bool,
}

record!(Payment, Payments);
record!(PremiumService, PremiumServices);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_displays_in_rupees() {
        assert_eq!(Amount::from_rupees(499).to_string(), "₹499.00");
        assert_eq!(Amount(199_950).to_string(), "₹1999.50");
    }

    #[test]
    fn parses_decimal_rupees_without_floats() {
        assert_eq!(Amount::parse_rupees("999"), Some(Amount::from_rupees(999)));
        assert_eq!(Amount::parse_rupees("999.00"), Some(Amount::from_rupees(999)));
        assert_eq!(Amount::parse_rupees("12.5"), Some(Amount(1250)));
        assert_eq!(Amount::parse_rupees(" 7.05 "), Some(Amount(705)));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", ".5", "1.234", "-1", "1e3", "abc", "1.x"] {
            assert_eq!(Amount::parse_rupees(bad), None, "{bad}");
        }
    }
}
