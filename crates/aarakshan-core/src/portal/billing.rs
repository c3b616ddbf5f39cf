//! Premium catalog, payments and subscription upgrades.
//!
//! There is no payment gateway: a payment is recorded as successful the
//! moment it is processed. The charged amount always comes from the catalog.

use super::Portal;
use crate::error::{PortalError, Result};
use crate::model::{
    Amount, NotificationKind, Payment, PaymentMethod, PaymentStatus, PremiumService,
    SubscriptionTier, User,
};
use crate::primitives::TRANSACTION_PREFIX;
use crate::storage::{Batch, StoreExt, UniqueIndex};
use crate::{PaymentId, PremiumServiceId, UserId};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Catalog slug.
    pub service: String,
    pub payment_method: PaymentMethod,
    /// Amount the client showed the user; must match the catalog if given.
    #[serde(default)]
    pub amount: Option<Amount>,
}

/// The three services offered on the premium page.
#[must_use]
pub fn default_catalog() -> Vec<PremiumService> {
    let service = |slug: &str,
                   name: &str,
                   description: &str,
                   rupees: u64,
                   label: &str,
                   days: Option<u32>,
                   features: &[&str]| PremiumService {
        id: PremiumServiceId(0),
        slug: slug.into(),
        name: name.into(),
        description: description.into(),
        price: Amount::from_rupees(rupees),
        duration_label: label.into(),
        duration_days: days,
        features: features.iter().map(|f| (*f).to_string()).collect(),
        is_active: true,
    };
    vec![
        service(
            "premium",
            "प्रीमियम सब्स्क्रिप्शन",
            "प्राधान्य प्रक्रिया आणि SMS अपडेट्स",
            499,
            "6 महिने",
            Some(180),
            &["प्राधान्य प्रक्रिया", "SMS अपडेट्स", "डेडिकेटेड सपोर्ट", "24/7 हेल्पलाइन"],
        ),
        service(
            "pro",
            "प्रो सब्स्क्रिप्शन",
            "जलद प्रक्रिया आणि व्यक्तिगत सल्लागार",
            999,
            "1 वर्ष",
            Some(365),
            &["जलद प्रक्रिया", "SMS + Email अपडेट्स", "व्यक्तिगत सल्लागार", "डॉक्युमेंट रिव्यू"],
        ),
        service(
            "express",
            "तत्काळ प्रक्रिया",
            "एकवेळ तत्काळ प्रक्रिया सेवा",
            1999,
            "एकवेळ",
            None,
            &["30 दिवसांत प्रक्रिया", "प्राधान्य हाताळणी", "डेडिकेटेड केस मॅनेजर"],
        ),
    ]
}

impl Portal {
    /// Insert catalog entries whose slug is not present yet.
    /// Returns how many were added.
    pub fn install_catalog(&self, services: Vec<PremiumService>) -> Result<usize> {
        let mut batch = Batch::new();
        let mut added = 0;
        for mut service in services {
            if self
                .store
                .lookup(UniqueIndex::ServiceSlug, &service.slug)?
                .is_some()
            {
                continue;
            }
            service.id = PremiumServiceId(self.next_id::<PremiumService>()?);
            batch.put(&service)?;
            batch.claim(UniqueIndex::ServiceSlug, service.slug.clone(), service.id.0);
            added += 1;
        }
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        Ok(added)
    }

    /// Active services, cheapest first.
    pub fn catalog(&self) -> Result<Vec<PremiumService>> {
        let mut services = self.store.fetch_where(|s: &PremiumService| s.is_active)?;
        services.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        Ok(services)
    }

    /// The purchase page for one service.
    pub fn quote(&self, slug: &str) -> Result<PremiumService> {
        self.store
            .find::<PremiumService>(UniqueIndex::ServiceSlug, slug)?
            .filter(|s| s.is_active)
            .ok_or_else(|| PortalError::not_found("service", slug))
    }

    /// Charge a user for a service.
    ///
    /// Subscriptions (`premium`, `pro`) switch the user's tier and run for
    /// the service's duration from `now`.
    pub fn process_payment(
        &self,
        user_id: UserId,
        request: PaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<Payment> {
        let service = self.quote(&request.service)?;
        if let Some(claimed) = request.amount {
            if claimed != service.price {
                return Err(PortalError::Validation(format!(
                    "amount {claimed} does not match the price of {} ({})",
                    service.slug, service.price
                )));
            }
        }
        self.exclusive(|| {
            let mut user = self.require::<User>("user", user_id.0)?;
            if let Some(tier) = SubscriptionTier::from_slug(&service.slug) {
                user.subscription_type = tier;
                user.subscription_expires = service
                    .duration_days
                    .map(|days| now + Duration::days(i64::from(days)));
            }

            let id = PaymentId(self.next_id::<Payment>()?);
            let date = now.format("%Y%m%d").to_string();

            self.commit_with_fresh_number(
                UniqueIndex::TransactionId,
                |rng| format!("{TRANSACTION_PREFIX}{date}{}", rng.gen_range(10_000..=99_999)),
                |txn| {
                    let payment = Payment {
                        id,
                        user_id,
                        transaction_id: txn.to_string(),
                        amount: service.price,
                        service: service.slug.clone(),
                        payment_method: request.payment_method,
                        status: PaymentStatus::Success,
                        date_created: now,
                        date_processed: Some(now),
                    };
                    let notice = self.notification(
                        user_id,
                        "पेमेंट यशस्वी",
                        format!(
                            "तुमचा पेमेंट {} यशस्वीरित्या प्रक्रिया झाला. Transaction ID: {txn}",
                            payment.amount
                        ),
                        NotificationKind::Success,
                        now,
                    )?;
                    let mut batch = Batch::new();
                    batch.put(&payment)?.put(&user)?.put(&notice)?;
                    batch.claim(UniqueIndex::TransactionId, txn, id.0);
                    Ok((batch, payment))
                },
            )
        })
    }

    /// Payments of a user, newest first.
    pub fn payments_of(&self, user_id: UserId) -> Result<Vec<Payment>> {
        let mut payments = self.store.fetch_where(|p: &Payment| p.user_id == user_id)?;
        payments.sort_by(|a, b| {
            b.date_created
                .cmp(&a.date_created)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{new_user, portal, t0};

    fn ready() -> (Portal, UserId) {
        let p = portal();
        p.install_catalog(default_catalog()).expect("catalog");
        let user = p.register(new_user("rahul"), t0()).expect("register");
        (p, user.id)
    }

    fn buy(service: &str, amount: Option<Amount>) -> PaymentRequest {
        PaymentRequest {
            service: service.into(),
            payment_method: PaymentMethod::Upi,
            amount,
        }
    }

    #[test]
    fn catalog_install_is_idempotent() {
        let (p, _) = ready();
        assert_eq!(p.install_catalog(default_catalog()).expect("again"), 0);
        let slugs: Vec<_> = p.catalog().expect("catalog").into_iter().map(|s| s.slug).collect();
        assert_eq!(slugs, vec!["premium", "pro", "express"]);
    }

    #[test]
    fn quote_unknown_service_fails() {
        let (p, _) = ready();
        assert_eq!(p.quote("pro").expect("pro").price, Amount::from_rupees(999));
        assert!(matches!(p.quote("gold"), Err(PortalError::NotFound { .. })));
    }

    #[test]
    fn subscription_purchase_upgrades_user() {
        let (p, user) = ready();
        let payment = p
            .process_payment(user, buy("premium", Some(Amount::from_rupees(499))), t0())
            .expect("pay");

        let date = t0().format("%Y%m%d").to_string();
        assert!(payment.transaction_id.starts_with(&format!("TXN{date}")));
        assert_eq!(payment.transaction_id.len(), 3 + 8 + 5);
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.amount, Amount::from_rupees(499));

        let row = p.profile(user).expect("user");
        assert_eq!(row.subscription_type, SubscriptionTier::Premium);
        assert_eq!(row.subscription_expires, Some(t0() + Duration::days(180)));

        let inbox = p.recent_notifications(user, 1).expect("inbox");
        assert!(inbox[0].message.contains("₹499.00"));
        assert!(inbox[0].message.contains(&payment.transaction_id));
    }

    #[test]
    fn one_time_service_keeps_tier() {
        let (p, user) = ready();
        p.process_payment(user, buy("express", None), t0()).expect("pay");
        assert_eq!(p.profile(user).expect("user").subscription_type, SubscriptionTier::Free);
        assert_eq!(p.payments_of(user).expect("payments").len(), 1);
    }

    #[test]
    fn mismatched_amount_is_rejected_without_side_effects() {
        let (p, user) = ready();
        let result = p.process_payment(user, buy("pro", Some(Amount::from_rupees(1))), t0());
        assert!(matches!(result, Err(PortalError::Validation(_))));
        assert!(p.payments_of(user).expect("payments").is_empty());
        assert_eq!(p.profile(user).expect("user").subscription_type, SubscriptionTier::Free);
    }

    #[test]
    fn transaction_ids_are_unique() {
        let (p, user) = ready();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..20 {
            let payment = p.process_payment(user, buy("express", None), t0()).expect("pay");
            assert!(seen.insert(payment.transaction_id));
        }
    }

    #[test]
    fn concurrent_payment_keeps_deactivation() {
        use std::sync::Barrier;

        let (p, user) = ready();
        for round in 0..40 {
            p.set_user_active(user, true).expect("activate");
            let barrier = Barrier::new(2);
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    p.process_payment(user, buy("premium", None), t0()).expect("pay");
                });
                scope.spawn(|| {
                    barrier.wait();
                    p.set_user_active(user, false).expect("deactivate");
                });
            });
            let row = p.profile(user).expect("user");
            assert!(!row.is_active, "round {round}: payment revived the account");
            assert_eq!(row.subscription_type, SubscriptionTier::Premium);
        }
    }
}
