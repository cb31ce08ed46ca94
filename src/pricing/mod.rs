//! Pricing
//!
//! Plan table, billing cycles and discount quotes. Amounts are kept in
//! cents; [`format_usd`] turns them into display strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::listing::UnknownFacet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl FromStr for BillingCycle {
    type Err = UnknownFacet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(UnknownFacet {
                kind: "billing cycle",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for PlanTier {
    type Err = UnknownFacet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "premium" => Ok(PlanTier::Premium),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(UnknownFacet {
                kind: "plan",
                value: other.to_string(),
            }),
        }
    }
}

/// A plan as shown in the pricing table
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanOffer {
    pub tier: PlanTier,
    pub name: &'static str,
    pub price_cents: u64,
    pub cycle: BillingCycle,
    /// Saving against twelve monthly payments, yearly Premium only
    pub save_cents: u64,
    pub popular: bool,
    pub features: &'static [&'static str],
}

impl PlanTier {
    pub fn all() -> &'static [PlanTier] {
        &[PlanTier::Free, PlanTier::Premium, PlanTier::Enterprise]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Premium => "Premium",
            PlanTier::Enterprise => "Enterprise",
        }
    }

    pub fn price_cents(&self, cycle: BillingCycle) -> u64 {
        match (self, cycle) {
            (PlanTier::Free, _) => 0,
            (PlanTier::Premium, BillingCycle::Monthly) => 199,
            (PlanTier::Premium, BillingCycle::Yearly) => 1999,
            (PlanTier::Enterprise, BillingCycle::Monthly) => 499,
            (PlanTier::Enterprise, BillingCycle::Yearly) => 4999,
        }
    }

    pub fn features(&self) -> &'static [&'static str] {
        match self {
            PlanTier::Free => &[
                "3 essays per month",
                "Basic grammar check",
                "Limited vocabulary suggestions",
                "Standard feedback",
                "Email support",
            ],
            PlanTier::Premium => &[
                "Unlimited essays",
                "Advanced grammar analysis",
                "Vocabulary enhancement",
                "Detailed feedback",
                "Priority support",
                "Progress tracking",
                "Sample essays library",
                "Export reports",
            ],
            PlanTier::Enterprise => &[
                "Everything in Premium",
                "Custom branding",
                "Team management",
                "API access",
                "Dedicated support",
                "Training sessions",
                "Custom features",
                "SLA guarantee",
            ],
        }
    }

    pub fn offer(&self, cycle: BillingCycle) -> PlanOffer {
        let save_cents = match (self, cycle) {
            (PlanTier::Premium, BillingCycle::Yearly) => 400,
            _ => 0,
        };
        PlanOffer {
            tier: *self,
            name: self.name(),
            price_cents: self.price_cents(cycle),
            cycle,
            save_cents,
            popular: *self == PlanTier::Premium,
            features: self.features(),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pricing table for one billing cycle
pub fn plans(cycle: BillingCycle) -> Vec<PlanOffer> {
    PlanTier::all().iter().map(|tier| tier.offer(cycle)).collect()
}

/// Price after a percentage discount
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub tier: PlanTier,
    pub cycle: BillingCycle,
    pub list_cents: u64,
    pub discount_percent: u8,
    pub discount_cents: u64,
    pub total_cents: u64,
}

/// Price `tier` for `cycle`, taking `discount_percent` off (capped at 100)
pub fn quote(tier: PlanTier, cycle: BillingCycle, discount_percent: u8) -> Quote {
    let discount_percent = discount_percent.min(100);
    let list_cents = tier.price_cents(cycle);
    // half a cent rounds up
    let discount_cents = (list_cents * u64::from(discount_percent) + 50) / 100;
    Quote {
        tier,
        cycle,
        list_cents,
        discount_percent,
        discount_cents,
        total_cents: list_cents - discount_cents,
    }
}

/// Currencies accepted at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentCurrency {
    #[serde(rename = "UZS")]
    Uzs,
    #[serde(rename = "USD")]
    Usd,
}

impl PaymentCurrency {
    /// Premium checkout price in the currency's smallest displayed unit
    pub fn premium_price(&self) -> u64 {
        match self {
            PaymentCurrency::Usd => 1999,
            PaymentCurrency::Uzs => 249_000,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PaymentCurrency::Usd => format_usd(self.premium_price()),
            PaymentCurrency::Uzs => format!("{} UZS", group_thousands(self.premium_price())),
        }
    }
}

/// `$19.99`
pub fn format_usd(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table() {
        assert_eq!(PlanTier::Premium.price_cents(BillingCycle::Monthly), 199);
        assert_eq!(PlanTier::Enterprise.price_cents(BillingCycle::Yearly), 4999);
        assert_eq!(PlanTier::Free.price_cents(BillingCycle::Yearly), 0);
    }

    #[test]
    fn test_yearly_premium_shows_saving() {
        let table = plans(BillingCycle::Yearly);
        assert_eq!(table.len(), 3);
        assert_eq!(table[1].save_cents, 400);
        assert!(table[1].popular);
        assert_eq!(plans(BillingCycle::Monthly)[1].save_cents, 0);
    }

    #[test]
    fn test_quote_with_discount() {
        let q = quote(PlanTier::Premium, BillingCycle::Yearly, 20);
        assert_eq!(q.discount_cents, 400);
        assert_eq!(q.total_cents, 1599);

        let q = quote(PlanTier::Premium, BillingCycle::Monthly, 15);
        // 29.85 cents off rounds to 30
        assert_eq!(q.discount_cents, 30);
        assert_eq!(q.total_cents, 169);
    }

    #[test]
    fn test_quote_caps_discount() {
        let q = quote(PlanTier::Enterprise, BillingCycle::Monthly, 250);
        assert_eq!(q.discount_percent, 100);
        assert_eq!(q.total_cents, 0);
    }

    #[test]
    fn test_currency_labels() {
        assert_eq!(PaymentCurrency::Usd.label(), "$19.99");
        assert_eq!(PaymentCurrency::Uzs.label(), "249,000 UZS");
        assert_eq!(format_usd(5), "$0.05");
    }

    #[test]
    fn test_parse_cycle() {
        assert_eq!("yearly".parse::<BillingCycle>().unwrap(), BillingCycle::Yearly);
        assert!("weekly".parse::<BillingCycle>().is_err());
    }
}
