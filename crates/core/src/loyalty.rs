//! Loyalty program redemption options.
//!
//! The storefront API lists redemption methods ("spend N points for a D
//! discount"). The cart page offers the active ones, disabling those the
//! customer cannot afford. The cart also shows how many points the
//! current total would earn.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{RedemptionMethodId, format_fixed2};

/// Default option label. `%(points)s` and `%(discount)s` are substituted.
pub const DEFAULT_OPTION_TEMPLATE: &str = "For %(points)s points get %(discount)s discount";

/// A redemption method as listed by the storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedemptionMethod {
    pub id: RedemptionMethodId,
    #[serde(default)]
    pub points_to_redeem: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub reward: Reward,
}

/// What a redemption method grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Reward {
    #[serde(default)]
    pub discount_value: Option<Decimal>,
}

/// The customer's point balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoyaltyBalance {
    #[serde(default)]
    pub balance: u64,
}

/// Points the storefront API says a purchase total would earn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CalculatedPoints {
    #[serde(default)]
    pub points: u64,
}

/// A selectable entry in the redemption dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionOption {
    pub id: RedemptionMethodId,
    pub label: String,
    /// The method costs more points than the customer has.
    pub disabled: bool,
}

/// Build dropdown options for every active method, in API order.
///
/// `template` falls back to [`DEFAULT_OPTION_TEMPLATE`] when `None`.
#[must_use]
pub fn redemption_options(
    methods: &[RedemptionMethod],
    balance: LoyaltyBalance,
    currency_code: &str,
    template: Option<&str>,
) -> Vec<RedemptionOption> {
    let template = template.unwrap_or(DEFAULT_OPTION_TEMPLATE);

    methods
        .iter()
        .filter(|method| method.is_active)
        .map(|method| {
            let discount = method
                .reward
                .discount_value
                .map_or_else(|| "0.00".to_string(), format_fixed2);
            let label = template
                .replacen("%(points)s", &method.points_to_redeem.to_string(), 1)
                .replacen("%(discount)s", &format!("{discount} {currency_code}"), 1);

            RedemptionOption {
                id: method.id.clone(),
                label,
                disabled: method.points_to_redeem > balance.balance,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn methods() -> Vec<RedemptionMethod> {
        serde_json::from_value(json!([
            {"id": 1, "points_to_redeem": 100, "is_active": true, "reward": {"discount_value": 10}},
            {"id": "2", "points_to_redeem": 500, "is_active": true, "reward": {"discount_value": "50.5"}},
            {"id": 3, "points_to_redeem": 50, "is_active": false, "reward": {"discount_value": 5}},
            {"id": 4, "points_to_redeem": 20, "is_active": true, "reward": {}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_inactive_methods_are_skipped() {
        let options = redemption_options(&methods(), LoyaltyBalance { balance: 0 }, "SAR", None);
        let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn test_labels_use_default_template() {
        let options = redemption_options(&methods(), LoyaltyBalance { balance: 0 }, "SAR", None);
        assert_eq!(
            options.first().unwrap().label,
            "For 100 points get 10.00 SAR discount"
        );
        assert_eq!(
            options.get(1).unwrap().label,
            "For 500 points get 50.50 SAR discount"
        );
        assert_eq!(
            options.get(2).unwrap().label,
            "For 20 points get 0.00 SAR discount"
        );
    }

    #[test]
    fn test_custom_template() {
        let options = redemption_options(
            &methods(),
            LoyaltyBalance { balance: 0 },
            "USD",
            Some("%(discount)s off for %(points)s pts"),
        );
        assert_eq!(options.first().unwrap().label, "10.00 USD off for 100 pts");
    }

    #[test]
    fn test_unaffordable_methods_are_disabled() {
        let options = redemption_options(&methods(), LoyaltyBalance { balance: 100 }, "SAR", None);
        let disabled: Vec<_> = options.iter().map(|o| o.disabled).collect();
        assert_eq!(disabled, vec![false, true, false]);
    }

    #[test]
    fn test_balance_defaults_to_zero() {
        let balance: LoyaltyBalance = serde_json::from_value(json!({})).unwrap();
        assert_eq!(balance.balance, 0);

        let earned: CalculatedPoints = serde_json::from_value(json!({})).unwrap();
        assert_eq!(earned.points, 0);
        let earned: CalculatedPoints = serde_json::from_value(json!({"points": 42})).unwrap();
        assert_eq!(earned.points, 42);
    }
}
