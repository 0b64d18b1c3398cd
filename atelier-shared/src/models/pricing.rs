/// Pricing plans

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Status;
use crate::store::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingPeriod {
    #[default]
    Monthly,
    Yearly,
    OneTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingPlan {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    pub currency: String,
    pub period: PricingPeriod,

    pub features: Vec<String>,
    pub popular: bool,
    pub button_text: String,
    pub button_link: Option<String>,

    pub order: i32,
    pub status: Status,
    pub featured: bool,
}

impl Default for PricingPlan {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            price: 0.0,
            currency: "USD".to_string(),
            period: PricingPeriod::default(),
            features: Vec::new(),
            popular: false,
            button_text: "Get Started".to_string(),
            button_link: None,
            order: 0,
            status: Status::default(),
            featured: false,
        }
    }
}

impl Document for PricingPlan {
    const COLLECTION: &'static str = "pricing_plans";
    const ENTITY: &'static str = "PricingPlan";
    const SEARCHABLE: &'static [&'static str] = &["name", "description"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let plan: PricingPlan = serde_json::from_str(r#"{"name":"Starter"}"#).unwrap();
        assert_eq!(plan.currency, "USD");
        assert_eq!(plan.button_text, "Get Started");
        assert_eq!(plan.period, PricingPeriod::Monthly);
    }

    #[test]
    fn test_one_time_period_serializes_kebab_case() {
        let plan = PricingPlan {
            name: "Audit".to_string(),
            period: PricingPeriod::OneTime,
            ..Default::default()
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["period"], "one-time");
    }

    #[test]
    fn test_negative_price_rejected() {
        let plan = PricingPlan {
            name: "Starter".to_string(),
            price: -10.0,
            ..Default::default()
        };
        assert!(plan.validate().is_err());
    }
}
