//! Ecommerce transactions and their line items.

use crate::event::{require, require_finite};
use crate::EventResult;
use tracker_payload::constants::keys;
use tracker_payload::{PayloadBuilder, SelfDescribingJson};

/// A completed order. Tracking it emits one `tr` event plus one `ti`
/// event per item.
#[derive(Debug, Clone, PartialEq)]
pub struct EcommerceTransaction {
    pub order_id: String,
    pub total_value: f64,
    pub affiliation: Option<String>,
    pub tax_value: Option<f64>,
    pub shipping: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub items: Vec<EcommerceTransactionItem>,
}

impl EcommerceTransaction {
    pub fn new(order_id: impl Into<String>, total_value: f64) -> Self {
        Self {
            order_id: order_id.into(),
            total_value,
            affiliation: None,
            tax_value: None,
            shipping: None,
            city: None,
            state: None,
            country: None,
            currency: None,
            items: Vec::new(),
        }
    }

    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn tax_value(mut self, tax_value: f64) -> Self {
        self.tax_value = Some(tax_value);
        self
    }

    pub fn shipping(mut self, shipping: f64) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn item(mut self, item: EcommerceTransactionItem) -> Self {
        self.items.push(item);
        self
    }

    pub(crate) fn validate(&self) -> EventResult<()> {
        require("order_id", &self.order_id)?;
        require_finite("total_value", self.total_value)?;
        if let Some(tax) = self.tax_value {
            require_finite("tax_value", tax)?;
        }
        if let Some(shipping) = self.shipping {
            require_finite("shipping", shipping)?;
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    pub(crate) fn add_fields(&self, builder: &mut PayloadBuilder) -> EventResult<()> {
        builder.add(keys::TR_ID, self.order_id.as_str())?;
        builder.add(keys::TR_TOTAL, self.total_value)?;
        builder.add_opt(keys::TR_AFFILIATION, self.affiliation.as_deref())?;
        builder.add_opt(keys::TR_TAX, self.tax_value)?;
        builder.add_opt(keys::TR_SHIPPING, self.shipping)?;
        builder.add_opt(keys::TR_CITY, self.city.as_deref())?;
        builder.add_opt(keys::TR_STATE, self.state.as_deref())?;
        builder.add_opt(keys::TR_COUNTRY, self.country.as_deref())?;
        builder.add_opt(keys::TR_CURRENCY, self.currency.as_deref())?;
        Ok(())
    }
}

/// One line of an [`EcommerceTransaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct EcommerceTransactionItem {
    pub sku: String,
    pub price: f64,
    pub quantity: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub contexts: Vec<SelfDescribingJson>,
}

impl EcommerceTransactionItem {
    pub fn new(sku: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self {
            sku: sku.into(),
            price,
            quantity,
            name: None,
            category: None,
            currency: None,
            contexts: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn contexts(mut self, contexts: Vec<SelfDescribingJson>) -> Self {
        self.contexts = contexts;
        self
    }

    fn validate(&self) -> EventResult<()> {
        require("sku", &self.sku)?;
        require_finite("price", self.price)
    }

    pub(crate) fn add_fields(&self, builder: &mut PayloadBuilder, order_id: &str) -> EventResult<()> {
        builder.add(keys::TI_ITEM_ID, order_id)?;
        builder.add(keys::TI_ITEM_SKU, self.sku.as_str())?;
        builder.add_opt(keys::TI_ITEM_NAME, self.name.as_deref())?;
        builder.add_opt(keys::TI_ITEM_CATEGORY, self.category.as_deref())?;
        builder.add(keys::TI_ITEM_PRICE, self.price)?;
        builder.add(keys::TI_ITEM_QUANTITY, self.quantity)?;
        builder.add_opt(keys::TI_ITEM_CURRENCY, self.currency.as_deref())?;
        Ok(())
    }
}
