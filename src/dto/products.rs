use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// Full product field set, used for both create and update. On update the `sku`
/// field is ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductForm {
    #[serde(default)]
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// How a form field is offered to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChoice {
    /// Closed list of the values already in the catalog; the first option is empty.
    Choice { options: Vec<String> },
    FreeText,
}

impl FieldChoice {
    pub fn from_existing(values: Vec<String>) -> Self {
        let mut options: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if options.is_empty() {
            return FieldChoice::FreeText;
        }
        options.sort();
        options.dedup();
        options.insert(0, String::new());
        FieldChoice::Choice { options }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            FieldChoice::Choice { options } => options.iter().any(|o| o == value),
            FieldChoice::FreeText => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductFormChoices {
    pub category: FieldChoice,
    pub manufacturer: FieldChoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_existing_values_means_free_text() {
        assert_eq!(FieldChoice::from_existing(vec![]), FieldChoice::FreeText);
        assert_eq!(
            FieldChoice::from_existing(vec![String::new()]),
            FieldChoice::FreeText
        );
    }

    #[test]
    fn choice_list_starts_with_empty_option() {
        let choice = FieldChoice::from_existing(vec!["Shoes".into(), "Bags".into(), "Shoes".into()]);
        assert_eq!(
            choice,
            FieldChoice::Choice {
                options: vec![String::new(), "Bags".into(), "Shoes".into()]
            }
        );
        assert!(choice.accepts(""));
        assert!(choice.accepts("Bags"));
        assert!(!choice.accepts("Hats"));
    }
}
