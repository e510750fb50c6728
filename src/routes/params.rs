use serde::Deserialize;
use utoipa::ToSchema;

/// Stock ordering in the `ordering` query parameter: `stock` ascending, `-stock` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub enum StockOrdering {
    #[serde(rename = "stock")]
    Asc,
    #[serde(rename = "-stock")]
    Desc,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductListQuery {
    /// Case-insensitive substring of name, description, manufacturer or category.
    pub search: Option<String>,
    /// Exact supplier name.
    pub supplier: Option<String>,
    pub ordering: Option<StockOrdering>,
}
