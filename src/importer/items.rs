//! The order items column: a flat comma-separated list alternating SKU and quantity,
//! e.g. `"A112T4, 2, F635R4, 1"`.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemsSpec {
    pub pairs: Vec<(String, i32)>,
    /// Final SKU token with no quantity after it.
    pub trailing: Option<String>,
}

pub fn parse_items_spec(spec: &str) -> Result<ItemsSpec, String> {
    if spec.trim().is_empty() {
        return Ok(ItemsSpec::default());
    }
    let tokens: Vec<&str> = spec.split(',').map(str::trim).collect();

    let mut parsed = ItemsSpec::default();
    let mut chunks = tokens.chunks_exact(2);
    for pair in &mut chunks {
        let (sku, quantity) = (pair[0], pair[1]);
        let quantity = quantity
            .parse::<i32>()
            .map_err(|_| format!("quantity {quantity:?} for item {sku:?} is not an integer"))?;
        if quantity <= 0 {
            return Err(format!("quantity {quantity} for item {sku:?} must be positive"));
        }
        parsed.pairs.push((sku.to_string(), quantity));
    }
    parsed.trailing = chunks.remainder().first().map(|token| token.to_string());
    Ok(parsed)
}
