use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{DeskError, Result};
use crate::types::ProductId;

/// catalogue product with its stock level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

/// requested product in a sale cart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// overrides the catalogue price
    pub unit_price: Option<Money>,
}

impl CartItem {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self { product_id, quantity, unit_price: None }
    }

    pub fn priced(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        Self { product_id, quantity, unit_price: Some(unit_price) }
    }
}

/// priced product line stored on a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl ProductLine {
    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// total of a set of product lines
pub fn lines_total(lines: &[ProductLine]) -> Money {
    lines.iter().map(ProductLine::subtotal).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Sale,
    Purchase,
    /// reversal after a sale was edited
    Correction,
}

/// stock movement log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: ProductId,
    pub direction: MovementDirection,
    pub quantity: u32,
    pub reason: MovementReason,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

/// products, stock levels and movements
#[derive(Debug, Clone, Default)]
pub struct StockBook {
    products: BTreeMap<ProductId, Product>,
    movements: Vec<StockMovement>,
}

impl StockBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// register a product with its opening stock
    pub fn add_product(
        &mut self,
        name: impl Into<String>,
        price: Money,
        opening_stock: u32,
        now: DateTime<Utc>,
    ) -> Result<ProductId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeskError::validation("product name is required"));
        }
        if price.is_negative() {
            return Err(DeskError::validation(format!("product price cannot be negative: {}", price)));
        }

        let id = Uuid::new_v4();
        self.products.insert(
            id,
            Product {
                id,
                name,
                price,
                stock: 0,
            },
        );
        if opening_stock > 0 {
            self.receive(id, opening_stock, "opening stock", now)?;
        }
        Ok(id)
    }

    /// book incoming stock
    pub fn receive(&mut self, product_id: ProductId, quantity: u32, note: &str, now: DateTime<Utc>) -> Result<u32> {
        if quantity == 0 {
            return Err(DeskError::validation("received quantity must be positive"));
        }
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or(DeskError::NotFound { entity: "product", id: product_id })?;
        product.stock = product
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DeskError::validation(format!("stock level of {} would overflow", product.name)))?;
        let stock = product.stock;

        self.log(product_id, MovementDirection::In, quantity, MovementReason::Purchase, note, now);
        Ok(stock)
    }

    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.get(&product_id)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    /// price a cart and check the whole of it against stock, without touching stock
    pub fn quote(&self, cart: &[CartItem]) -> Result<Vec<ProductLine>> {
        if cart.is_empty() {
            return Err(DeskError::validation("no products selected"));
        }

        let mut requested: BTreeMap<ProductId, u32> = BTreeMap::new();
        let mut lines = Vec::with_capacity(cart.len());

        for item in cart {
            if item.quantity == 0 {
                return Err(DeskError::validation(format!(
                    "quantity for product {} must be a positive integer",
                    item.product_id
                )));
            }
            let product = self
                .products
                .get(&item.product_id)
                .ok_or(DeskError::NotFound { entity: "product", id: item.product_id })?;

            let unit_price = item.unit_price.unwrap_or(product.price);
            if unit_price.is_negative() {
                return Err(DeskError::validation(format!("negative price for {}", product.name)));
            }

            let total = requested.entry(product.id).or_default();
            *total = total.checked_add(item.quantity).ok_or_else(|| DeskError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: u32::MAX,
            })?;
            lines.push(ProductLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price,
                quantity: item.quantity,
            });
        }

        // the same product may appear on several lines
        for (product_id, quantity) in &requested {
            if let Some(product) = self.products.get(product_id) {
                if product.stock < *quantity {
                    return Err(DeskError::InsufficientStock {
                        product: product.name.clone(),
                        available: product.stock,
                        requested: *quantity,
                    });
                }
            }
        }

        Ok(lines)
    }

    /// quote the cart, then decrement stock for every line
    pub fn withdraw(&mut self, cart: &[CartItem], note: &str, now: DateTime<Utc>) -> Result<Vec<ProductLine>> {
        let lines = self.quote(cart)?;

        for line in &lines {
            if let Some(product) = self.products.get_mut(&line.product_id) {
                // quote already checked the aggregated quantity
                product.stock = product.stock.saturating_sub(line.quantity);
            }
            self.log(line.product_id, MovementDirection::Out, line.quantity, MovementReason::Sale, note, now);
        }

        tracing::debug!(lines = lines.len(), total = %lines_total(&lines), "stock withdrawn");
        Ok(lines)
    }

    /// put previously sold lines back on the shelf
    pub fn restore(&mut self, lines: &[ProductLine], note: &str, now: DateTime<Utc>) {
        for line in lines {
            match self.products.get_mut(&line.product_id) {
                Some(product) => {
                    let restocked = product.stock.saturating_add(line.quantity);
                    if restocked - product.stock < line.quantity {
                        tracing::warn!(
                            product_id = %line.product_id,
                            quantity = line.quantity,
                            "restock capped at maximum stock"
                        );
                    }
                    product.stock = restocked;
                    self.log(line.product_id, MovementDirection::In, line.quantity, MovementReason::Correction, note, now);
                }
                None => {
                    tracing::warn!(product_id = %line.product_id, "cannot restock unknown product");
                }
            }
        }
    }

    fn log(
        &mut self,
        product_id: ProductId,
        direction: MovementDirection,
        quantity: u32,
        reason: MovementReason,
        note: &str,
        now: DateTime<Utc>,
    ) {
        self.movements.push(StockMovement {
            id: Uuid::new_v4(),
            product_id,
            direction,
            quantity,
            reason,
            note: note.to_string(),
            recorded_at: now,
        });
    }
}
