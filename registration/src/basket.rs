//! Basket of selected variants.
//!
//! The basket holds at most one line per product, never a zero-quantity line,
//! and unique variants always at quantity 1. Every operation takes the catalog
//! currently offered to the user, so a basket can only contain variants the
//! user may buy.

use crate::catalog::{Catalog, SelectionMode};
use crate::reconciliation::PurchaseLine;
use crate::types::{Money, ProductId, ProductVariant, Purchase, VariantId};

/// Highest quantity a line may hold
pub const MAX_QUANTITY: u32 = 99;

/// One selected variant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasketLine {
    /// Selected variant
    pub variant: ProductVariant,
    /// Quantity, always in `1..=MAX_QUANTITY`
    pub quantity: u32,
}

impl BasketLine {
    /// Price of the line
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.variant.price.saturating_mul(self.quantity)
    }
}

/// Outcome of [`Basket::toggle_variant`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    /// The variant was added at quantity 1
    Added,
    /// The variant was removed
    Removed,
    /// The variant replaced the product's previous selection
    Replaced {
        /// Variant that was deselected
        previous: VariantId,
    },
    /// Clicked the selected variant of a required radio group
    Kept,
    /// The variant is not offered under that product
    Unknown,
}

/// Client-side selection prior to persistence
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Basket {
    lines: Vec<BasketLine>,
}

impl Basket {
    /// Empty basket
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a basket from persisted purchases
    ///
    /// Purchases of variants missing from `catalog` are left out and returned
    /// separately. Quantities are brought back within the basket's bounds.
    #[must_use]
    pub fn from_purchases(purchases: &[Purchase], catalog: &Catalog) -> (Self, Vec<VariantId>) {
        let mut basket = Self::new();
        let mut unknown = Vec::new();
        for purchase in purchases {
            let Some(variant) = catalog.variant(purchase.product_variant_id) else {
                unknown.push(purchase.product_variant_id);
                continue;
            };
            if basket.line_for_product(variant.product_id).is_some() || purchase.quantity == 0 {
                continue;
            }
            let quantity = if variant.unique {
                1
            } else {
                purchase.quantity.min(MAX_QUANTITY)
            };
            basket.lines.push(BasketLine {
                variant: variant.clone(),
                quantity,
            });
        }
        (basket, unknown)
    }

    /// Selected lines in selection order
    #[must_use]
    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether `variant_id` is selected
    #[must_use]
    pub fn contains(&self, variant_id: VariantId) -> bool {
        self.lines.iter().any(|line| line.variant.id == variant_id)
    }

    /// Quantity of a selected variant
    #[must_use]
    pub fn quantity_of(&self, variant_id: VariantId) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.variant.id == variant_id)
            .map(|line| line.quantity)
    }

    /// The line selected for a product
    #[must_use]
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&BasketLine> {
        self.lines.iter().find(|line| line.variant.product_id == product_id)
    }

    /// Select or deselect a variant
    ///
    /// Checkbox products add the variant if absent and remove it otherwise.
    /// Radio groups replace the product's selection with the clicked variant;
    /// clicking the selected variant deselects it unless the product is
    /// required.
    pub fn toggle_variant(
        &mut self,
        catalog: &Catalog,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Toggle {
        let Some(variant) = catalog
            .variant(variant_id)
            .filter(|v| v.product_id == product_id)
        else {
            return Toggle::Unknown;
        };
        let existing = self
            .lines
            .iter()
            .position(|line| line.variant.product_id == product_id);

        match (catalog.selection_mode(product_id), existing) {
            (_, None) => {
                self.lines.push(BasketLine {
                    variant: variant.clone(),
                    quantity: 1,
                });
                Toggle::Added
            },
            (Some(SelectionMode::Radio), Some(index))
                if self.lines[index].variant.id != variant_id =>
            {
                let previous = self.lines[index].variant.id;
                self.lines[index] = BasketLine {
                    variant: variant.clone(),
                    quantity: 1,
                };
                Toggle::Replaced { previous }
            },
            (Some(SelectionMode::Radio), Some(_)) if variant.product.required => Toggle::Kept,
            (_, Some(index)) => {
                self.lines.remove(index);
                Toggle::Removed
            },
        }
    }

    /// Set the quantity of a selected non-unique variant
    ///
    /// `value` is clamped to `1..=MAX_QUANTITY`. Returns the new quantity, or
    /// `None` when the variant is unique or not selected.
    pub fn set_quantity(&mut self, variant_id: VariantId, value: i64) -> Option<u32> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.variant.id == variant_id && !line.variant.unique)?;
        let clamped = value.clamp(1, i64::from(MAX_QUANTITY));
        line.quantity = u32::try_from(clamped).unwrap_or(MAX_QUANTITY);
        Some(line.quantity)
    }

    /// Drop lines whose variant is no longer offered
    ///
    /// Returns the removed variant IDs.
    pub fn retain_offered(&mut self, catalog: &Catalog) -> Vec<VariantId> {
        let mut removed = Vec::new();
        self.lines.retain(|line| {
            let offered = catalog.contains(line.variant.id);
            if !offered {
                removed.push(line.variant.id);
            }
            offered
        });
        removed
    }

    /// Name of the first required product with no selected variant
    #[must_use]
    pub fn first_missing_required<'c>(&self, catalog: &'c Catalog) -> Option<&'c str> {
        catalog
            .required_products()
            .into_iter()
            .find(|(product_id, _)| self.line_for_product(*product_id).is_none())
            .map(|(_, name)| name)
    }

    /// Whether every required product has a selected variant
    #[must_use]
    pub fn required_products_satisfied(&self, catalog: &Catalog) -> bool {
        self.first_missing_required(catalog).is_none()
    }

    /// Total price
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::ZERO, |total, line| total.saturating_add(line.subtotal()))
    }

    /// Desired purchases
    #[must_use]
    pub fn entries(&self) -> Vec<PurchaseLine> {
        self.lines
            .iter()
            .map(|line| PurchaseLine {
                variant_id: line.variant.id,
                quantity: line.quantity,
            })
            .collect()
    }
}
