//! Diff between the desired basket and persisted purchases.
//!
//! A line is created when its exact `(variant, quantity)` pair is missing from
//! the persisted purchases, which also covers quantity changes since creating
//! a purchase replaces any purchase of the same variant. A purchase is deleted
//! when its variant is no longer wanted at all.

use crate::basket::Basket;
use crate::catalog::Catalog;
use crate::error::FormLevelError;
use crate::types::{Purchase, VariantId};
use serde::{Deserialize, Serialize};

/// A variant and its quantity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Variant
    pub variant_id: VariantId,
    /// Quantity
    pub quantity: u32,
}

impl From<&Purchase> for PurchaseLine {
    fn from(purchase: &Purchase) -> Self {
        Self {
            variant_id: purchase.product_variant_id,
            quantity: purchase.quantity,
        }
    }
}

impl From<PurchaseLine> for Purchase {
    fn from(line: PurchaseLine) -> Self {
        Self {
            product_variant_id: line.variant_id,
            quantity: line.quantity,
        }
    }
}

/// Requests that bring persisted purchases in line with the basket
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Purchases to create
    pub to_create: Vec<PurchaseLine>,
    /// Purchases to delete
    pub to_delete: Vec<PurchaseLine>,
}

impl ReconciliationPlan {
    /// Whether nothing needs to change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    /// Number of requests the plan issues
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.to_create.len() + self.to_delete.len()
    }
}

/// Compute creates and deletes from desired and current lines
#[must_use]
pub fn diff(desired: &[PurchaseLine], current: &[PurchaseLine]) -> ReconciliationPlan {
    let to_create = desired
        .iter()
        .filter(|line| !current.contains(line))
        .copied()
        .collect();
    let to_delete = current
        .iter()
        .filter(|line| !desired.iter().any(|d| d.variant_id == line.variant_id))
        .copied()
        .collect();
    ReconciliationPlan {
        to_create,
        to_delete,
    }
}

/// Plan the reconciliation of `basket` against `current` purchases
///
/// # Errors
///
/// Basket lines whose variant `catalog` does not offer are not bought; a
/// persisted purchase of such a variant is deleted.
///
/// # Errors
///
/// Returns [`FormLevelError::MissingRequiredProduct`] naming the first
/// required product of `catalog` without a selected variant. Nothing is
/// planned in that case.
pub fn plan(
    basket: &Basket,
    catalog: &Catalog,
    current: &[Purchase],
) -> Result<ReconciliationPlan, FormLevelError> {
    if let Some(product_name) = basket.first_missing_required(catalog) {
        return Err(FormLevelError::MissingRequiredProduct {
            product_name: product_name.to_string(),
        });
    }
    let desired: Vec<PurchaseLine> = basket
        .entries()
        .into_iter()
        .filter(|line| {
            let offered = catalog.contains(line.variant_id);
            if !offered {
                tracing::warn!(variant_id = %line.variant_id, "basket line not offered, skipped");
            }
            offered
        })
        .collect();
    let current: Vec<PurchaseLine> = current.iter().map(PurchaseLine::from).collect();
    Ok(diff(&desired, &current))
}
