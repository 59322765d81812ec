//! Product catalog as seen by one user.
//!
//! Variants are grouped by product. A product with a single variant renders
//! as a checkbox; a product with several variants renders as a radio group.

use crate::types::{ProductId, ProductVariant, Roles, SchoolType, VariantId};

/// How a product's variants are selected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Single variant, on or off
    Checkbox,
    /// Several variants, at most one selected
    Radio,
}

/// A product with its offered variants
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductGroup<'a> {
    /// Product ID
    pub product_id: ProductId,
    /// Product name
    pub name: &'a str,
    /// Whether a variant must be selected
    pub required: bool,
    /// Offered variants in catalog order
    pub variants: Vec<&'a ProductVariant>,
}

impl ProductGroup<'_> {
    /// Selection mode of the group
    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        if self.variants.len() == 1 {
            SelectionMode::Checkbox
        } else {
            SelectionMode::Radio
        }
    }
}

/// Enabled variants in catalog order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    variants: Vec<ProductVariant>,
}

impl Catalog {
    /// Build a catalog, hiding disabled variants
    #[must_use]
    pub fn new(variants: impl IntoIterator<Item = ProductVariant>) -> Self {
        Self {
            variants: variants.into_iter().filter(|v| v.enabled).collect(),
        }
    }

    /// Variants a user of `school_type` with `roles` may buy
    ///
    /// Variants without a public type are offered to everyone.
    #[must_use]
    pub fn offered_to(&self, school_type: SchoolType, roles: &Roles) -> Self {
        Self {
            variants: self
                .variants
                .iter()
                .filter(|v| v.school_type == school_type)
                .filter(|v| v.public_type.is_none_or(|public| roles.allows(public)))
                .cloned()
                .collect(),
        }
    }

    /// All variants
    #[must_use]
    pub fn variants(&self) -> &[ProductVariant] {
        &self.variants
    }

    /// Whether the catalog has no variant
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Look up a variant
    #[must_use]
    pub fn variant(&self, variant_id: VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Whether `variant_id` is offered
    #[must_use]
    pub fn contains(&self, variant_id: VariantId) -> bool {
        self.variant(variant_id).is_some()
    }

    /// Variants of one product
    pub fn variants_of(&self, product_id: ProductId) -> impl Iterator<Item = &ProductVariant> {
        self.variants.iter().filter(move |v| v.product_id == product_id)
    }

    /// Selection mode of a product, `None` when it is not offered
    #[must_use]
    pub fn selection_mode(&self, product_id: ProductId) -> Option<SelectionMode> {
        match self.variants_of(product_id).count() {
            0 => None,
            1 => Some(SelectionMode::Checkbox),
            _ => Some(SelectionMode::Radio),
        }
    }

    /// Products with their variants, in order of first appearance
    #[must_use]
    pub fn groups(&self) -> Vec<ProductGroup<'_>> {
        let mut groups: Vec<ProductGroup<'_>> = Vec::new();
        for variant in &self.variants {
            if let Some(group) = groups.iter_mut().find(|g| g.product_id == variant.product_id) {
                group.variants.push(variant);
            } else {
                groups.push(ProductGroup {
                    product_id: variant.product_id,
                    name: &variant.product.name,
                    required: variant.product.required,
                    variants: vec![variant],
                });
            }
        }
        groups
    }

    /// Distinct required products as `(id, name)`, in catalog order
    #[must_use]
    pub fn required_products(&self) -> Vec<(ProductId, &str)> {
        let mut required: Vec<(ProductId, &str)> = Vec::new();
        for variant in self.variants.iter().filter(|v| v.product.required) {
            if !required.iter().any(|(id, _)| *id == variant.product_id) {
                required.push((variant.product_id, &variant.product.name));
            }
        }
        required
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::{
        Money, ProductId, ProductSummary, ProductVariant, PublicType, SchoolType, VariantId,
    };

    /// A variant of `product_id` sold to `Others` schools
    pub fn variant(product_id: ProductId, product_name: &str, required: bool) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(),
            product_id,
            name: format!("{product_name} variant"),
            price: Money::from_cents(1000),
            unique: true,
            enabled: true,
            school_type: SchoolType::Others,
            public_type: None,
            product: ProductSummary {
                name: product_name.to_string(),
                required,
            },
        }
    }

    /// A non-unique variant priced at `cents`
    pub fn counted(product_id: ProductId, product_name: &str, cents: u64) -> ProductVariant {
        ProductVariant {
            unique: false,
            price: Money::from_cents(cents),
            ..variant(product_id, product_name, false)
        }
    }

    /// A variant restricted to `public_type`
    pub fn for_public(product_id: ProductId, product_name: &str, public_type: PublicType) -> ProductVariant {
        ProductVariant {
            public_type: Some(public_type),
            ..variant(product_id, product_name, false)
        }
    }
}
