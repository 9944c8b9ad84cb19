//! Catalogue filtering and ordering-capability derivation.
//!
//! The engine never owns the shop catalogue; it receives records from the
//! vendor-management collaborator and narrows them to the types a trip is
//! interested in. Capability derivation decides which of the two downstream
//! ordering flows a shop participates in: open-ended item-list ordering with
//! vendor-priced quotes, or fixed-menu ordering.

use crate::shop::{ShopRecord, ShopType};

/// What a shop type can do in the ordering flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingCapabilities {
    /// The type the capabilities were derived from.
    pub shop_type: ShopType,
    /// Whether the shop accepts an open-ended item list for quoting.
    pub supports_list_ordering: bool,
    /// Item categories a shop of this type stocks by default.
    pub default_categories: &'static [&'static str],
}

/// Keep only active shops whose type is in `allowed`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use thru_core::{ShopRecord, ShopType, filter_shops};
///
/// let grocer = ShopRecord::new("v1", "Grocer", ShopType::Grocery, Coord { x: 0.0, y: 0.0 });
/// let mut bar = ShopRecord::new("v2", "Bar", ShopType::Bar, Coord { x: 0.0, y: 0.0 });
/// bar.active = false;
///
/// let kept = filter_shops([grocer.clone(), bar], &[ShopType::Grocery, ShopType::Bar]);
/// assert_eq!(kept, vec![grocer]);
/// ```
pub fn filter_shops<I>(shops: I, allowed: &[ShopType]) -> Vec<ShopRecord>
where
    I: IntoIterator<Item = ShopRecord>,
{
    shops
        .into_iter()
        .filter(|shop| shop.active && allowed.contains(&shop.shop_type))
        .collect()
}

/// Derive the ordering capabilities of a shop type.
///
/// Grocery, supermarket, medical and pharmacy shops accept open-ended item
/// lists and reply with vendor-priced quotes; every other type only takes
/// orders against its fixed menu.
#[must_use]
pub const fn capabilities_of(shop_type: ShopType) -> OrderingCapabilities {
    OrderingCapabilities {
        shop_type,
        supports_list_ordering: matches!(
            shop_type,
            ShopType::Grocery | ShopType::Supermarket | ShopType::Medical | ShopType::Pharmacy
        ),
        default_categories: default_categories(shop_type),
    }
}

const fn default_categories(shop_type: ShopType) -> &'static [&'static str] {
    match shop_type {
        ShopType::Grocery => &["grocery", "food", "household"],
        ShopType::Supermarket => &["grocery", "food", "household", "electronics"],
        ShopType::Medical | ShopType::Pharmacy => &["medical", "pharmacy", "health"],
        ShopType::Restaurant | ShopType::CloudKitchen => &["food", "restaurant"],
        ShopType::Cafe | ShopType::CoffeeShop => &["food", "cafe", "beverages"],
        ShopType::Bakery => &["food", "bakery", "desserts"],
        ShopType::FastFood | ShopType::FoodTruck => &["food", "fast_food"],
        ShopType::FineDining => &["food", "restaurant", "fine_dining"],
        ShopType::Bar | ShopType::Pub => &["food", "beverages", "bar"],
    }
}
