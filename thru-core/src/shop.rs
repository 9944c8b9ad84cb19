use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed set of shop categories the platform onboards.
///
/// The variant names mirror the vendor-management taxonomy; unknown types are
/// rejected at the catalogue boundary rather than defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShopType {
    /// Neighbourhood grocery store.
    Grocery,
    /// Large-format supermarket.
    Supermarket,
    /// Medical supplies store.
    Medical,
    /// Dispensing pharmacy.
    Pharmacy,
    /// Sit-down restaurant.
    Restaurant,
    /// Cafe.
    Cafe,
    /// Delivery-only kitchen.
    CloudKitchen,
    /// Bakery.
    Bakery,
    /// Fast-food outlet.
    FastFood,
    /// Fine-dining restaurant.
    FineDining,
    /// Mobile food truck.
    FoodTruck,
    /// Coffee shop.
    CoffeeShop,
    /// Bar.
    Bar,
    /// Pub.
    Pub,
}

impl ShopType {
    /// Every shop type, in taxonomy order.
    pub const ALL: [Self; 14] = [
        Self::Grocery,
        Self::Supermarket,
        Self::Medical,
        Self::Pharmacy,
        Self::Restaurant,
        Self::Cafe,
        Self::CloudKitchen,
        Self::Bakery,
        Self::FastFood,
        Self::FineDining,
        Self::FoodTruck,
        Self::CoffeeShop,
        Self::Bar,
        Self::Pub,
    ];

    /// Canonical snake_case name used in persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grocery => "grocery",
            Self::Supermarket => "supermarket",
            Self::Medical => "medical",
            Self::Pharmacy => "pharmacy",
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::CloudKitchen => "cloud_kitchen",
            Self::Bakery => "bakery",
            Self::FastFood => "fast_food",
            Self::FineDining => "fine_dining",
            Self::FoodTruck => "food_truck",
            Self::CoffeeShop => "coffee_shop",
            Self::Bar => "bar",
            Self::Pub => "pub",
        }
    }
}

impl std::fmt::Display for ShopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shop as published by the vendor-management collaborator.
///
/// Records are read-only to this engine; mutation happens upstream.
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`, matching
/// the rest of the geometry code.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use thru_core::{ShopRecord, ShopType};
///
/// let shop = ShopRecord::new(
///     "v1",
///     "Corner Grocer",
///     ShopType::Grocery,
///     Coord { x: 77.6, y: 12.9 },
/// );
/// assert!(shop.active);
/// assert_eq!(shop.shop_type, ShopType::Grocery);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShopRecord {
    /// Opaque vendor identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Declared shop type.
    pub shop_type: ShopType,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// Human-readable address.
    pub address: String,
    /// Whether the vendor currently accepts orders on the platform.
    pub active: bool,
    /// Item categories the vendor declares it can serve.
    pub categories: Vec<String>,
}

impl ShopRecord {
    /// Construct an active record with no declared categories.
    ///
    /// Intended for construction sites that fill in address and categories
    /// afterwards; deserialisation is the usual production path.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        shop_type: ShopType,
        location: Coord<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shop_type,
            location,
            address: String::new(),
            active: true,
            categories: Vec::new(),
        }
    }

    /// Whether the vendor declares it serves `category`.
    #[must_use]
    pub fn serves_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
