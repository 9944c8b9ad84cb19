//! Data access seams for shops and orders.
//!
//! The engine treats both collections as document stores keyed by opaque
//! string ids. [`ShopStore`] is read-only — vendor management owns the
//! records — and supports the three query shapes discovery and planning
//! need: by id list, by category containment, and by active flag, plus a
//! bounding-box query used to prefilter the trip corridor. [`OrderStore`]
//! persists [`FinalOrder`](crate::order::FinalOrder) documents with a
//! single idempotent write.

#[cfg(feature = "store-sqlite")]
pub mod sqlite;

use geo::Rect;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::order::FinalOrder;
use crate::shop::ShopRecord;

impl RTreeObject for ShopRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// In-memory R\*-tree over shop locations.
///
/// Built once from a catalogue snapshot; used to narrow a trip corridor to
/// the shops worth measuring precisely.
///
/// # Examples
/// ```
/// use geo::{Coord, Rect};
/// use thru_core::{ShopIndex, ShopRecord, ShopType};
///
/// let index = ShopIndex::build(vec![
///     ShopRecord::new("a", "A", ShopType::Grocery, Coord { x: 0.0, y: 0.0 }),
///     ShopRecord::new("b", "B", ShopType::Grocery, Coord { x: 5.0, y: 5.0 }),
/// ]);
/// let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
/// let found = index.in_bbox(&bbox);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].id, "a");
/// ```
#[derive(Debug)]
pub struct ShopIndex {
    tree: RTree<ShopRecord>,
}

impl ShopIndex {
    /// Bulk-load an index from catalogue records.
    #[must_use]
    pub fn build(shops: Vec<ShopRecord>) -> Self {
        Self {
            tree: RTree::bulk_load(shops),
        }
    }

    /// Shops whose location falls inside `bbox`, boundary included,
    /// ordered by id for deterministic consumption.
    #[must_use]
    pub fn in_bbox(&self, bbox: &Rect<f64>) -> Vec<ShopRecord> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut shops: Vec<ShopRecord> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .cloned()
            .collect();
        shops.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        shops
    }

    /// Number of indexed shops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no shops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Read-only access to the shop catalogue.
///
/// Implementations must return deterministic orderings (by id) so planning
/// runs are reproducible.
pub trait ShopStore: Send + Sync {
    /// Shops whose id appears in `ids`, in catalogue id order.
    fn shops_by_ids(&self, ids: &[String]) -> Vec<ShopRecord>;

    /// Every shop currently accepting orders.
    fn active_shops(&self) -> Vec<ShopRecord>;

    /// Active shops declaring `category` among their categories.
    fn active_shops_in_category(&self, category: &str) -> Vec<ShopRecord>;

    /// Shops located inside `bbox`, boundary included.
    fn shops_in_bbox(&self, bbox: &Rect<f64>) -> Vec<ShopRecord>;
}

/// Errors from [`OrderStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStoreError {
    /// An order with this id already exists; nothing was written.
    #[error("order {order_id} already exists")]
    Duplicate {
        /// The colliding id.
        order_id: String,
    },
    /// The backing store failed.
    #[error("order store backend error: {message}")]
    Backend {
        /// Backend-specific description.
        message: String,
    },
}

/// Persistence for placed orders.
///
/// `insert_order` must be a single idempotent write: either the whole
/// document lands under a fresh id, or nothing is stored and the error
/// says why. Re-sending an already-stored id yields
/// [`OrderStoreError::Duplicate`], which is how retries stay safe.
pub trait OrderStore: Send + Sync {
    /// Persist a new order document.
    ///
    /// # Errors
    ///
    /// [`OrderStoreError::Duplicate`] when the id is already taken;
    /// [`OrderStoreError::Backend`] when the store fails.
    fn insert_order(&self, order: &FinalOrder) -> Result<(), OrderStoreError>;

    /// Fetch an order by id, if present.
    ///
    /// # Errors
    ///
    /// [`OrderStoreError::Backend`] when the store fails.
    fn fetch_order(&self, order_id: &str) -> Result<Option<FinalOrder>, OrderStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::ShopType;
    use geo::Coord;
    use rstest::rstest;

    fn shop(id: &str, x: f64, y: f64) -> ShopRecord {
        ShopRecord::new(id, id, ShopType::Grocery, Coord { x, y })
    }

    #[rstest]
    fn index_returns_only_contained_shops() {
        let index = ShopIndex::build(vec![shop("a", 0.0, 0.0), shop("b", 3.0, 3.0)]);
        let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
        let found = index.in_bbox(&bbox);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[rstest]
    fn index_includes_boundary_points() {
        let index = ShopIndex::build(vec![shop("edge", 1.0, 0.0)]);
        let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
        assert_eq!(index.in_bbox(&bbox).len(), 1);
    }

    #[rstest]
    fn index_orders_results_by_id() {
        let index = ShopIndex::build(vec![
            shop("zed", 0.1, 0.1),
            shop("ant", 0.2, 0.2),
            shop("mid", 0.3, 0.3),
        ]);
        let bbox = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let found = index.in_bbox(&bbox);
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ant", "mid", "zed"]);
    }

    #[rstest]
    fn empty_index_reports_empty() {
        let index = ShopIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
