//! Fiducial marker records and the live overlay table.

pub mod localizer;

pub use localizer::{localize, MarkerSize};

use crate::core::MapPoint;
use std::collections::BTreeMap;

/// A localized marker as a closed quadrilateral in map-raster space.
///
/// The polygon's last point repeats the first.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerRecord {
    /// Detector-assigned marker id
    pub id: i32,
    /// Closed outline: bottom-left, bottom-right, top-right, top-left,
    /// bottom-left again
    pub polygon: [MapPoint; 5],
}

/// Live marker overlay: id -> most recent localized record.
///
/// Last write wins; entries are removed explicitly when the upstream
/// detector no longer reports the marker.
#[derive(Clone, Debug, Default)]
pub struct MarkerTable {
    // BTreeMap keeps iteration order stable so repeated renders of the
    // same table are byte-identical.
    records: BTreeMap<i32, MarkerRecord>,
}

impl MarkerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its id
    pub fn insert(&mut self, record: MarkerRecord) {
        self.records.insert(record.id, record);
    }

    /// Remove a marker; returns true if it was present
    pub fn remove(&mut self, id: i32) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Look up a marker by id
    pub fn get(&self, id: i32) -> Option<&MarkerRecord> {
        self.records.get(&id)
    }

    /// Iterate live records in id order
    pub fn iter(&self) -> impl Iterator<Item = &MarkerRecord> {
        self.records.values()
    }

    /// Number of live markers
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no markers are live
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
