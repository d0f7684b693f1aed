//! Radius search over an in-memory slice of stores.
//!
//! [`locate`] is the filter/sort/dedupe half of a store search. Callers are
//! responsible for resolving the centre and loading the candidate stores.

use std::collections::HashSet;

use crate::geo::{bounding_box, great_circle_distance_miles, BoundingBox};
use crate::stores::{Store, StoreWithDistance};

pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

/// Centre and radius of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub lat: f64,
    pub lon: f64,
    pub radius_miles: f64,
}

impl SearchArea {
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        bounding_box(self.lat, self.lon, self.radius_miles)
    }
}

/// Parse the `radius` query parameter. Absent or blank means
/// [`DEFAULT_RADIUS_MILES`].
///
/// # Errors
///
/// Returns a human-readable message when the value is present but is not a
/// finite, non-negative number.
pub fn parse_radius(raw: Option<&str>) -> Result<f64, String> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(DEFAULT_RADIUS_MILES);
    };
    match raw.trim().parse::<f64>() {
        Ok(radius) if radius.is_finite() && radius >= 0.0 => Ok(radius),
        _ => Err(format!(
            "radius must be a non-negative number of miles, got '{raw}'"
        )),
    }
}

/// Stores within `area`, nearest first, one per normalized address.
///
/// Pipeline: bounding-box pre-filter, optional case-insensitive retailer
/// match, exact distance with an inclusive radius cutoff, stable sort by
/// distance, then dedupe keeping the first (nearest) copy of each address.
/// An empty `retailer` string means no retailer filter.
pub fn locate<I>(stores: I, area: &SearchArea, retailer: Option<&str>) -> Vec<StoreWithDistance>
where
    I: IntoIterator<Item = Store>,
{
    let bbox = area.bounding_box();
    let retailer = retailer
        .filter(|r| !r.is_empty())
        .map(str::to_lowercase);

    let mut within: Vec<StoreWithDistance> = stores
        .into_iter()
        .filter(|store| bbox.contains(store.lat, store.lon))
        .filter(|store| {
            retailer
                .as_deref()
                .is_none_or(|wanted| store.retailer.to_lowercase() == wanted)
        })
        .map(|store| {
            let distance_miles =
                great_circle_distance_miles(area.lat, area.lon, store.lat, store.lon);
            StoreWithDistance {
                store,
                distance_miles,
            }
        })
        .filter(|hit| hit.distance_miles <= area.radius_miles)
        .collect();

    within.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));

    let mut seen = HashSet::new();
    within.retain(|hit| seen.insert(hit.store.normalized_address()));
    within
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::seed::sample_stores;

    const BEVERLY_HILLS: SearchArea = SearchArea {
        lat: 34.0901,
        lon: -118.4065,
        radius_miles: 10.0,
    };

    fn store(name: &str, address: &str, lat: f64, lon: f64, retailer: &str) -> Store {
        Store {
            store_name: name.to_string(),
            address: address.to_string(),
            lat,
            lon,
            retailer: retailer.to_string(),
        }
    }

    #[test]
    fn parse_radius_defaults_to_fifty_miles() {
        assert_eq!(parse_radius(None), Ok(50.0));
    }

    #[test]
    fn parse_radius_treats_blank_as_absent() {
        assert_eq!(parse_radius(Some("")), Ok(50.0));
        assert_eq!(parse_radius(Some("  ")), Ok(50.0));
    }

    #[test]
    fn parse_radius_accepts_decimal_values() {
        assert_eq!(parse_radius(Some("12.5")), Ok(12.5));
        assert_eq!(parse_radius(Some(" 0 ")), Ok(0.0));
    }

    #[test]
    fn parse_radius_rejects_garbage_and_negative_values() {
        assert!(parse_radius(Some("ten")).is_err());
        assert!(parse_radius(Some("-5")).is_err());
        assert!(parse_radius(Some("NaN")).is_err());
        assert!(parse_radius(Some("inf")).is_err());
    }

    #[test]
    fn sample_dataset_search_returns_nearby_stores_sorted() {
        let hits = locate(sample_stores(), &BEVERLY_HILLS, None);

        let distances: Vec<f64> = hits.iter().map(|h| h.distance_miles).collect();
        assert_eq!(distances, vec![1.45, 3.0, 4.05, 9.21]);
        assert_eq!(hits[2].store.address, "1827 S Sepulveda Blvd, Los Angeles, CA 90025");
        assert!(hits.iter().all(|h| h.distance_miles <= BEVERLY_HILLS.radius_miles));
    }

    #[test]
    fn retailer_filter_is_case_insensitive() {
        let hits = locate(sample_stores(), &BEVERLY_HILLS, Some("rALPHS"));

        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.store.retailer == "Ralphs"));
        assert!(hits
            .windows(2)
            .all(|w| w[0].distance_miles <= w[1].distance_miles));
    }

    #[test]
    fn empty_retailer_means_no_filter() {
        let all = locate(sample_stores(), &BEVERLY_HILLS, None);
        let empty = locate(sample_stores(), &BEVERLY_HILLS, Some(""));
        assert_eq!(all, empty);
    }

    #[test]
    fn unknown_retailer_yields_empty_result() {
        assert!(locate(sample_stores(), &BEVERLY_HILLS, Some("Target")).is_empty());
    }

    #[test]
    fn radius_cutoff_is_inclusive() {
        let stores = vec![store("A", "1 A St", 34.0458, -118.4529, "Walmart")];
        let exact = SearchArea {
            radius_miles: 4.05,
            ..BEVERLY_HILLS
        };
        assert_eq!(locate(stores.clone(), &exact, None).len(), 1);

        let tighter = SearchArea {
            radius_miles: 4.04,
            ..BEVERLY_HILLS
        };
        assert!(locate(stores, &tighter, None).is_empty());
    }

    #[test]
    fn duplicate_addresses_keep_first_sorted_copy() {
        let stores = vec![
            store("Far", "5 Main St", 34.2186, -118.4490, "Ralphs"),
            store("Copy 1", "  1 Main St ", 34.0695, -118.4019, "Ralphs"),
            store("Copy 2", "1 MAIN ST", 34.0695, -118.4019, "Ralphs"),
        ];
        let hits = locate(stores, &BEVERLY_HILLS, None);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].store.store_name, "Copy 1");
        assert_eq!(hits[1].store.store_name, "Far");
    }

    #[test]
    fn equal_distances_preserve_input_order() {
        let stores = vec![
            store("First", "1 Main St", 34.0695, -118.4019, "Ralphs"),
            store("Second", "2 Main St", 34.0695, -118.4019, "Walmart"),
        ];
        let hits = locate(stores, &BEVERLY_HILLS, None);
        let names: Vec<&str> = hits.iter().map(|h| h.store.store_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn stores_outside_the_box_are_never_considered() {
        let stores = vec![store("NYC", "517 E 117th St", 40.7980, -73.9379, "Walmart")];
        let huge_radius_elsewhere = SearchArea {
            radius_miles: 100.0,
            ..BEVERLY_HILLS
        };
        assert!(locate(stores, &huge_radius_elsewhere, None).is_empty());
    }

    fn arb_store() -> impl Strategy<Value = Store> {
        (
            0usize..12,
            33.5f64..34.7,
            -119.0f64..-117.8,
            prop::sample::select(vec!["Ralphs", "Walmart", "Vons"]),
        )
            .prop_map(|(n, lat, lon, retailer)| {
                // Few distinct addresses so duplicates are common.
                store(&format!("Store {n}"), &format!("{n} Main St"), lat, lon, retailer)
            })
    }

    proptest! {
        #[test]
        fn locate_results_are_within_radius_sorted_and_unique(
            stores in prop::collection::vec(arb_store(), 0..40),
            radius_miles in 0.0f64..60.0,
        ) {
            let area = SearchArea { radius_miles, ..BEVERLY_HILLS };
            let hits = locate(stores.clone(), &area, None);

            prop_assert!(hits.len() <= stores.len());
            prop_assert!(hits.iter().all(|h| h.distance_miles <= radius_miles));
            prop_assert!(hits.windows(2).all(|w| w[0].distance_miles <= w[1].distance_miles));

            let mut seen = HashSet::new();
            prop_assert!(hits.iter().all(|h| seen.insert(h.store.normalized_address())));
        }

        #[test]
        fn locate_with_retailer_is_a_subset_of_unfiltered(
            stores in prop::collection::vec(arb_store(), 0..40),
            radius_miles in 0.0f64..60.0,
        ) {
            let area = SearchArea { radius_miles, ..BEVERLY_HILLS };
            let hits = locate(stores, &area, Some("ralphs"));
            prop_assert!(hits.iter().all(|h| h.store.retailer == "Ralphs"));
            prop_assert!(hits.iter().all(|h| h.distance_miles <= radius_miles));
        }
    }
}
