//! Fixed sample dataset loaded by `POST /init-stores` and `storeloc-cli init`.

use crate::stores::Store;

#[rustfmt::skip]
const SAMPLE_STORES: &[(&str, &str, f64, f64, &str)] = &[
    // Beverly Hills (90210)
    ("Walmart Supercenter", "5500 Canoga Ave, Woodland Hills, CA 91367", 34.1783, -118.6014, "Walmart"),
    ("Ralphs", "9610 Santa Monica Blvd, Beverly Hills, CA 90210", 34.0695, -118.4019, "Ralphs"),
    ("Walmart Neighborhood Market", "1827 S Sepulveda Blvd, Los Angeles, CA 90025", 34.0458, -118.4529, "Walmart"),
    ("Ralphs", "10861 Weyburn Ave, Los Angeles, CA 90024", 34.0611, -118.4456, "Ralphs"),
    // New York (10001)
    ("Walmart", "517 E 117th St, New York, NY 10035", 40.7980, -73.9379, "Walmart"),
    ("Walmart", "2307 Bartow Ave, Bronx, NY 10475", 40.8666, -73.8288, "Walmart"),
    // Chicago (60601)
    ("Walmart Supercenter", "7535 S Ashland Ave, Chicago, IL 60620", 41.7569, -87.6648, "Walmart"),
    ("Walmart", "2844 N Broadway, Chicago, IL 60657", 41.9344, -87.6457, "Walmart"),
    // San Francisco (94102)
    ("Walmart", "1150 El Camino Real, San Bruno, CA 94066", 37.6358, -122.4213, "Walmart"),
    ("Ralphs", "7905 Van Nuys Blvd, Los Angeles, CA 91402", 34.2186, -118.4490, "Ralphs"),
    // Dallas (75201)
    ("Walmart Supercenter", "2401 W Wheatland Rd, Dallas, TX 75237", 32.6413, -96.8729, "Walmart"),
    ("Walmart Supercenter", "8801 S Hampton Rd, Dallas, TX 75232", 32.6752, -96.8643, "Walmart"),
    // Miami (33101)
    ("Walmart Supercenter", "7450 NW 87th Ave, Miami, FL 33178", 25.8446, -80.3369, "Walmart"),
    ("Walmart", "10675 Caribbean Blvd, Cutler Bay, FL 33189", 25.5811, -80.3442, "Walmart"),
    // Seattle (98101)
    ("Walmart", "18305 Alderwood Mall Pkwy, Lynnwood, WA 98037", 47.8304, -122.2713, "Walmart"),
    ("Walmart Supercenter", "17432 Hwy 99, Lynnwood, WA 98037", 47.8190, -122.2889, "Walmart"),
    // Atlanta (30303)
    ("Walmart Supercenter", "835 Martin Luther King Jr Dr SW, Atlanta, GA 30310", 33.7465, -84.4122, "Walmart"),
    ("Walmart", "3580 Marketplace Blvd, East Point, GA 30344", 33.6768, -84.4505, "Walmart"),
];

#[must_use]
pub fn sample_stores() -> Vec<Store> {
    SAMPLE_STORES
        .iter()
        .map(|&(store_name, address, lat, lon, retailer)| Store {
            store_name: store_name.to_string(),
            address: address.to_string(),
            lat,
            lon,
            retailer: retailer.to_string(),
        })
        .collect()
}
