mod cache;
pub mod client;
pub mod error;
pub mod nominatim;
pub mod resolver;

pub use client::{GeocodeSource, ZippopotamClient};
pub use error::GeocodeError;
pub use nominatim::{AddressMatch, NominatimClient, NOMINATIM_BASE_URL};
pub use resolver::{Resolution, ZipResolver};
