// Service exports
pub mod geocoding;
pub mod intake;

pub use geocoding::{AddressResolver, DisabledResolver, GeocodingError, NominatimResolver, ResolvedLocation};
pub use intake::{prepare_donors, prepare_requests, Prepared};
