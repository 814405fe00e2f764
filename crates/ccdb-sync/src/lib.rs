pub mod child_care;
pub mod county;
pub mod error;
pub mod geocode;
pub mod memory;

pub use child_care::{ChildCareSynchronizer, RefreshOutcome};
pub use county::{CountySynchronizer, ListingReport};
pub use error::SyncError;
pub use geocode::{GeocodeFailure, GeocodeReport, GeocodeSynchronizer};
pub use memory::MemoryStore;
