//! Beneficiary address forms on top of the geography engine.
//!
//! Bridges stored beneficiary records into the birthplace and residence
//! chains (edit mode), and the chains' final values back into the name-valued
//! fields the backend stores.

pub mod error;
pub mod form;
pub mod geocode;
pub mod record;
pub mod submission;

pub use error::BridgeError;
pub use form::{BeneficiaryGeoForm, BootstrapReport, ChainKind, FormFlow};
pub use geocode::{GeocodeRequest, GeocodeResult, Precision, PrecisionQuality, PrecisionScope};
pub use record::{PersistedLocation, PersistedRef};
pub use submission::{SubmissionFields, resolve_name};
