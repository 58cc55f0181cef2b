//! The geography part of a beneficiary form: two independent chains.

use serde::Serialize;
use tracing::info;

use padron_core::{FormSessionId, Identifier};
use padron_events::EventBus;
use padron_geo::{
    ChainConfig, ChainDriver, ChainNotice, ChainTopology, DependencyChain, DriveReport, GeoLevel,
    ReferenceDataSource,
};

use crate::error::BridgeError;
use crate::geocode::{GeocodeRequest, GeocodeResult, Precision};
use crate::record::PersistedLocation;
use crate::submission::SubmissionFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFlow {
    Create,
    Edit,
}

/// Which address context a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    Birthplace,
    Residence,
}

impl ChainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Birthplace => "birthplace",
            ChainKind::Residence => "residence",
        }
    }

    pub fn topology(&self) -> ChainTopology {
        match self {
            ChainKind::Birthplace => ChainTopology::birthplace(),
            ChainKind::Residence => ChainTopology::residence(),
        }
    }
}

/// Reports of one bootstrap, per chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    pub birthplace: DriveReport,
    pub residence: DriveReport,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.birthplace.is_clean() && self.residence.is_clean()
    }
}

/// Birthplace and residence chains of one mounted form.
///
/// The chains never read each other's state. The form lives as long as the
/// screen that shows it.
#[derive(Debug, Clone)]
pub struct BeneficiaryGeoForm {
    session: FormSessionId,
    flow: FormFlow,
    birthplace: DependencyChain,
    residence: DependencyChain,
    /// The record being edited; the default record when creating.
    stored: PersistedLocation,
    numero_calle: Option<String>,
    coordinates: Option<(f64, f64)>,
    precision: Option<Precision>,
}

impl BeneficiaryGeoForm {
    /// A blank form for a new beneficiary.
    pub fn create(config: ChainConfig) -> Self {
        Self::build(FormFlow::Create, config, PersistedLocation::default())
    }

    /// A form pre-filled from a stored beneficiary.
    pub fn edit(config: ChainConfig, record: &PersistedLocation) -> Self {
        Self::build(FormFlow::Edit, config, record.clone())
    }

    fn build(flow: FormFlow, config: ChainConfig, stored: PersistedLocation) -> Self {
        let chain = |kind: ChainKind| DependencyChain::new(kind.as_str(), kind.topology(), config.clone());
        let coordinates = stored.coordinates();
        // A stored precision without coordinates describes nothing.
        let precision = stored
            .precision
            .and_then(Precision::new)
            .filter(|_| coordinates.is_some());

        Self {
            session: FormSessionId::new(),
            flow,
            birthplace: chain(ChainKind::Birthplace),
            residence: chain(ChainKind::Residence),
            numero_calle: stored.numero_calle.clone(),
            coordinates,
            precision,
            stored,
        }
    }

    pub fn session(&self) -> FormSessionId {
        self.session
    }

    pub fn flow(&self) -> FormFlow {
        self.flow
    }

    pub fn chain(&self, kind: ChainKind) -> &DependencyChain {
        match kind {
            ChainKind::Birthplace => &self.birthplace,
            ChainKind::Residence => &self.residence,
        }
    }

    pub fn chain_mut(&mut self, kind: ChainKind) -> &mut DependencyChain {
        match kind {
            ChainKind::Birthplace => &mut self.birthplace,
            ChainKind::Residence => &mut self.residence,
        }
    }

    pub fn set_numero_calle(&mut self, numero: impl Into<String>) {
        self.numero_calle = Some(numero.into());
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.coordinates
    }

    pub fn precision(&self) -> Option<Precision> {
        self.precision
    }

    /// Set or clear the point by hand. A hand-placed point has no geocoder
    /// precision.
    pub fn set_coordinates(&mut self, coordinates: Option<(f64, f64)>) {
        self.coordinates = coordinates;
        self.precision = None;
    }

    /// Store the geocoder's answer. Once stored, the address is not geocoded
    /// again.
    pub fn apply_geocode(&mut self, result: GeocodeResult) -> Result<Precision, BridgeError> {
        let precision =
            Precision::new(result.precision).ok_or(BridgeError::InvalidPrecision(result.precision))?;
        let (lat, lon) = (result.latitud, result.longitud);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(BridgeError::InvalidCoordinates { lat, lon });
        }

        self.coordinates = Some((lat, lon));
        self.precision = Some(precision);
        info!(
            session = %self.session,
            precision = precision.value(),
            quality = ?precision.quality(),
            "address geocoded"
        );
        Ok(precision)
    }

    /// Load both chains: roots only when creating, every stored level when
    /// editing. The two chains load concurrently.
    pub async fn bootstrap<S, B>(&mut self, driver: &ChainDriver<S, B>) -> BootstrapReport
    where
        S: ReferenceDataSource,
        B: EventBus<ChainNotice>,
    {
        let birthplace_seed = self.stored.birthplace_seed();
        let residence_seed = self.stored.residence_seed();
        let (birthplace, residence) = futures::join!(
            driver.bootstrap(&mut self.birthplace, &birthplace_seed),
            driver.bootstrap(&mut self.residence, &residence_seed),
        );

        info!(
            session = %self.session,
            flow = ?self.flow,
            birthplace_applied = birthplace.applied.len(),
            residence_applied = residence.applied.len(),
            failed = birthplace.failed.len() + residence.failed.len(),
            "geography form bootstrapped"
        );
        BootstrapReport {
            birthplace,
            residence,
        }
    }

    /// Select in one chain and fetch what the selection unlocks.
    pub async fn select<S, B>(
        &mut self,
        driver: &ChainDriver<S, B>,
        kind: ChainKind,
        level: GeoLevel,
        id: Option<Identifier>,
    ) -> Result<DriveReport, BridgeError>
    where
        S: ReferenceDataSource,
        B: EventBus<ChainNotice>,
    {
        Ok(driver.select(self.chain_mut(kind), level, id).await?)
    }

    pub fn submission(&self) -> SubmissionFields {
        SubmissionFields::resolve(&self.birthplace, &self.residence, &self.stored)
    }

    pub fn geocode_request(&self) -> Option<GeocodeRequest> {
        GeocodeRequest::from_residence(&self.residence, self.numero_calle.as_deref(), self.coordinates)
    }
}
