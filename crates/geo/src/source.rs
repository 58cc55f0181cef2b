//! Contract between the chain and whoever can list the options of a level.

use std::sync::Arc;

use padron_core::Identifier;

use crate::entity::GeoEntity;
use crate::error::FetchError;
use crate::level::GeoLevel;

/// Lists the options of one level under a parent.
///
/// Pure fetch: implementations hold no chain state. Options are returned in
/// source order and never re-sorted by the engine. Every call must resolve
/// (success or error); a source must not hang silently.
#[async_trait::async_trait]
pub trait ReferenceDataSource: Send + Sync {
    /// `parent` is `None` only for the root level of a chain.
    async fn fetch_options(
        &self,
        level: GeoLevel,
        parent: Option<&Identifier>,
    ) -> Result<Vec<GeoEntity>, FetchError>;
}

#[async_trait::async_trait]
impl<S> ReferenceDataSource for Arc<S>
where
    S: ReferenceDataSource + ?Sized,
{
    async fn fetch_options(
        &self,
        level: GeoLevel,
        parent: Option<&Identifier>,
    ) -> Result<Vec<GeoEntity>, FetchError> {
        (**self).fetch_options(level, parent).await
    }
}

/// A fetch the chain wants performed.
///
/// `generation` identifies the request: the chain accepts a result only if
/// the level's generation is still the one stamped here, so a superseded or
/// cleared request can never commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub level: GeoLevel,
    pub parent: Option<Identifier>,
    pub generation: u64,
    pub(crate) root: bool,
}

impl FetchRequest {
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// A non-root request without a parent key can only yield nothing.
    pub fn is_gated(&self) -> bool {
        !self.root && self.parent.is_none()
    }
}

/// Perform `request` against `source`, honoring the enabled gate.
///
/// A gated request short-circuits to an empty list without calling the source.
pub async fn fetch_gated<S>(source: &S, request: &FetchRequest) -> Result<Vec<GeoEntity>, FetchError>
where
    S: ReferenceDataSource + ?Sized,
{
    if request.is_gated() {
        return Ok(Vec::new());
    }
    source
        .fetch_options(request.level, request.parent.as_ref())
        .await
}
