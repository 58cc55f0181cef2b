//! Reference catalogs served by the portal backend under `/auxiliary`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use padron_core::Identifier;
use padron_geo::{FetchError, GeoEntity, GeoLevel, ReferenceDataSource};

use crate::config::{ApiConfig, ConfigError};

/// Path segments of a level's catalog, parent id slotted in where needed.
fn catalog_path(level: GeoLevel, parent: Option<&Identifier>) -> Result<Vec<String>, FetchError> {
    let under = |collection: &str, child: &str| -> Result<Vec<String>, FetchError> {
        let parent = parent.ok_or(FetchError::Unavailable(level))?;
        Ok(vec![
            "auxiliary".into(),
            collection.into(),
            parent.to_string(),
            child.into(),
        ])
    };

    match level {
        GeoLevel::Country => Ok(vec!["auxiliary".into(), "paises".into()]),
        GeoLevel::Province => under("paises", "provincias"),
        GeoLevel::Department => under("provincias", "departamentos"),
        GeoLevel::Locality => under("departamentos", "localidades"),
        GeoLevel::Municipality => under("localidades", "municipios"),
        GeoLevel::Neighborhood => under("municipios", "barrios"),
        GeoLevel::Street => under("localidades", "calles"),
        GeoLevel::PostalCode => under("localidades", "codpost"),
    }
}

/// Level-specific id key used by the catalog rows.
fn id_key(level: GeoLevel) -> &'static str {
    match level {
        GeoLevel::Country => "id_pais",
        GeoLevel::Province => "id_provincia",
        GeoLevel::Department => "id_departamento",
        GeoLevel::Locality => "id_localidad",
        GeoLevel::Municipality => "id_municipio",
        GeoLevel::Neighborhood => "id_barrio",
        GeoLevel::Street => "id_calle",
        GeoLevel::PostalCode => "id_codigopostal",
    }
}

const NAME_KEYS: [&str; 4] = ["nombre", "name", "codigopostal", "codigo"];

/// Decode a catalog response body into options, keeping server order.
///
/// Accepts a bare array or `{ "data": [...] }`. Rows are objects with an id
/// and a name, or bare strings (street and postal code catalogs).
pub fn decode_rows(
    level: GeoLevel,
    parent: Option<&Identifier>,
    body: Value,
) -> Result<Vec<GeoEntity>, FetchError> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(mut wrapper) => match wrapper.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(FetchError::Decode(format!("{level}: expected a list of options"))),
        },
        other => {
            return Err(FetchError::Decode(format!(
                "{level}: expected a list of options, got {other}"
            )));
        }
    };

    rows.into_iter()
        .map(|row| {
            let entity = decode_row(level, &row)?;
            Ok(match parent {
                Some(p) => entity.with_parent(p.clone()),
                None => entity,
            })
        })
        .collect()
}

fn decode_row(level: GeoLevel, row: &Value) -> Result<GeoEntity, FetchError> {
    let malformed = || FetchError::Decode(format!("{level}: unrecognized option {row}"));

    match row {
        Value::String(text) if !text.trim().is_empty() => Ok(GeoEntity::from_text(text.trim())),
        Value::Object(fields) => {
            let name = NAME_KEYS
                .iter()
                .find_map(|k| fields.get(*k))
                .and_then(scalar_text)
                .filter(|n| !n.is_empty());
            let id = fields
                .get(id_key(level))
                .or_else(|| fields.get("id"))
                .and_then(scalar_text)
                .filter(|id| !id.is_empty());

            match (id, name) {
                (Some(id), Some(name)) => Ok(GeoEntity::new(Identifier::from_raw(&id), name)),
                (None, Some(name)) => Ok(GeoEntity::from_text(name)),
                (Some(id), None) => Ok(GeoEntity::from_text(id)),
                (None, None) => Err(malformed()),
            }
        }
        _ => Err(malformed()),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// [`ReferenceDataSource`] over the backend's catalog endpoints.
#[derive(Debug, Clone)]
pub struct HttpReferenceSource {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpReferenceSource {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|_| ConfigError::InvalidUrl {
            var: crate::config::API_URL_VAR,
            value: config.base_url.clone(),
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token.clone(),
        })
    }

    fn url(&self, segments: &[String]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ReferenceDataSource for HttpReferenceSource {
    async fn fetch_options(
        &self,
        level: GeoLevel,
        parent: Option<&Identifier>,
    ) -> Result<Vec<GeoEntity>, FetchError> {
        let url = self.url(&catalog_path(level, parent)?)?;
        debug!(%level, %url, "fetching options");

        let mut req = self.client.get(url);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(%level, status = status.as_u16(), "catalog request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        decode_rows(level, parent, body)
    }
}
