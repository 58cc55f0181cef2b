use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use padron_core::Identifier;
use padron_geo::{
    ChainConfig, ChainDriver, ChainSeed, ChainTopology, DependencyChain, FetchError, GeoLevel,
    ReferenceDataSource,
};
use padron_infra::{ApiConfig, HttpReferenceSource};

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn paises(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!([{ "id_pais": 1, "nombre": "Argentina" }])))
}

async fn provincias(headers: HeaderMap, Path(pais): Path<i64>) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    match pais {
        1 => Ok(Json(json!([
            { "id_provincia": 2, "nombre": "Chaco" },
            { "id_provincia": 3, "nombre": "Corrientes" }
        ]))),
        _ => Ok(Json(json!([]))),
    }
}

async fn departamentos(Path(provincia): Path<i64>) -> Result<Json<Value>, StatusCode> {
    match provincia {
        2 => Ok(Json(json!([{ "id": 5, "nombre": "San Fernando" }]))),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn localidades(Path(_departamento): Path<i64>) -> Json<Value> {
    Json(json!([{ "id_localidad": 9, "nombre": "Resistencia" }]))
}

async fn municipios(Path(_localidad): Path<i64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([]))
}

async fn calles(Path(_localidad): Path<i64>) -> Json<Value> {
    Json(json!(["25 de Mayo", "Av. Alberdi"]))
}

async fn codpost(Path(_localidad): Path<i64>) -> Json<Value> {
    Json(json!(["H3500"]))
}

async fn start_backend() -> SocketAddr {
    let app = Router::new()
        .route("/auxiliary/paises", get(paises))
        .route("/auxiliary/paises/:id/provincias", get(provincias))
        .route("/auxiliary/provincias/:id/departamentos", get(departamentos))
        .route("/auxiliary/departamentos/:id/localidades", get(localidades))
        .route("/auxiliary/localidades/:id/municipios", get(municipios))
        .route("/auxiliary/localidades/:id/calles", get(calles))
        .route("/auxiliary/localidades/:id/codpost", get(codpost));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn source_for(addr: SocketAddr) -> HttpReferenceSource {
    let config = ApiConfig::new(format!("http://{addr}"))
        .with_token(TOKEN)
        .with_timeout(Duration::from_millis(500));
    HttpReferenceSource::new(&config).unwrap()
}

#[tokio::test]
async fn fetches_root_and_children_with_the_token() {
    let source = source_for(start_backend().await);

    let countries = source.fetch_options(GeoLevel::Country, None).await.unwrap();
    let provinces = source
        .fetch_options(GeoLevel::Province, Some(&Identifier::Numeric(1)))
        .await
        .unwrap();

    assert_eq!(countries[0].name, "Argentina");
    let names: Vec<_> = provinces.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Chaco", "Corrientes"]);
    assert_eq!(provinces[0].parent_id, Some(Identifier::Numeric(1)));
}

#[tokio::test]
async fn missing_token_is_a_status_error() {
    let addr = start_backend().await;
    let source = HttpReferenceSource::new(&ApiConfig::new(format!("http://{addr}"))).unwrap();

    let err = source.fetch_options(GeoLevel::Country, None).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 401, .. }));
}

#[tokio::test]
async fn server_errors_and_timeouts_stay_on_their_level() {
    let source = source_for(start_backend().await);
    let driver = ChainDriver::new(source);
    let mut chain = DependencyChain::new("residence", ChainTopology::residence(), ChainConfig::default());
    let seed = ChainSeed::new()
        .with(GeoLevel::Country, 1)
        .with(GeoLevel::Province, 3)
        .with(GeoLevel::Department, 5)
        .with(GeoLevel::Locality, 9);

    let report = driver.bootstrap(&mut chain, &seed).await;

    let failed: Vec<_> = report.failed.iter().map(|(level, _)| *level).collect();
    assert!(failed.contains(&GeoLevel::Department));
    assert!(failed.contains(&GeoLevel::Municipality));
    assert!(matches!(
        chain.level(GeoLevel::Department).unwrap().error(),
        Some(FetchError::Status { status: 500, .. })
    ));
    assert!(matches!(
        chain.level(GeoLevel::Municipality).unwrap().error(),
        Some(FetchError::Transport(_))
    ));
    assert_eq!(chain.level(GeoLevel::Street).unwrap().options().len(), 2);
    assert_eq!(chain.selected_id(GeoLevel::PostalCode), Some(&Identifier::text("H3500")));
    assert!(chain.is_settled());
}

#[tokio::test]
async fn driver_walks_the_live_catalog() {
    let driver = ChainDriver::new(source_for(start_backend().await));
    let mut chain = DependencyChain::new("birthplace", ChainTopology::birthplace(), ChainConfig::default());

    driver.load(&mut chain).await;
    driver
        .select(&mut chain, GeoLevel::Country, Some(Identifier::Numeric(1)))
        .await
        .unwrap();
    driver
        .select(&mut chain, GeoLevel::Province, Some(Identifier::Numeric(2)))
        .await
        .unwrap();

    let department = chain.level(GeoLevel::Department).unwrap();
    assert_eq!(department.options()[0].name, "San Fernando");
    assert!(chain.level(GeoLevel::Locality).unwrap().options().is_empty());
}
