//! Load a geography chain against the live backend and print what each level
//! shows.
//!
//! ```text
//! padron-geo-probe residence country=1 province=2 department=5 locality=9
//! ```

use anyhow::{Context, Result, bail};
use tracing::info;

use padron_core::Identifier;
use padron_geo::{ChainConfig, ChainDriver, ChainSeed, ChainTopology, DependencyChain, GeoLevel};
use padron_infra::{ApiConfig, HttpReferenceSource};
use padron_observability::LogFormat;

fn parse_args(args: &[String]) -> Result<(ChainTopology, String, ChainSeed)> {
    let Some((kind, pairs)) = args.split_first() else {
        bail!("usage: padron-geo-probe <birthplace|residence> [level=id ...]");
    };
    let topology = match kind.as_str() {
        "birthplace" => ChainTopology::birthplace(),
        "residence" => ChainTopology::residence(),
        other => bail!("unknown chain {other:?}; expected birthplace or residence"),
    };

    let mut seed = ChainSeed::new();
    for pair in pairs {
        let (level, value) = pair
            .split_once('=')
            .with_context(|| format!("expected level=id, got {pair:?}"))?;
        let level: GeoLevel = level
            .parse()
            .with_context(|| format!("in argument {pair:?}"))?;
        if !topology.contains(level) {
            bail!("level {level} is not part of the {kind} chain");
        }
        seed.set(level, Some(Identifier::from_raw(value)));
    }

    Ok((topology, kind.clone(), seed))
}

#[tokio::main]
async fn main() -> Result<()> {
    let format = std::env::var("PADRON_LOG_FORMAT")
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default();
    padron_observability::init_with("info", format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (topology, label, seed) = parse_args(&args)?;

    let config = ApiConfig::from_env().context("reading backend configuration")?;
    info!(base_url = %config.base_url, chain = %label, "probing reference catalogs");
    let source = HttpReferenceSource::new(&config)?;
    let driver = ChainDriver::new(source);

    let mut chain = DependencyChain::new(label, topology, ChainConfig::default());
    let report = driver.bootstrap(&mut chain, &seed).await;
    for notice in &report.notices {
        info!(?notice, "chain notice");
    }

    let out = serde_json::to_string_pretty(&chain.views())?;
    println!("{out}");

    if !report.is_clean() {
        bail!("{} level(s) failed to load", report.failed.len());
    }
    Ok(())
}
