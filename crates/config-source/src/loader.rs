//! Concurrent loading

use action_flow::merge;
use dompatch_core_types::{Configuration, MergedConfiguration};
use futures::future::join_all;
use tracing::info;

use crate::source::ConfigurationSource;

/// Load every identifier at once and wait for all of them.
///
/// Results keep the order of `identifiers`; failed loads are `None`.
pub async fn load_all<S>(source: &S, identifiers: &[String]) -> Vec<Option<Configuration>>
where
    S: ConfigurationSource + ?Sized,
{
    join_all(
        identifiers
            .iter()
            .map(|identifier| source.load_configuration(identifier)),
    )
    .await
}

/// Load every identifier concurrently and merge what loaded.
pub async fn load_and_merge<S>(source: &S, identifiers: &[String]) -> MergedConfiguration
where
    S: ConfigurationSource + ?Sized,
{
    let loaded = load_all(source, identifiers).await;
    let failed = loaded.iter().filter(|config| config.is_none()).count();
    let merged = merge(loaded);
    info!(
        requested = identifiers.len(),
        failed,
        actions = merged.len(),
        "Loaded configurations"
    );
    merged
}

/// Resolve the identifiers for `location`, then load and merge them.
pub async fn resolve_and_merge<S>(source: &S, location: &str) -> MergedConfiguration
where
    S: ConfigurationSource + ?Sized,
{
    let identifiers = source.resolve_configuration_identifiers(location).await;
    load_and_merge(source, &identifiers).await
}
