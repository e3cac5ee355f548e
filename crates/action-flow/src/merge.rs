//! Configuration merger

use dompatch_core_types::{Configuration, MergedConfiguration};
use tracing::debug;

/// Concatenate the actions of every present configuration, in input order.
///
/// Absent entries (failed loads) contribute nothing. Never fails.
pub fn merge<I>(configs: I) -> MergedConfiguration
where
    I: IntoIterator<Item = Option<Configuration>>,
{
    let mut sources = 0usize;
    let mut missing = 0usize;
    let actions = configs
        .into_iter()
        .inspect(|config| {
            sources += 1;
            if config.is_none() {
                missing += 1;
            }
        })
        .flatten()
        .flat_map(|config| config.actions)
        .collect::<Vec<_>>();

    debug!(sources, missing, actions = actions.len(), "Merged configurations");
    MergedConfiguration::new(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompatch_core_types::Action;
    use pretty_assertions::assert_eq;

    fn config(selectors: &[&str]) -> Configuration {
        Configuration::new(selectors.iter().map(|s| Action::remove(*s)).collect())
    }

    fn selectors(merged: &MergedConfiguration) -> Vec<String> {
        merged
            .actions
            .iter()
            .map(|action| action.raw()["selector"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn concatenates_in_source_order() {
        let merged = merge(vec![
            Some(config(&["a", "b"])),
            Some(config(&[])),
            Some(config(&["c"])),
        ]);

        assert_eq!(merged.len(), 3);
        assert_eq!(selectors(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn absent_entries_contribute_nothing() {
        let merged = merge(vec![None, Some(config(&["x"])), None]);
        assert_eq!(selectors(&merged), vec!["x"]);
    }

    #[test]
    fn nothing_to_merge_is_empty() {
        assert!(merge(Vec::new()).is_empty());
        assert!(merge(vec![None, None]).is_empty());
    }
}
