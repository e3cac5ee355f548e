use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render `value` as JSON or YAML. `None` for [`OutputFormat::Human`],
    /// which each command renders itself.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<Option<String>> {
        match self {
            OutputFormat::Human => Ok(None),
            OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
            OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
        }
    }
}
