/*!
# Tool configuration

Settings for the `fmtast` binary. Loaded from TOML (`.toml`) or YAML
(`.yaml`, `.yml`); every key has a default so partial files are fine.

```toml
[decode]
strict_fields = false

[output]
format = "text"
pretty = true

[check]
parallel = true
```
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli_common::OutputFormat;
use crate::reconstruct::DecodeOptions;

/// Конфигурация вывода
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Text, pretty: true }
    }
}

/// Конфигурация пакетной проверки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Check files on the rayon thread pool.
    pub parallel: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub decode: DecodeOptions,
    pub output: OutputConfig,
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSyntax {
    Toml,
    Yaml,
}

fn syntax_of(path: &Path) -> Result<ConfigSyntax> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("toml") => Ok(ConfigSyntax::Toml),
        Some("yaml") | Some("yml") => Ok(ConfigSyntax::Yaml),
        _ => bail!("Unsupported config format: {} (expected .toml, .yaml or .yml)", path.display()),
    }
}

impl ToolConfig {
    /// Load configuration from a TOML or YAML file, chosen by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let syntax = syntax_of(path)?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = match syntax {
            ConfigSyntax::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config from {}", path.display()))?,
            ConfigSyntax::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config from {}", path.display()))?,
        };
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`Self::load_from_file`], but a missing file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration; the format follows the file extension.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match syntax_of(path)? {
            ConfigSyntax::Toml => {
                toml::to_string_pretty(self).context("Failed to serialize config to TOML")?
            }
            ConfigSyntax::Yaml => {
                serde_yaml::to_string(self).context("Failed to serialize config to YAML")?
            }
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let c = ToolConfig::default();
        assert!(!c.decode.strict_fields);
        assert_eq!(c.output.format, OutputFormat::Text);
        assert!(c.output.pretty);
        assert!(c.check.parallel);
    }

    #[test]
    fn toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fmtast.toml");
        let mut c = ToolConfig::default();
        c.decode.strict_fields = true;
        c.output.format = OutputFormat::Json;
        c.check.parallel = false;
        c.save_to_file(&path).unwrap();
        assert_eq!(ToolConfig::load_from_file(&path).unwrap(), c);
    }

    #[test]
    fn yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fmtast.yml");
        let mut c = ToolConfig::default();
        c.output.pretty = false;
        c.save_to_file(&path).unwrap();
        assert_eq!(ToolConfig::load_from_file(&path).unwrap(), c);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[decode]\nstrict_fields = true\n").unwrap();
        let c = ToolConfig::load_from_file(&path).unwrap();
        assert!(c.decode.strict_fields);
        assert!(c.check.parallel);
    }

    #[test]
    fn missing_file_and_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let c = ToolConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(c, ToolConfig::default());
        let ini = dir.path().join("fmtast.ini");
        std::fs::write(&ini, "").unwrap();
        assert!(ToolConfig::load_from_file(&ini).is_err());
    }
}
