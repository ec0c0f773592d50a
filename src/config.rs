use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::content::DEFAULT_EXCERPT_LINES;
use crate::placement::PanelGeometry;
use crate::prefetch::DEFAULT_DEBOUNCE;

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub content_dir: Option<PathBuf>,
    pub prefetch: PrefetchConfigFile,
    pub preview: PreviewConfigFile,
    pub viewer: ViewerConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct PrefetchConfigFile {
    pub debounce_ms: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfigFile {
    pub excerpt_lines: Option<usize>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub sidebar_cols: Option<u16>,
    pub frame_budget_ms: Option<u64>,
    pub panel: PanelConfigFile,
}

/// Panel geometry in terminal cells.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct PanelConfigFile {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub offset_x: Option<i32>,
    pub offset_y: Option<i32>,
    pub padding: Option<i32>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub content_dir: Option<PathBuf>,
    pub debounce: Duration,
    pub excerpt_lines: usize,
    pub viewer: ViewerConfig,
}

pub struct ViewerConfig {
    pub sidebar_cols: u16,
    pub frame_budget: Duration,
    pub panel: PanelGeometry,
}

/// CLI values that override the config file.
#[derive(Default)]
pub struct CliOverrides {
    pub content_dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub excerpt_lines: Option<usize>,
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(v) = cli.content_dir {
            debug!("config: CLI override content_dir={}", v.display());
            self.content_dir = Some(v);
        }
        if let Some(v) = cli.debounce_ms {
            debug!("config: CLI override debounce_ms={v}");
            self.prefetch.debounce_ms = Some(v);
        }
        if let Some(v) = cli.excerpt_lines {
            debug!("config: CLI override excerpt_lines={v}");
            self.preview.excerpt_lines = Some(v);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    ///
    /// Fails if the panel geometry is out of range.
    pub fn resolve(self) -> anyhow::Result<Config> {
        let panel = &self.viewer.panel;
        let config = Config {
            content_dir: self.content_dir,
            debounce: self
                .prefetch
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            excerpt_lines: self.preview.excerpt_lines.unwrap_or(DEFAULT_EXCERPT_LINES),
            viewer: ViewerConfig {
                sidebar_cols: self.viewer.sidebar_cols.unwrap_or(26),
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
                panel: PanelGeometry {
                    width: panel.width.unwrap_or(56),
                    height: panel.height.unwrap_or(18),
                    offset_x: panel.offset_x.unwrap_or(2),
                    offset_y: panel.offset_y.unwrap_or(1),
                    padding: panel.padding.unwrap_or(1),
                },
            },
        };
        check_panel(&config.viewer.panel)?;
        info!(
            "config: resolved content_dir={}, debounce={}ms, excerpt_lines={}, \
             sidebar_cols={}, frame_budget={}ms, panel={}x{}",
            config
                .content_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<catalog only>".into()),
            config.debounce.as_millis(),
            config.excerpt_lines,
            config.viewer.sidebar_cols,
            config.viewer.frame_budget.as_millis(),
            config.viewer.panel.width,
            config.viewer.panel.height,
        );
        Ok(config)
    }
}

/// Panel sizes must be at least one cell, offsets and padding non-negative,
/// and everything must fit a terminal coordinate.
fn check_panel(panel: &PanelGeometry) -> anyhow::Result<()> {
    let max = i32::from(u16::MAX);
    for (name, value, min) in [
        ("width", panel.width, 1),
        ("height", panel.height, 1),
        ("offset_x", panel.offset_x, 0),
        ("offset_y", panel.offset_y, 0),
        ("padding", panel.padding, 0),
    ] {
        anyhow::ensure!(
            (min..=max).contains(&value),
            "viewer.panel.{name} = {value} is out of range ({min}..={max})"
        );
    }
    Ok(())
}

/// Resolve the XDG config path for patternpeek.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("patternpeek").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        let resolved = cfg.resolve().unwrap();
        assert!(resolved.content_dir.is_none());
        assert_eq!(resolved.debounce, Duration::from_millis(200));
        assert_eq!(resolved.excerpt_lines, 15);
        assert_eq!(resolved.viewer.sidebar_cols, 26);
        assert_eq!(resolved.viewer.panel.width, 56);
        assert_eq!(resolved.viewer.panel.padding, 1);
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            content_dir = "/srv/patterns"
            [prefetch]
            debounce_ms = 350
            [viewer.panel]
            width = 40
        "#;
        let cfg: ConfigFile = toml::from_str(text).unwrap();
        let resolved = cfg.resolve().unwrap();
        assert_eq!(resolved.content_dir, Some(PathBuf::from("/srv/patterns")));
        assert_eq!(resolved.debounce, Duration::from_millis(350));
        assert_eq!(resolved.viewer.panel.width, 40);
        // Defaults for unspecified fields
        assert_eq!(resolved.viewer.panel.height, 18);
        assert_eq!(resolved.viewer.frame_budget, Duration::from_millis(32));
    }

    #[test]
    fn invalid_toml() {
        let text = "this is not valid toml [[[";
        let result = toml::from_str::<ConfigFile>(text);
        assert!(result.is_err());
    }

    #[test]
    fn bad_panel_geometry_is_rejected() {
        for text in [
            "[viewer.panel]\nwidth = 0",
            "[viewer.panel]\nheight = -3",
            "[viewer.panel]\noffset_x = -1",
            "[viewer.panel]\npadding = 2147483647",
        ] {
            let cfg: ConfigFile = toml::from_str(text).unwrap();
            let err = cfg.resolve().err().unwrap_or_else(|| panic!("accepted {text:?}"));
            assert!(err.to_string().starts_with("viewer.panel."), "{err}");
        }
    }

    #[test]
    fn cli_overrides() {
        let mut cfg: ConfigFile = toml::from_str("[prefetch]\ndebounce_ms = 500").unwrap();
        cfg.merge_cli(CliOverrides {
            content_dir: Some(PathBuf::from("content")),
            debounce_ms: Some(50),
            excerpt_lines: None,
        });
        let resolved = cfg.resolve().unwrap();
        assert_eq!(resolved.debounce, Duration::from_millis(50)); // CLI wins
        assert_eq!(resolved.content_dir, Some(PathBuf::from("content")));
        assert_eq!(resolved.excerpt_lines, 15); // default (neither config nor CLI)
    }
}
