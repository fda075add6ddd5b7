use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the per-corpus configuration, looked up at the corpus root.
pub const CONFIG_FILE: &str = "wildkit.json";

/// Root configuration structure for wildkit.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WildkitConfig {
    /// Extension (without dot) of the files that make up the corpus.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Occurrences shown per document in a rename preview.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,

    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for WildkitConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            preview_limit: default_preview_limit(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Traversal rules per tool. Each tool sees its own slice of the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub replace: ExclusionConfig,

    #[serde(default = "default_lint_exclusion")]
    pub lint: ExclusionConfig,

    #[serde(default)]
    pub refactor: ExclusionConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            replace: ExclusionConfig::default(),
            lint: default_lint_exclusion(),
            refactor: ExclusionConfig::default(),
        }
    }
}

/// Which documents a tool skips. All rules match the root-relative path.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExclusionConfig {
    /// Skip documents with any path component equal to one of these.
    #[serde(default)]
    pub dirs: Vec<String>,

    /// Skip documents whose file name starts with one of these.
    #[serde(default)]
    pub name_prefixes: Vec<String>,

    /// Skip documents whose `/`-separated path matches one of these globs.
    #[serde(default)]
    pub globs: Vec<String>,
}

impl ExclusionConfig {
    pub fn excludes(&self, relative: &Path) -> bool {
        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        if components
            .iter()
            .any(|c| self.dirs.iter().any(|d| d == c))
        {
            return true;
        }

        if let Some(name) = components.last() {
            if self.name_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                return true;
            }
        }

        let joined = components.join("/");
        self.globs
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &joined))
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_extension() -> String {
    "txt".to_string()
}

fn default_preview_limit() -> usize {
    3
}

fn default_lint_exclusion() -> ExclusionConfig {
    ExclusionConfig {
        dirs: vec!["logic".to_string()],
        name_prefixes: vec!["!".to_string()],
        globs: Vec::new(),
    }
}

// =============================================================================
// Loading functions
// =============================================================================

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load the corpus config, falling back to built-in defaults when the file is
/// missing or invalid.
pub fn load_config(root: &Path) -> WildkitConfig {
    match read_config(root) {
        Ok(config) => config,
        Err(err) => {
            crate::log_status!("config", "Ignoring {}: {}", CONFIG_FILE, err.summary());
            WildkitConfig::default()
        }
    }
}

/// Read wildkit.json strictly. A missing file yields the defaults; an
/// unreadable or malformed file is an error.
pub fn read_config(root: &Path) -> crate::Result<WildkitConfig> {
    let path = config_path(root);

    if !path.exists() {
        return Ok(WildkitConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let config: WildkitConfig = serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &WildkitConfig) -> crate::Result<()> {
    if config.extension.trim_start_matches('.').is_empty() {
        return Err(crate::Error::config_invalid_value(
            "extension",
            Some(config.extension.clone()),
            "extension cannot be empty",
        ));
    }
    if config.preview_limit == 0 {
        return Err(crate::Error::config_invalid_value(
            "preview_limit",
            Some("0".to_string()),
            "preview_limit must be at least 1",
        ));
    }
    Ok(())
}

/// Save config to wildkit.json. Refuses to replace an existing file unless
/// `force` is set.
pub fn save_config(root: &Path, config: &WildkitConfig, force: bool) -> crate::Result<PathBuf> {
    let path = config_path(root);

    if path.exists() && !force {
        return Err(crate::Error::config_already_exists(
            path.display().to_string(),
        ));
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some(format!("serialize {}", CONFIG_FILE)))
    })?;

    fs::write(&path, content + "\n").map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok(path)
}
