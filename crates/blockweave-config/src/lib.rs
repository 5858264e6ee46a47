use std::path::{Path, PathBuf};

use blockweave_engine::{
    ClassMap, ContentHandling, ConversionOptions, CssFramework, OptimizationLevel, OptionsError,
    OutputTarget, SsrFlags, SsrOptions,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid class map pattern {pattern}: {source}")]
    ClassMapPatternError {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to read class map at {path}: {source}")]
    ClassMapReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse class map at {path}: {source}")]
    ClassMapParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// `[ssr]` table. Any flag given here overrides the level's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_path_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritize_above_the_fold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_the_fold_budget: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_non_critical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lazy_load_media: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_first_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_duplicate_styles: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconnect: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify_output: Option<bool>,
}

impl SsrSettings {
    fn has_overrides(&self) -> bool {
        self.critical_path_only.is_some()
            || self.optimization_depth.is_some()
            || self.prioritize_above_the_fold.is_some()
            || self.above_the_fold_budget.is_some()
            || self.defer_non_critical.is_some()
            || self.lazy_load_media.is_some()
            || self.preserve_first_image.is_some()
            || self.remove_duplicate_styles.is_some()
            || self.preconnect.is_some()
            || self.minify_output.is_some()
    }

    pub fn to_ssr_options(&self) -> Result<SsrOptions, OptionsError> {
        let level = match &self.level {
            Some(level) => level.parse::<OptimizationLevel>()?,
            None => OptimizationLevel::default(),
        };
        if !self.has_overrides() {
            return Ok(SsrOptions::Level(level));
        }
        let base = level.flags();
        Ok(SsrOptions::Flags(SsrFlags {
            critical_path_only: self.critical_path_only.unwrap_or(base.critical_path_only),
            optimization_depth: self.optimization_depth.unwrap_or(base.optimization_depth),
            prioritize_above_the_fold: self
                .prioritize_above_the_fold
                .unwrap_or(base.prioritize_above_the_fold),
            above_the_fold_budget: self
                .above_the_fold_budget
                .unwrap_or(base.above_the_fold_budget),
            defer_non_critical: self.defer_non_critical.unwrap_or(base.defer_non_critical),
            lazy_load_media: self.lazy_load_media.unwrap_or(base.lazy_load_media),
            preserve_first_image: self.preserve_first_image.unwrap_or(base.preserve_first_image),
            remove_duplicate_styles: self
                .remove_duplicate_styles
                .unwrap_or(base.remove_duplicate_styles),
            preconnect: self.preconnect.unwrap_or(base.preconnect),
            minify_output: self.minify_output.unwrap_or(base.minify_output),
        }))
    }
}

/// `[streaming]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buffered_chunks: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_handling: Option<String>,
    /// Glob patterns of class map files, merged in order (later files win).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub class_maps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_blocks: Option<Vec<String>>,
    pub ssr: SsrSettings,
    pub streaming: StreamingSettings,
    /// Directory relative class map patterns are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut settings: Settings =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        settings.base_dir = config_path.parent().map(Path::to_path_buf);

        log::info!("Loaded settings from {}", config_path.display());
        Ok(Some(settings))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Builds validated conversion options, loading every class map file.
    pub fn to_options(&self) -> Result<ConversionOptions, ConfigError> {
        let mut builder = ConversionOptions::builder();
        if let Some(target) = &self.output_target {
            builder = builder.output_target(target.parse::<OutputTarget>()?);
        }
        if let Some(framework) = &self.css_framework {
            builder = builder.css_framework(framework.parse::<CssFramework>()?);
        }
        if let Some(mode) = &self.content_handling {
            builder = builder.content_handling(mode.parse::<ContentHandling>()?);
        }
        if let Some(names) = &self.interactive_blocks {
            builder = builder.interactive_blocks(names.iter().cloned());
        }
        if let Some(map) = self.load_class_maps()? {
            builder = builder.custom_class_map(map);
        }
        if let Some(chunk_size) = self.streaming.chunk_size {
            builder = builder.chunk_size(chunk_size);
        }
        if let Some(limit) = self.streaming.max_buffered_chunks {
            builder = builder.max_buffered_chunks(limit);
        }

        let options = builder
            .ssr(self.ssr.enabled)
            .ssr_options(self.ssr.to_ssr_options()?)
            .build();
        options.validate()?;
        Ok(options)
    }

    /// Merges every file matched by `class_maps`; `None` when no file matched.
    pub fn load_class_maps(&self) -> Result<Option<ClassMap>, ConfigError> {
        let mut merged: Option<ClassMap> = None;
        for pattern in &self.class_maps {
            let expanded = self.expand_pattern(pattern);
            let paths = glob::glob(&expanded).map_err(|source| {
                ConfigError::ClassMapPatternError {
                    pattern: pattern.clone(),
                    source,
                }
            })?;

            let mut matched = false;
            // Unreadable directory entries are skipped, as the shell would.
            for path in paths.flatten() {
                matched = true;
                let map = Self::read_class_map(&path)?;
                log::debug!("Loaded class map {}", path.display());
                match merged.as_mut() {
                    Some(existing) => existing.merge(map),
                    None => merged = Some(map),
                }
            }
            if !matched {
                log::warn!("Class map pattern {pattern} matched no files");
            }
        }
        Ok(merged)
    }

    fn read_class_map(path: &Path) -> Result<ClassMap, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ClassMapReadError {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::ClassMapParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    fn expand_pattern(&self, pattern: &str) -> String {
        let expanded = match shellexpand::full(pattern) {
            Ok(expanded) => expanded.into_owned(),
            Err(_) => pattern.to_string(),
        };
        match &self.base_dir {
            Some(base) if Path::new(&expanded).is_relative() => {
                base.join(&expanded).to_string_lossy().into_owned()
            }
            _ => expanded,
        }
    }
}
