//! Engine configuration.
//!
//! Configuration is read from an optional `stencil.toml` or built in code.
//! Every setting has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! module_path = "crate::model"
//! runtime_path = "::stencil_runtime"
//! property_types = ["ReadOnly"]
//! header = true
//!
//! [suffixes]
//! builder = "Builder"
//! implementation = "Subclass"
//! converter = "Converter"
//! ```

use std::fs;
use std::path::Path;

use proc_macro2::TokenStream;
use quote::ToTokens;
use serde::{Deserialize, Serialize};
use stencil_define::ArtifactKind;
use strum::IntoEnumIterator;

use crate::errors::ConfigError;

/// Default path generated code uses to reach runtime support.
pub const DEFAULT_RUNTIME_PATH: &str = "::stencil_runtime";

/// Suffixes appended to a declared name to form artifact names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Suffixes {
    pub builder: String,
    pub implementation: String,
    pub converter: String,
}

impl Default for Suffixes {
    fn default() -> Self {
        Self {
            builder: ArtifactKind::Builder.default_suffix().to_string(),
            implementation: ArtifactKind::Implementation.default_suffix().to_string(),
            converter: ArtifactKind::Converter.default_suffix().to_string(),
        }
    }
}

/// Settings shared by every stage of one engine run.
///
/// ## Examples
///
/// ```
/// use stencil_define::ArtifactKind;
/// use stencil_gen::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str(r#"
///     module_path = "crate::model"
///     [suffixes]
///     builder = "Maker"
/// "#).unwrap();
///
/// assert_eq!(config.artifact_name("Pair", ArtifactKind::Builder), "PairMaker");
/// assert_eq!(
///     config.qualified_name("Pair", ArtifactKind::Implementation),
///     "crate::model::PairSubclass"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Prefix of qualified artifact names; `None` leaves names unqualified.
    pub module_path: Option<String>,
    /// Absolute path of the runtime support crate in generated code.
    pub runtime_path: String,
    /// Outermost type names that make a field a read-only property.
    pub property_types: Vec<String>,
    /// Prepend the "generated" notice to every artifact.
    pub header: bool,
    pub suffixes: Suffixes,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module_path: None,
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            property_types: Vec::new(),
            header: true,
            suffixes: Suffixes::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = Some(path.into());
        self
    }

    pub fn with_property_type(mut self, name: impl Into<String>) -> Self {
        self.property_types.push(name.into());
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Checks that every setting can be turned into valid Rust.
    ///
    /// ## Errors
    ///
    /// - `InvalidSuffix` when a suffix is empty or not alphanumeric
    /// - `DuplicateSuffix` when two artifact kinds share a suffix
    /// - `InvalidPath` when the runtime path, module path or a property type
    ///   does not parse as a Rust path
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ArtifactKind::iter() {
            let suffix = self.suffix(kind);
            if suffix.is_empty() {
                return Err(ConfigError::InvalidSuffix {
                    artifact: kind.to_string(),
                    suffix: suffix.to_string(),
                    reason: "suffix cannot be empty".to_string(),
                });
            }
            if !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::InvalidSuffix {
                    artifact: kind.to_string(),
                    suffix: suffix.to_string(),
                    reason: "suffix must contain only alphanumeric characters (letters and numbers)"
                        .to_string(),
                });
            }
        }

        let suffixes = [
            &self.suffixes.builder,
            &self.suffixes.implementation,
            &self.suffixes.converter,
        ];
        for (i, suffix) in suffixes.iter().enumerate() {
            if suffixes[i + 1..].contains(suffix) {
                return Err(ConfigError::DuplicateSuffix {
                    suffix: suffix.to_string(),
                });
            }
        }

        parse_path("runtime_path", &self.runtime_path)?;
        if let Some(module_path) = &self.module_path {
            parse_path("module_path", module_path)?;
        }
        for name in &self.property_types {
            if syn::parse_str::<syn::Ident>(name).is_err() {
                return Err(ConfigError::InvalidPath {
                    setting: "property type",
                    value: name.clone(),
                    reason: "must be a single type name".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn suffix(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Implementation => &self.suffixes.implementation,
            ArtifactKind::Builder => &self.suffixes.builder,
            ArtifactKind::Converter => &self.suffixes.converter,
        }
    }

    /// The generated type name for one artifact, e.g. `PairBuilder`.
    pub fn artifact_name(&self, type_name: &str, kind: ArtifactKind) -> String {
        format!("{}{}", type_name, self.suffix(kind))
    }

    /// The artifact name prefixed with `module_path`, when configured.
    pub fn qualified_name(&self, type_name: &str, kind: ArtifactKind) -> String {
        let name = self.artifact_name(type_name, kind);
        match &self.module_path {
            Some(module) => format!("{}::{}", module, name),
            None => name,
        }
    }

    /// Returns true if `name` is a configured read-only-value type.
    pub fn is_property_type(&self, name: &str) -> bool {
        self.property_types.iter().any(|candidate| candidate == name)
    }

    /// The runtime path as tokens, ready to be spliced into generated code.
    pub fn runtime_tokens(&self) -> Result<TokenStream, ConfigError> {
        parse_path("runtime_path", &self.runtime_path).map(|path| path.to_token_stream())
    }
}

fn parse_path(setting: &'static str, value: &str) -> Result<syn::Path, ConfigError> {
    syn::parse_str::<syn::Path>(value).map_err(|e| ConfigError::InvalidPath {
        setting,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.runtime_path, "::stencil_runtime");
        assert!(config.header);
    }

    #[test]
    fn suffix_with_hyphen_is_rejected() {
        let err = EngineConfig::from_toml_str("[suffixes]\nbuilder = \"Build-er\"").unwrap_err();
        match err {
            ConfigError::InvalidSuffix {
                artifact, suffix, ..
            } => {
                assert_eq!(artifact, "builder");
                assert_eq!(suffix, "Build-er");
            }
            other => panic!("Expected InvalidSuffix, got: {:?}", other),
        }
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let err =
            EngineConfig::from_toml_str("[suffixes]\nconverter = \"\"").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn shared_suffix_is_rejected() {
        let err = EngineConfig::from_toml_str("[suffixes]\nconverter = \"Builder\"").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSuffix { .. }));
    }

    #[test]
    fn unparseable_runtime_path_is_rejected() {
        let err = EngineConfig::from_toml_str("runtime_path = \"not a path\"").unwrap_err();
        match err {
            ConfigError::InvalidPath { setting, .. } => assert_eq!(setting, "runtime_path"),
            other => panic!("Expected InvalidPath, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("runtime = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn property_types_are_matched_by_name() {
        let config = EngineConfig::default().with_property_type("ReadOnly");
        assert!(config.is_property_type("ReadOnly"));
        assert!(!config.is_property_type("Vec"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stencil.toml");
        std::fs::write(&path, "header = false\nproperty_types = [\"ReadOnly\"]").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert!(!config.header);
        assert_eq!(config.property_types, vec!["ReadOnly".to_string()]);
    }
}
