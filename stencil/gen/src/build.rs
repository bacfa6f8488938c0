//! Build-script integration.
//!
//! ```no_run
//! // build.rs
//! fn main() {
//!     stencil_gen::build::Builder::new()
//!         .compile(&["decls/catalog.rs"])
//!         .unwrap();
//! }
//! ```
//!
//! ```ignore
//! // src/lib.rs
//! include!(concat!(env!("OUT_DIR"), "/stencil_generated.rs"));
//! ```

use std::env;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::EngineConfig;
use crate::diagnostics::{CargoSink, DiagnosticSink, TracingSink};
use crate::driver::{Engine, RunReport};
use crate::errors::{ConfigError, GeneratorError};
use crate::output::{DirectorySink, GENERATED_NOTICE, write_atomic};
use crate::source::CompilationUnit;

/// Name of the file that `include!`s every artifact.
pub const AGGREGATE_FILE: &str = "stencil_generated.rs";

/// Compiles declaration files from a build script.
#[derive(Debug, Clone)]
pub struct Builder {
    config: EngineConfig,
    config_file: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    cargo_output: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            config_file: None,
            out_dir: None,
            cargo_output: true,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a `stencil.toml` and reruns the build
    /// script when it changes.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Result<Self, GeneratorError> {
        let path = path.into();
        self.config = EngineConfig::load(&path)?;
        self.config_file = Some(path);
        Ok(self)
    }

    /// Defaults to `OUT_DIR`.
    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// Whether to print `cargo:` directives. On by default.
    pub fn cargo_output(mut self, enabled: bool) -> Self {
        self.cargo_output = enabled;
        self
    }

    /// Generates every artifact of `paths` into the output directory.
    ///
    /// Diagnostics become `cargo:warning` lines. Returns
    /// `GeneratorError::Diagnostics` when any error was reported, after
    /// every valid type has been written.
    pub fn compile<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RunReport, GeneratorError> {
        if self.cargo_output {
            self.compile_with(paths, &mut CargoSink::stdout())
        } else {
            self.compile_with(paths, &mut TracingSink)
        }
    }

    /// Like [`compile`](Self::compile) with an explicit diagnostic sink.
    pub fn compile_with<P: AsRef<Path>>(
        &self,
        paths: &[P],
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<RunReport, GeneratorError> {
        let out_dir = self.resolve_out_dir()?;
        if self.cargo_output {
            for path in paths {
                println!("cargo:rerun-if-changed={}", path.as_ref().display());
            }
            if let Some(path) = &self.config_file {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }

        let engine = Engine::new(self.config.clone())?;
        let unit = CompilationUnit::from_files(paths)?;
        let mut files = DirectorySink::new(&out_dir);
        let report = engine.run(&unit, diagnostics, &mut files)?;

        let aggregate = out_dir.join(AGGREGATE_FILE);
        write_atomic(&aggregate, &aggregate_source(&out_dir, &report, self.config.header))?;
        info!(path = %aggregate.display(), files = report.emitted.len(), "wrote aggregate");

        if !report.is_success() {
            return Err(GeneratorError::Diagnostics {
                errors: report.errors,
            });
        }
        Ok(report)
    }

    fn resolve_out_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.out_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(ConfigError::MissingOutDir),
        }
    }
}

/// One `include!` per emitted file, by absolute path.
fn aggregate_source(out_dir: &Path, report: &RunReport, header: bool) -> String {
    let mut source = String::new();
    if header {
        source.push_str(GENERATED_NOTICE);
        source.push_str("\n\n");
    }
    for name in report.file_names() {
        let path = out_dir.join(name);
        source.push_str(&format!("include!({:?});\n", path.display().to_string()));
    }
    source
}
