//! Declarations and helpers shared by unit tests.

use stencil_define::TypeInformation;

use crate::codegen::InterceptorRegistry;
use crate::config::EngineConfig;
use crate::extract::Extractor;
use crate::registry::TagRegistry;
use crate::source::CompilationUnit;

pub const PAIR: &str = r#"
    /// Two strings.
    #[synth]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Pair {
        first: String,
        #[default(String::from("x"))]
        second: String,
    }

    impl Pair {
        #[reconstruct]
        pub fn new(first: String, second: String) -> Self;
    }
"#;

pub const DOUBLED: &str = r#"
    #[synth(mutable)]
    #[derive(Debug, Clone)]
    pub struct Doubled {
        #[positive]
        #[less_than(1000)]
        value: i64,
        #[derived(2 * value)]
        double: i64,
    }

    impl Doubled {
        #[reconstruct]
        pub fn new(value: i64) -> Self;
    }
"#;

pub const DICE: &str = r#"
    #[synth]
    pub struct Dice {
        seed: u64,
    }

    impl Dice {
        #[reconstruct]
        pub fn new(seed: u64) -> Self;

        /// Scrambles the seed with a nonce.
        #[logged]
        #[cached]
        pub fn roll(&self, nonce: u64) -> u64 {
            (self.seed ^ nonce).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        }
    }
"#;

pub const GENERIC_TAGGED: &str = r#"
    #[synth]
    #[derive(Debug, Clone)]
    pub struct Tagged<T: Clone + PartialOrd> {
        label: String,
        value: T,
    }

    impl<T: Clone + PartialOrd> Tagged<T> {
        #[reconstruct]
        pub fn new(label: String, value: T) -> Self;
    }
"#;

pub const MEASUREMENT: &str = r#"
    #[synth]
    #[derive(Debug, Clone)]
    pub struct Measurement {
        unit: String,
        #[greater_than(0)]
        amount: f64,
    }

    impl Measurement {
        #[reconstruct]
        pub fn new(unit: String, amount: f64) -> Self;
    }
"#;

pub const SETTINGS: &str = r#"
    #[synth]
    #[derive(Debug, Clone)]
    pub struct Settings {
        #[default(8080)]
        port: u16,
        #[default(false)]
        verbose: bool,
        nickname: Option<String>,
    }

    impl Settings {
        #[reconstruct]
        pub fn new(port: u16, verbose: bool, nickname: Option<String>) -> Self;
    }
"#;

pub const READINGS: &str = r#"
    #[synth]
    #[derive(Debug, Clone)]
    pub struct Readings {
        #[bounded(3)]
        values: Vec<i32>,
    }

    impl Readings {
        #[reconstruct]
        pub fn new(values: Vec<i32>) -> Self;
    }
"#;

pub const TEAM: &str = r#"
    #[synth]
    #[derive(Debug, Clone)]
    pub struct Team {
        name: String,
        members: Vec<Pair>,
        #[helper]
        #[default(false)]
        audited: bool,
    }

    impl Team {
        #[reconstruct]
        pub fn new(name: String, members: Vec<Pair>, audited: bool) -> Self;
    }
"#;

/// Extracts the first declaration in `source` with the default configuration.
pub fn extract_first(source: &str) -> TypeInformation {
    context_parts(source).0
}

/// Everything a codegen `Context` borrows, built for the first declaration.
pub fn context_parts(
    source: &str,
) -> (TypeInformation, EngineConfig, TagRegistry, InterceptorRegistry) {
    let config = EngineConfig::default();
    let registry = TagRegistry::standard();
    let unit = CompilationUnit::from_source(source, Some("decls/test.rs")).unwrap();
    let info = Extractor::new(&registry, &config)
        .extract(&unit.declarations()[0])
        .unwrap();
    (info, config, registry, InterceptorRegistry::standard())
}

/// Removes all whitespace so token output compares independently of spacing.
pub fn squash(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether squashed `code` contains `needle`, ignoring whitespace in both.
pub fn has(code: &str, needle: &str) -> bool {
    code.contains(&squash(needle))
}
