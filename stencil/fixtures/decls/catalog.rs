// Declarations compiled by build.rs. This file is parsed, never compiled.

/// Two strings, the second one defaulted.
#[synth]
#[derive(Debug, Clone)]
pub struct Pair {
    first: String,
    #[default(String::from("x"))]
    second: String,
}

impl Pair {
    #[reconstruct]
    pub fn new(first: String, second: String) -> Self;

    pub fn joined(&self) -> String {
        format!("{}{}", self.first, self.second)
    }
}

/// A bounded number and its double.
#[synth(mutable)]
#[derive(Debug, Clone)]
pub struct Doubled {
    #[positive]
    #[less_than(1000)]
    value: i64,
    #[derived(2 * value)]
    #[positive]
    double: i64,
}

impl Doubled {
    #[reconstruct]
    pub fn new(value: i64) -> Self;
}

/// An account whose owner is stored normalized.
#[synth(mutable)]
#[invariant(self.balance >= 0)]
#[ensures(self.owner.len() <= 32)]
#[derive(Debug, Clone)]
pub struct Account {
    #[normalize(owner.trim().to_lowercase())]
    #[not_empty]
    owner: String,
    #[default(0)]
    balance: i64,
    #[property]
    #[default(String::from("EUR"))]
    currency: String,
    #[default(Fixed(1))]
    version: Fixed<u32>,
}

impl Account {
    #[factory]
    pub fn open(owner: String, balance: i64) -> Self;

    pub fn deposit(&mut self, amount: i64) -> Result<(), stencil_runtime::ContractViolation> {
        let next = self.balance + amount;
        self.set_balance(next)
    }
}

#[synth(implementation)]
#[derive(Debug, Clone)]
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
        let mut x = self.seed ^ nonce.rotate_left(17);
        x ^= x >> 33;
        x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
        x ^= x >> 33;
        x
    }

    /// Returns how many probes ran before this one computed.
    #[cached]
    pub fn probe(&self, key: String) -> usize {
        let _ = key;
        crate::PROBES.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

/// At most three readings, in ascending order.
#[synth]
#[derive(Debug, Clone)]
pub struct Readings {
    #[bounded(3)]
    #[ascending]
    values: Vec<i32>,
}

impl Readings {
    #[reconstruct]
    pub fn new(values: Vec<i32>) -> Self;
}

/// A labelled value of any comparable type.
#[synth]
#[derive(Debug, Clone)]
pub struct Tagged<T: Clone + PartialOrd> {
    #[not_empty]
    label: String,
    value: T,
}

impl<T: Clone + PartialOrd> Tagged<T> {
    #[reconstruct]
    pub fn new(label: String, value: T) -> Self;
}

#[synth]
#[invariant(self.low <= self.high)]
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    low: i32,
    high: i32,
    #[derived(high - low)]
    width: i32,
}

impl Interval {
    #[factory]
    pub fn between(low: i32, high: i32) -> Self;
}

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

/// Every field optional.
#[synth(builder, implementation)]
#[derive(Debug, Clone)]
pub struct Settings {
    #[default(8080)]
    #[greater_than(1023)]
    port: u16,
    #[default(false)]
    verbose: bool,
    #[size(max = 8)]
    nickname: Option<String>,
}

impl Settings {
    #[reconstruct]
    pub fn new(port: u16, verbose: bool, nickname: Option<String>) -> Self;
}

/// Assigned in `b`, `c`, `a` order.
#[synth]
#[derive(Debug, Clone)]
pub struct Triple {
    a: u8,
    #[order(2)]
    c: u8,
    #[order(1)]
    b: u8,
}

impl Triple {
    #[factory]
    pub fn of(a: u8, b: u8, c: u8) -> Self;
}

#[synth]
#[derive(Debug, Clone)]
pub struct Pairwise {
    #[strictly_descending]
    ranks: Vec<u32>,
    #[descending]
    scores: Vec<i64>,
    #[strictly_ascending]
    #[size(min = 1)]
    ids: Vec<u16>,
    #[multiple_of(5)]
    #[negative]
    floor: i32,
}

impl Pairwise {
    #[reconstruct]
    pub fn new(ranks: Vec<u32>, scores: Vec<i64>, ids: Vec<u16>, floor: i32) -> Self;
}

/// A named group of pairs.
#[synth]
#[derive(Debug, Clone)]
pub struct Team {
    #[not_empty]
    #[invariant(_0.chars().all(|c| c.is_ascii_alphanumeric()))]
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
