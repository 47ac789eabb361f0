//! Parity choice strategies
//!
//! Strategies are interchangeable policy objects behind [`ParityStrategy`].
//! The [`StrategyRegistry`] maps names to factories: the built-ins are
//! registered up front and callers may add their own with
//! [`StrategyRegistry::register`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::parity::Parity;
use crate::player::{HistoryEntry, PlayerStats};

/// Strategy used when none is configured
pub const DEFAULT_STRATEGY: &str = "random";

/// Chooses a parity for a game
pub trait ParityStrategy: Send {
    /// Pick "even" or "odd" for `game_id`, given this player's concluded games
    fn choose(&mut self, game_id: &str, history: &[HistoryEntry], stats: &PlayerStats) -> Parity;

    /// Registry name
    fn name(&self) -> &str;
}

/// Factory producing a fresh strategy instance
pub type StrategyFactory = Box<dyn Fn() -> Box<dyn ParityStrategy> + Send + Sync>;

fn random_parity<R: Rng + ?Sized>(rng: &mut R) -> Parity {
    if rng.gen_bool(0.5) {
        Parity::Even
    } else {
        Parity::Odd
    }
}

/// Choose by SHA-256 of the game id; the same id always yields the same parity
pub fn deterministic_parity(game_id: &str) -> Parity {
    if game_id.is_empty() {
        return Parity::Even;
    }
    let digest = Sha256::digest(game_id.as_bytes());
    // Parity of the digest read as a big-endian integer
    if digest[digest.len() - 1] % 2 == 0 {
        Parity::Even
    } else {
        Parity::Odd
    }
}

// ============================================================================
// Built-in strategies
// ============================================================================

/// Fair coin
pub struct RandomStrategy {
    rng: ChaCha8Rng,
}

impl RandomStrategy {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ParityStrategy for RandomStrategy {
    fn choose(&mut self, _game_id: &str, _history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        random_parity(&mut self.rng)
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Always the same parity
pub struct FixedStrategy {
    parity: Parity,
}

impl FixedStrategy {
    pub fn new(parity: Parity) -> Self {
        Self { parity }
    }
}

impl ParityStrategy for FixedStrategy {
    fn choose(&mut self, _game_id: &str, _history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        self.parity
    }

    fn name(&self) -> &str {
        match self.parity {
            Parity::Even => "always_even",
            Parity::Odd => "always_odd",
        }
    }
}

/// Hash of the game id
pub struct DeterministicStrategy;

impl ParityStrategy for DeterministicStrategy {
    fn choose(&mut self, game_id: &str, _history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        deterministic_parity(game_id)
    }

    fn name(&self) -> &str {
        "deterministic"
    }
}

/// Odd, even, odd, even, ...
#[derive(Default)]
pub struct AlternatingStrategy {
    game_count: u64,
}

impl ParityStrategy for AlternatingStrategy {
    fn choose(&mut self, _game_id: &str, _history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        self.game_count += 1;
        if self.game_count % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    fn name(&self) -> &str {
        "alternating"
    }
}

/// Keep a winning choice, flip a losing one
pub struct AdaptiveStrategy {
    last_choice: Option<Parity>,
    rng: ChaCha8Rng,
}

impl AdaptiveStrategy {
    /// Number of recent games consulted
    const WINDOW: usize = 5;

    pub fn new() -> Self {
        Self {
            last_choice: None,
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ParityStrategy for AdaptiveStrategy {
    fn choose(&mut self, _game_id: &str, history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        if history.is_empty() {
            let choice = random_parity(&mut self.rng);
            self.last_choice = Some(choice);
            return choice;
        }

        let recent = &history[history.len().saturating_sub(Self::WINDOW)..];
        let wins = recent.iter().filter(|entry| entry.won()).count();

        let choice = match self.last_choice {
            Some(last) if wins * 2 > recent.len() => last,
            Some(last) => last.flip(),
            None => random_parity(&mut self.rng),
        };
        self.last_choice = Some(choice);
        choice
    }

    fn name(&self) -> &str {
        "adaptive"
    }
}

/// Pick whichever parity has won more often for this player
pub struct CounterStrategy {
    rng: ChaCha8Rng,
}

impl CounterStrategy {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for CounterStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ParityStrategy for CounterStrategy {
    fn choose(&mut self, _game_id: &str, history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        let (mut even_wins, mut odd_wins) = (0u32, 0u32);
        for entry in history.iter().filter(|entry| entry.won()) {
            match entry.choice {
                Some(Parity::Even) => even_wins += 1,
                Some(Parity::Odd) => odd_wins += 1,
                None => {}
            }
        }

        if even_wins + odd_wins == 0 {
            random_parity(&mut self.rng)
        } else if even_wins >= odd_wins {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    fn name(&self) -> &str {
        "counter"
    }
}

/// Weighted coin
pub struct BiasedRandomStrategy {
    even_probability: f64,
    name: String,
    rng: ChaCha8Rng,
}

impl BiasedRandomStrategy {
    pub fn new(even_probability: f64) -> Self {
        let even_probability = even_probability.clamp(0.0, 1.0);
        Self {
            even_probability,
            name: format!("biased_random_{}", (even_probability * 100.0).round() as u32),
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl ParityStrategy for BiasedRandomStrategy {
    fn choose(&mut self, _game_id: &str, _history: &[HistoryEntry], _stats: &PlayerStats) -> Parity {
        if self.rng.gen_bool(self.even_probability) {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Named strategy factories
pub struct StrategyRegistry {
    factories: FxHashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Registry holding every built-in strategy
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("random", || Box::new(RandomStrategy::new()));
        registry.register("always_even", || Box::new(FixedStrategy::new(Parity::Even)));
        registry.register("always_odd", || Box::new(FixedStrategy::new(Parity::Odd)));
        registry.register("deterministic", || Box::new(DeterministicStrategy));
        registry.register("alternating", || Box::new(AlternatingStrategy::default()));
        registry.register("adaptive", || Box::new(AdaptiveStrategy::new()));
        registry.register("counter", || Box::new(CounterStrategy::new()));
        registry.register("biased_random_70", || Box::new(BiasedRandomStrategy::new(0.7)));
        registry.register("biased_random_30", || Box::new(BiasedRandomStrategy::new(0.3)));
        registry
    }

    /// Add or replace a strategy under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ParityStrategy> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Instantiate the strategy registered under `name`
    pub fn create(&self, name: &str) -> Result<Box<dyn ParityStrategy>, CoreError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| CoreError::UnknownStrategy {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Outcome;
    use chrono::Utc;
    use serde_json::Value;

    fn entry(outcome: Outcome, choice: Parity) -> HistoryEntry {
        HistoryEntry {
            game_id: None,
            winner: None,
            outcome,
            choice: Some(choice),
            details: Value::Null,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_deterministic_is_stable() {
        let mut strategy = DeterministicStrategy;
        let stats = PlayerStats::default();
        let first = strategy.choose("g1", &[], &stats);
        for _ in 0..10 {
            assert_eq!(strategy.choose("g1", &[], &stats), first);
        }
        assert_eq!(deterministic_parity(""), Parity::Even);
    }

    #[test]
    fn test_deterministic_varies_across_ids() {
        let parities: Vec<Parity> = (0..64).map(|i| deterministic_parity(&format!("game_{}", i))).collect();
        assert!(parities.contains(&Parity::Even));
        assert!(parities.contains(&Parity::Odd));
    }

    #[test]
    fn test_alternating_starts_odd() {
        let mut strategy = AlternatingStrategy::default();
        let stats = PlayerStats::default();
        assert_eq!(strategy.choose("a", &[], &stats), Parity::Odd);
        assert_eq!(strategy.choose("b", &[], &stats), Parity::Even);
        assert_eq!(strategy.choose("c", &[], &stats), Parity::Odd);
    }

    #[test]
    fn test_adaptive_keeps_winner_flips_loser() {
        let mut strategy = AdaptiveStrategy::new();
        let stats = PlayerStats::default();
        let first = strategy.choose("g0", &[], &stats);

        let winning = vec![entry(Outcome::Win, first)];
        assert_eq!(strategy.choose("g1", &winning, &stats), first);

        let losing = vec![entry(Outcome::Loss, first)];
        assert_eq!(strategy.choose("g2", &losing, &stats), first.flip());
    }

    #[test]
    fn test_counter_follows_winning_parity() {
        let mut strategy = CounterStrategy::new();
        let history = vec![
            entry(Outcome::Win, Parity::Odd),
            entry(Outcome::Win, Parity::Odd),
            entry(Outcome::Win, Parity::Even),
            entry(Outcome::Loss, Parity::Even),
        ];
        assert_eq!(strategy.choose("g", &history, &PlayerStats::default()), Parity::Odd);
    }

    #[test]
    fn test_biased_extremes() {
        let stats = PlayerStats::default();
        let mut always = BiasedRandomStrategy::new(1.5);
        let mut never = BiasedRandomStrategy::new(-1.0);
        for _ in 0..20 {
            assert_eq!(always.choose("g", &[], &stats), Parity::Even);
            assert_eq!(never.choose("g", &[], &stats), Parity::Odd);
        }
        assert_eq!(BiasedRandomStrategy::new(0.7).name(), "biased_random_70");
    }

    #[test]
    fn test_registry_builtin_names() {
        let registry = StrategyRegistry::builtin();
        for name in [
            "random",
            "always_even",
            "always_odd",
            "deterministic",
            "alternating",
            "adaptive",
            "counter",
            "biased_random_70",
            "biased_random_30",
        ] {
            let strategy = registry.create(name).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn test_registry_unknown_lists_available() {
        let registry = StrategyRegistry::builtin();
        let err = registry.create("psychic").err().unwrap();
        match err {
            CoreError::UnknownStrategy { name, available } => {
                assert_eq!(name, "psychic");
                assert!(available.contains("deterministic"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_registry_external_registration() {
        struct Contrarian;
        impl ParityStrategy for Contrarian {
            fn choose(&mut self, game_id: &str, _h: &[HistoryEntry], _s: &PlayerStats) -> Parity {
                deterministic_parity(game_id).flip()
            }
            fn name(&self) -> &str {
                "contrarian"
            }
        }

        let mut registry = StrategyRegistry::builtin();
        registry.register("contrarian", || Box::new(Contrarian));
        let mut strategy = registry.create("contrarian").unwrap();
        assert_eq!(
            strategy.choose("g1", &[], &PlayerStats::default()),
            deterministic_parity("g1").flip()
        );
    }

    #[test]
    fn test_seeded_random_reproducible() {
        let stats = PlayerStats::default();
        let mut a = RandomStrategy::with_seed(42);
        let mut b = RandomStrategy::with_seed(42);
        for i in 0..16 {
            let id = format!("g{}", i);
            assert_eq!(a.choose(&id, &[], &stats), b.choose(&id, &[], &stats));
        }
    }
}
