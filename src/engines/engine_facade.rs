//! The engine handle callers own.
//!
//! `BlindfoldEngine` keeps at most one analysis in flight. Registering a new
//! request completes the previous one with [`EngineError::Cancelled`]; the
//! superseded worker still finishes its bounded selection, and its result is
//! dropped. Selection runs on Tokio's blocking pool, the simulated think time
//! on the timer, and a timeout guards every request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engines::confidence::ConfidenceEstimator;
use crate::engines::engine_trait::MoveResult;
use crate::engines::move_selector::MoveSelector;
use crate::engines::time_management::{ThinkTimeConfig, ThinkTimeSimulator};
use crate::errors::{EngineError, EngineResult};
use crate::game_state::chess_types::BestMove;
use crate::levels::level_catalog::{EngineLevel, LevelCatalog, LevelSummary};
use crate::oracle::position_oracle::PositionOracle;
use crate::oracle::shakmaty_oracle::ShakmatyOracle;
use crate::search::board_scoring::{WeightedEvaluation, MATE_SCORE};
use crate::search::tactical_scanner::ScanLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub think_time: ThinkTimeConfig,
    /// Added to a tier's time budget to form the request timeout.
    pub timeout_grace: Duration,
    /// Seeds every request's RNG (offset by the request id) when set.
    pub seed: Option<u64>,
    pub scan_limits: ScanLimits,
}

impl EngineConfig {
    /// Default settings without simulated think time.
    pub fn instant() -> Self {
        Self {
            think_time: ThinkTimeConfig::INSTANT,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            think_time: ThinkTimeConfig::default(),
            timeout_grace: Duration::from_secs(5),
            seed: None,
            scan_limits: ScanLimits::default(),
        }
    }
}

struct Lifecycle {
    state: EngineState,
    runtime: Option<Handle>,
}

struct PendingAnalysis {
    id: u64,
    level_key: &'static str,
    completion: oneshot::Sender<EngineResult<MoveResult>>,
}

struct Shared<O: PositionOracle> {
    oracle: O,
    catalog: Arc<LevelCatalog>,
    config: EngineConfig,
    evaluation: WeightedEvaluation,
    confidence: ConfidenceEstimator,
    think_time: ThinkTimeSimulator,
    lifecycle: Mutex<Lifecycle>,
    pending: Mutex<Option<PendingAnalysis>>,
    next_request: AtomicU64,
}

struct Registration<O: PositionOracle> {
    id: u64,
    level: EngineLevel,
    receiver: oneshot::Receiver<EngineResult<MoveResult>>,
    shared: Arc<Shared<O>>,
}

pub struct BlindfoldEngine<O: PositionOracle = ShakmatyOracle> {
    shared: Arc<Shared<O>>,
}

impl<O: PositionOracle> Clone for BlindfoldEngine<O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl BlindfoldEngine<ShakmatyOracle> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_oracle(ShakmatyOracle, Arc::new(LevelCatalog::standard()), config)
    }
}

impl Default for BlindfoldEngine<ShakmatyOracle> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: PositionOracle> BlindfoldEngine<O> {
    pub fn with_oracle(oracle: O, catalog: Arc<LevelCatalog>, config: EngineConfig) -> Self {
        let confidence = ConfidenceEstimator::from_catalog(&catalog);
        Self {
            shared: Arc::new(Shared {
                oracle,
                catalog,
                config,
                evaluation: WeightedEvaluation::standard(),
                confidence,
                think_time: ThinkTimeSimulator::new(config.think_time),
                lifecycle: Mutex::new(Lifecycle {
                    state: EngineState::Uninitialized,
                    runtime: None,
                }),
                pending: Mutex::new(None),
                next_request: AtomicU64::new(0),
            }),
        }
    }

    /// Moves the engine to `Ready`, binding it to the current Tokio runtime.
    /// Calling it again while initializing or ready does nothing.
    pub async fn initialize(&self) -> EngineResult<()> {
        {
            let mut lifecycle = self.shared.lifecycle.lock();
            match lifecycle.state {
                EngineState::Ready | EngineState::Initializing => return Ok(()),
                EngineState::Destroyed => return Err(EngineError::EngineDestroyed),
                EngineState::Uninitialized => lifecycle.state = EngineState::Initializing,
            }
        }
        debug!("engine initializing");
        tokio::task::yield_now().await;

        let runtime = Handle::current();
        let mut lifecycle = self.shared.lifecycle.lock();
        if lifecycle.state == EngineState::Destroyed {
            return Err(EngineError::EngineDestroyed);
        }
        lifecycle.state = EngineState::Ready;
        lifecycle.runtime = Some(runtime);
        info!(levels = self.shared.catalog.levels().len(), "engine ready");
        Ok(())
    }

    /// Schedules a move choice for `position` at tier `level_key`.
    ///
    /// The request is registered before this returns, so a later call
    /// cancels it even if the returned future was never polled.
    pub fn analyze(
        &self,
        position: &str,
        level_key: &str,
    ) -> impl Future<Output = EngineResult<MoveResult>> + Send + 'static {
        let registration = self.register(position, level_key);
        async move {
            let Registration {
                id,
                level,
                receiver,
                shared,
            } = registration?;
            let deadline = shared.deadline(&level);
            match tokio::time::timeout(deadline, receiver).await {
                Ok(Ok(result)) => result,
                // The sender is only dropped without sending when the slot
                // was abandoned or replaced.
                Ok(Err(_)) => Err(EngineError::Cancelled),
                Err(_) => {
                    shared.abandon(id);
                    warn!(request = id, level = level.key, ?deadline, "analysis timed out");
                    Err(EngineError::TimedOut {
                        level: level.key.to_owned(),
                        budget_ms: level.time_budget_ms,
                    })
                }
            }
        }
    }

    fn register(&self, position: &str, level_key: &str) -> EngineResult<Registration<O>> {
        let lifecycle = self.shared.lifecycle.lock();
        let runtime = match (lifecycle.state, &lifecycle.runtime) {
            (EngineState::Ready, Some(runtime)) => runtime.clone(),
            _ => return Err(EngineError::EngineNotReady),
        };
        let level = *self.shared.catalog.get(level_key)?;
        let id = self.shared.next_request.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();
        let (sender, receiver) = oneshot::channel();

        let previous = self.shared.pending.lock().replace(PendingAnalysis {
            id,
            level_key: level.key,
            completion: sender,
        });
        drop(lifecycle);

        if let Some(previous) = previous {
            debug!(request = previous.id, level = previous.level_key, "analysis superseded");
            if previous.completion.send(Err(EngineError::Cancelled)).is_err() {
                debug!(request = previous.id, "superseded caller already gone");
            }
        }
        debug!(request = id, level = level.key, "analysis registered");

        let shared = Arc::clone(&self.shared);
        let encoded = position.to_owned();
        runtime.spawn(Arc::clone(&shared).run(id, level, encoded, started));

        Ok(Registration {
            id,
            level,
            receiver,
            shared,
        })
    }

    /// Completes any pending analysis with `EngineDestroyed`. The engine
    /// cannot be initialized again.
    pub fn destroy(&self) {
        let pending = {
            let mut lifecycle = self.shared.lifecycle.lock();
            if lifecycle.state == EngineState::Destroyed {
                return;
            }
            lifecycle.state = EngineState::Destroyed;
            lifecycle.runtime = None;
            self.shared.pending.lock().take()
        };
        if let Some(pending) = pending {
            debug!(request = pending.id, level = pending.level_key, "failing pending analysis");
            if pending.completion.send(Err(EngineError::EngineDestroyed)).is_err() {
                debug!(request = pending.id, "pending caller already gone");
            }
        }
        info!("engine destroyed");
    }

    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    pub fn state(&self) -> EngineState {
        self.shared.lifecycle.lock().state
    }

    /// One-line description of a tier, or `"Level not found"`.
    pub fn get_level_info(&self, level_key: &str) -> String {
        self.shared.catalog.describe(level_key)
    }

    pub fn get_all_levels(&self) -> Vec<LevelSummary> {
        self.shared.catalog.list_all()
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.shared.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

impl<O: PositionOracle> Shared<O> {
    fn deadline(&self, level: &EngineLevel) -> Duration {
        Duration::from_millis(level.time_budget_ms).max(self.think_time.minimum_completion(level))
            + self.config.timeout_grace
    }

    fn is_current(&self, id: u64) -> bool {
        self.pending.lock().as_ref().is_some_and(|p| p.id == id)
    }

    fn take_if_current(&self, id: u64) -> Option<PendingAnalysis> {
        let mut slot = self.pending.lock();
        if slot.as_ref().is_some_and(|p| p.id == id) {
            slot.take()
        } else {
            None
        }
    }

    fn abandon(&self, id: u64) {
        if self.take_if_current(id).is_some() {
            debug!(request = id, "pending slot cleared");
        }
    }

    fn complete(&self, id: u64, outcome: EngineResult<MoveResult>) {
        match self.take_if_current(id) {
            Some(pending) => {
                if pending.completion.send(outcome).is_err() {
                    debug!(request = id, "caller dropped the analysis future");
                }
            }
            None => debug!(request = id, "discarding superseded result"),
        }
    }

    /// `started` is the registration instant; think time and `elapsed` both
    /// count from it.
    async fn run(self: Arc<Self>, id: u64, level: EngineLevel, encoded: String, started: Instant) {
        if !self.is_current(id) {
            debug!(request = id, "skipping superseded analysis");
            return;
        }
        let worker = Arc::clone(&self);
        let outcome = tokio::task::spawn_blocking(move || worker.select(id, &level, &encoded))
            .await
            .unwrap_or_else(|err| Err(EngineError::Worker(err.to_string())));

        let outcome = match outcome {
            Ok(mut result) => {
                self.think_time.deliberate(&level, started).await;
                result.elapsed = started.elapsed();
                Ok(result)
            }
            Err(err) => Err(err),
        };
        self.complete(id, outcome);
    }

    fn select(&self, id: u64, level: &EngineLevel, encoded: &str) -> EngineResult<MoveResult> {
        let position = self.oracle.load_position(encoded)?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id)),
            None => StdRng::from_os_rng(),
        };
        let selector = MoveSelector::new(&self.oracle, &self.evaluation, self.config.scan_limits);

        let Some(selection) = selector.select(&position, level, &mut rng)? else {
            let evaluation = if self.oracle.is_checkmate(&position) {
                -MATE_SCORE
            } else {
                0
            };
            debug!(request = id, level = level.key, "no legal moves");
            return Ok(MoveResult {
                best_move: BestMove::None,
                notation: None,
                level: level.key,
                rating: level.rating,
                depth: 0,
                elapsed: Duration::ZERO,
                confidence: 0.0,
                evaluation: Some(evaluation),
                principal_variation: None,
                strategy: None,
            });
        };

        let pick = selection.pick;
        info!(
            request = id,
            level = level.key,
            strategy = selection.tactic.name(),
            mv = %pick.mv.uci(),
            "move selected"
        );
        Ok(MoveResult {
            best_move: pick.mv.best_move(),
            notation: Some(pick.mv.notation.clone()),
            level: level.key,
            rating: level.rating,
            depth: pick.depth.unwrap_or(level.depth),
            elapsed: Duration::ZERO,
            confidence: self.confidence.estimate(level),
            evaluation: pick.evaluation,
            principal_variation: pick.principal_variation,
            strategy: Some(selection.tactic.name()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::levels::level_catalog::LEVEL_NOT_FOUND;
    use crate::oracle::position_oracle::CandidateMove;
    use crate::game_state::chess_types::{Color, Piece, Square};
    use shakmaty::Chess;

    const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";
    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

    async fn ready_engine() -> BlindfoldEngine {
        let engine = BlindfoldEngine::with_config(EngineConfig::instant().with_seed(42));
        engine.initialize().await.expect("initializes");
        engine
    }

    #[tokio::test]
    async fn grandmaster_finds_back_rank_mate() {
        let engine = ready_engine().await;
        for fen in [BACK_RANK, "6k1/5ppp/8/8/8/8/5PPP/R5K1"] {
            let result = engine.analyze(fen, "grandmaster").await.expect("analysis succeeds");
            assert_eq!(result.best_move.to_uci(), "a1a8");
            assert!(result.confidence > 0.8);
            assert_eq!(result.depth, 1);
            assert_eq!(result.strategy, Some("mate_search"));
            assert_eq!(result.notation.as_deref(), Some("Ra8"));
        }
    }

    #[tokio::test]
    async fn unknown_level_is_a_configuration_error() {
        let engine = ready_engine().await;
        let err = engine.analyze("startpos", "world-champion").await.unwrap_err();
        assert_eq!(err, EngineError::UnknownLevel("world-champion".into()));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[tokio::test]
    async fn invalid_position_is_reported() {
        let engine = ready_engine().await;
        let err = engine.analyze("not a position", "beginner").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPosition { .. }));
    }

    #[tokio::test]
    async fn checkmate_and_stalemate_yield_the_sentinel() {
        let engine = ready_engine().await;
        let mated = engine.analyze(FOOLS_MATE, "master").await.expect("completes");
        assert!(mated.is_none());
        assert_eq!(mated.best_move.to_string(), "none");
        assert_eq!(mated.confidence, 0.0);
        assert_eq!(mated.evaluation, Some(-MATE_SCORE));

        let stalemate = engine.analyze(STALEMATE, "beginner").await.expect("completes");
        assert!(stalemate.is_none());
        assert_eq!(stalemate.confidence, 0.0);
        assert_eq!(stalemate.evaluation, Some(0));
    }

    #[tokio::test]
    async fn analysis_requires_initialization() {
        let engine = BlindfoldEngine::with_config(EngineConfig::instant());
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(!engine.is_ready());
        let err = engine.analyze("startpos", "beginner").await.unwrap_err();
        assert_eq!(err, EngineError::EngineNotReady);
        assert_eq!(err.category(), ErrorCategory::State);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let engine = ready_engine().await;
        engine.initialize().await.expect("second call is a no-op");
        assert!(engine.is_ready());
    }

    #[tokio::test]
    async fn latest_request_wins() {
        let engine = BlindfoldEngine::with_config(EngineConfig {
            think_time: ThinkTimeConfig {
                floor: Duration::from_millis(300),
                ..ThinkTimeConfig::INSTANT
            },
            ..EngineConfig::default()
        });
        engine.initialize().await.expect("initializes");
        let first = engine.analyze("startpos", "beginner");
        let second = engine.analyze("startpos", "grandmaster");
        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap_err(), EngineError::Cancelled);
        let second = second.expect("latest request completes");
        assert_eq!(second.level, "grandmaster");
        assert!(second.elapsed >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn think_time_counts_from_registration() {
        let engine = BlindfoldEngine::with_config(EngineConfig {
            think_time: ThinkTimeConfig {
                floor: Duration::from_millis(300),
                ..ThinkTimeConfig::INSTANT
            },
            ..EngineConfig::default()
        });
        engine.initialize().await.expect("initializes");
        let requested = std::time::Instant::now();
        let pending = engine.analyze("startpos", "beginner");
        // The worker cannot start while this thread holds the runtime.
        std::thread::sleep(Duration::from_millis(200));
        let result = pending.await.expect("completes");
        assert!(result.elapsed >= Duration::from_millis(300));
        assert!(result.elapsed <= requested.elapsed());
        assert!(requested.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn destroy_fails_pending_and_blocks_new_work() {
        let engine = ready_engine().await;
        let pending = engine.analyze("startpos", "expert");
        engine.destroy();
        assert_eq!(pending.await.unwrap_err(), EngineError::EngineDestroyed);
        assert!(!engine.is_ready());
        assert_eq!(engine.state(), EngineState::Destroyed);
        assert_eq!(
            engine.analyze("startpos", "expert").await.unwrap_err(),
            EngineError::EngineNotReady
        );
        assert_eq!(engine.initialize().await.unwrap_err(), EngineError::EngineDestroyed);
        // A second destroy is harmless.
        engine.destroy();
    }

    #[tokio::test]
    async fn every_listed_level_has_info() {
        let engine = ready_engine().await;
        let levels = engine.get_all_levels();
        assert_eq!(levels.len(), 10);
        for summary in levels {
            assert_ne!(engine.get_level_info(summary.key), LEVEL_NOT_FOUND);
        }
        assert_eq!(engine.get_level_info("nope"), LEVEL_NOT_FOUND);
    }

    #[tokio::test]
    async fn every_level_returns_a_legal_move() {
        let engine = ready_engine().await;
        let oracle = ShakmatyOracle;
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let legal: Vec<BestMove> = oracle
            .legal_moves(&oracle.load_position(fen).expect("loads"))
            .iter()
            .map(CandidateMove::best_move)
            .collect();
        for summary in engine.get_all_levels() {
            let result = engine.analyze(fen, summary.key).await.expect("completes");
            assert!(legal.contains(&result.best_move), "{}", summary.key);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert_eq!(result.rating, summary.rating);
        }
    }

    /// Oracle whose position loading stalls, to exercise the timeout.
    struct SlowOracle(Duration);

    impl PositionOracle for SlowOracle {
        type Handle = Chess;

        fn load_position(&self, encoded: &str) -> EngineResult<Chess> {
            std::thread::sleep(self.0);
            ShakmatyOracle.load_position(encoded)
        }
        fn encode(&self, position: &Chess) -> String {
            ShakmatyOracle.encode(position)
        }
        fn legal_moves(&self, position: &Chess) -> Vec<CandidateMove> {
            ShakmatyOracle.legal_moves(position)
        }
        fn apply(&self, position: &Chess, mv: &CandidateMove) -> EngineResult<Chess> {
            ShakmatyOracle.apply(position, mv)
        }
        fn is_checkmate(&self, position: &Chess) -> bool {
            ShakmatyOracle.is_checkmate(position)
        }
        fn is_check(&self, position: &Chess) -> bool {
            ShakmatyOracle.is_check(position)
        }
        fn turn_color(&self, position: &Chess) -> Color {
            ShakmatyOracle.turn_color(position)
        }
        fn piece_at(&self, position: &Chess, square: Square) -> Option<Piece> {
            ShakmatyOracle.piece_at(position, square)
        }
    }

    #[tokio::test]
    async fn stalled_oracle_times_out() {
        let config = EngineConfig {
            timeout_grace: Duration::from_millis(20),
            ..EngineConfig::instant()
        };
        let engine = BlindfoldEngine::with_oracle(
            SlowOracle(Duration::from_millis(400)),
            Arc::new(LevelCatalog::standard()),
            config,
        );
        engine.initialize().await.expect("initializes");
        let err = engine.analyze("startpos", "beginner").await.unwrap_err();
        assert_eq!(
            err,
            EngineError::TimedOut {
                level: "beginner".into(),
                budget_ms: 100,
            }
        );
        assert_eq!(err.category(), ErrorCategory::Runtime);
    }
}
