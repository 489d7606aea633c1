//! Puzzle engine
//!
//! Owns the cubie state, the turn executor, the pending move queue and the
//! history. The host calls `tick`/`update` from its frame loop; moves that
//! arrive while a turn is animating are queued and chained automatically.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::history::{History, HistoryEvent, SubscriptionId};
use super::notation::Move;
use super::scramble::generate_scramble;
use super::state::CubeState;
use super::turn::{TurnExecutor, TurnProgress};
use crate::consts::MAX_FRAME_DT;
use crate::error::CubeError;
use crate::settings::EngineSettings;

/// Who asked for a move; decides its effect on history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveSource {
    /// Recorded in history when it completes
    #[default]
    User,
    Undo,
    Redo,
    Reset,
}

/// Runs once the last move of a batch has finished
pub type BatchCallback = Box<dyn FnOnce(&mut History)>;

/// Per-move execution options
#[derive(Default)]
pub struct RotateOptions {
    pub source: MoveSource,
    /// Marks the final move of a batch
    pub last_of_batch: bool,
    /// Called after the final move of a batch completes
    pub on_batch_done: Option<BatchCallback>,
}

impl RotateOptions {
    pub fn from_source(source: MoveSource) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Mark as the last move of a batch, running `on_done` once it completes
    pub fn finishing_batch(mut self, on_done: impl FnOnce(&mut History) + 'static) -> Self {
        self.last_of_batch = true;
        self.on_batch_done = Some(Box::new(on_done));
        self
    }
}

impl std::fmt::Debug for RotateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotateOptions")
            .field("source", &self.source)
            .field("last_of_batch", &self.last_of_batch)
            .field("on_batch_done", &self.on_batch_done.is_some())
            .finish()
    }
}

/// A move waiting to run, or running, with its options
#[derive(Debug)]
struct QueuedMove {
    mv: Move,
    options: RotateOptions,
}

/// Listener called with each move as its turn completes
pub type MoveEndListener = Box<dyn FnMut(Move)>;

/// The puzzle engine handed to the presentation layer
pub struct CubeEngine {
    settings: EngineSettings,
    cube: CubeState,
    executor: TurnExecutor<QueuedMove>,
    /// Moves submitted while a turn was active (FIFO)
    queue: VecDeque<QueuedMove>,
    history: History,
    /// Scramble RNG
    rng: Pcg32,
    on_move_end: Option<MoveEndListener>,
    /// Unsimulated frame time (seconds)
    accumulator: f32,
    /// Simulation tick counter
    time_ticks: u64,
}

impl CubeEngine {
    /// Create a solved puzzle with default settings
    pub fn new(seed: u64) -> Self {
        Self::build(EngineSettings::default(), seed)
    }

    /// Create a solved puzzle with custom settings
    pub fn with_settings(settings: EngineSettings, seed: u64) -> Result<Self, CubeError> {
        settings.validate()?;
        Ok(Self::build(settings, seed))
    }

    fn build(settings: EngineSettings, seed: u64) -> Self {
        Self {
            executor: TurnExecutor::new(settings.max_angular_speed, settings.completion_epsilon),
            settings,
            cube: CubeState::new(),
            queue: VecDeque::new(),
            history: History::new(),
            rng: Pcg32::seed_from_u64(seed),
            on_move_end: None,
            accumulator: 0.0,
            time_ticks: 0,
        }
    }

    // === Collaborator operations ===

    /// Parse and run a move token, e.g. `"R'"`
    pub fn rotate(&mut self, token: &str, options: RotateOptions) -> Result<(), CubeError> {
        let mv = token.parse::<Move>()?;
        self.execute(mv, options);
        Ok(())
    }

    /// Start a move, or queue it behind the active turn
    pub fn execute(&mut self, mv: Move, options: RotateOptions) {
        let entry = QueuedMove { mv, options };
        match self.executor.start(&self.cube, mv.rotation(), entry) {
            Ok(()) => log::debug!("Turn {mv} started ({:?})", self.current_source()),
            Err(entry) => {
                log::debug!("Turn {mv} queued behind active turn");
                self.queue.push_back(entry);
            }
        }
    }

    /// Enqueue `n` random user moves; returns the generated sequence
    pub fn scramble(&mut self, n: usize) -> Vec<Move> {
        let moves = generate_scramble(&mut self.rng, n);
        log::info!(
            "Scramble: {}",
            moves.iter().map(Move::to_string).collect::<Vec<_>>().join(" ")
        );
        for &mv in &moves {
            self.execute(mv, RotateOptions::default());
        }
        moves
    }

    /// Scramble with the configured default length
    pub fn scramble_default(&mut self) -> Vec<Move> {
        self.scramble(self.settings.scramble_length)
    }

    /// Animate back to solved by replaying the inverse of the history
    ///
    /// History is cleared once the last inverse move completes. Returns
    /// `false` if there is nothing to undo or a reset is already running.
    pub fn reset(&mut self) -> bool {
        if self.reset_pending() {
            log::debug!("Reset ignored: previous reset still running");
            return false;
        }
        let sequence = self.history.inverse_sequence();
        let Some(last) = sequence.len().checked_sub(1) else {
            return false;
        };
        log::info!("Reset: replaying {} inverse moves", sequence.len());

        for (i, mv) in sequence.into_iter().enumerate() {
            let options = RotateOptions::from_source(MoveSource::Reset);
            let options = if i == last {
                options.finishing_batch(|history| {
                    history.clear();
                    log::info!("Reset finished");
                })
            } else {
                options
            };
            self.execute(mv, options);
        }
        true
    }

    /// Undo the last user move; no-op while a turn is active
    pub fn undo(&mut self) -> bool {
        if self.executor.is_active() {
            return false;
        }
        let Some(mv) = self.history.pop_for_undo() else {
            return false;
        };
        self.execute(mv.inverse(), RotateOptions::from_source(MoveSource::Undo));
        true
    }

    /// Replay the last undone move; no-op while a turn is active
    pub fn redo(&mut self) -> bool {
        if self.executor.is_active() {
            return false;
        }
        // Pushed back onto `done` before animating, so a second redo sees it
        let Some(mv) = self.history.pop_for_redo() else {
            return false;
        };
        self.execute(mv, RotateOptions::from_source(MoveSource::Redo));
        true
    }

    /// Whether every cubie is in its solved position and orientation
    pub fn is_solved(&self) -> bool {
        self.cube.is_solved(self.settings.orientation_tolerance)
    }

    /// Set or clear the listener called after every completed turn
    pub fn set_on_move_end(&mut self, listener: Option<MoveEndListener>) {
        self.on_move_end = listener;
    }

    /// Subscribe to history changes
    pub fn subscribe_history(&mut self, listener: impl FnMut(&HistoryEvent) + 'static) -> SubscriptionId {
        self.history.subscribe(listener)
    }

    pub fn unsubscribe_history(&mut self, id: SubscriptionId) -> bool {
        self.history.unsubscribe(id)
    }

    // === Driving ===

    /// Advance the active turn by one step of `dt` seconds
    ///
    /// Returns the move that completed during this step, if any.
    pub fn tick(&mut self, dt: f32) -> Option<Move> {
        if !self.executor.is_active() {
            return None;
        }
        if !(dt > 0.0 && dt.is_finite()) {
            log::warn!("Ignoring tick with invalid dt {dt}");
            return None;
        }
        self.time_ticks += 1;
        let finished = self.executor.tick(&mut self.cube, dt)?;
        let mv = finished.mv;
        self.finish(finished);
        Some(mv)
    }

    /// Advance by a variable frame time using fixed steps
    ///
    /// Returns the number of steps run.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        let step = self.settings.tick_dt;
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= step && substeps < self.settings.max_substeps {
            self.tick(step);
            self.accumulator -= step;
            substeps += 1;
        }
        // Drop backlog beyond the substep cap
        self.accumulator = self.accumulator.min(step);
        substeps
    }

    /// Tick until every active and queued move has completed
    ///
    /// Returns the number of steps run.
    pub fn settle(&mut self) -> u64 {
        let mut ticks = 0;
        while self.is_busy() {
            self.tick(self.settings.tick_dt);
            ticks += 1;
        }
        ticks
    }

    fn finish(&mut self, finished: QueuedMove) {
        let QueuedMove { mv, options } = finished;
        log::debug!("Turn {mv} finished ({:?})", options.source);

        if options.source == MoveSource::User {
            self.history.record(mv);
        }

        if let Some(listener) = self.on_move_end.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| listener(mv))).is_err() {
                log::warn!("Move-end listener panicked after {mv}");
            }
        }

        if options.last_of_batch {
            if let Some(on_done) = options.on_batch_done {
                let history = &mut self.history;
                if catch_unwind(AssertUnwindSafe(|| on_done(history))).is_err() {
                    log::warn!("Batch completion callback panicked after {mv}");
                }
            }
        }

        if let Some(next) = self.queue.pop_front() {
            self.execute(next.mv, next.options);
        }
    }

    /// Whether a reset batch is animating or waiting in the queue
    fn reset_pending(&self) -> bool {
        self.current_source() == Some(MoveSource::Reset)
            || self.queue.iter().any(|entry| entry.options.source == MoveSource::Reset)
    }

    fn current_source(&self) -> Option<MoveSource> {
        self.executor.active().map(|turn| turn.completion().options.source)
    }

    // === Read-only views ===

    pub fn cube(&self) -> &CubeState {
        &self.cube
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Number of user moves currently applied
    pub fn step_count(&self) -> usize {
        self.history.step_count()
    }

    /// Whether a turn is animating
    pub fn is_turning(&self) -> bool {
        self.executor.is_active()
    }

    /// Whether a turn is animating or moves are waiting
    pub fn is_busy(&self) -> bool {
        self.executor.is_active() || !self.queue.is_empty()
    }

    /// Moves waiting behind the active turn
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Axis, layer and progress of the active turn
    pub fn current_turn(&self) -> Option<TurnProgress> {
        self.executor.progress()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRID, SIM_DT};
    use crate::sim::notation::Axis;
    use glam::{IVec3, Vec3};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mv(token: &str) -> Move {
        token.parse().unwrap()
    }

    fn user(engine: &mut CubeEngine, tokens: &[&str]) {
        for token in tokens {
            engine.rotate(token, RotateOptions::default()).unwrap();
        }
        engine.settle();
    }

    /// Grid position plus rotated X/Y axes of every cubie
    fn snapshot(engine: &CubeEngine) -> Vec<(IVec3, IVec3, IVec3)> {
        engine
            .cube()
            .cubies()
            .iter()
            .map(|c| {
                (
                    c.grid_position(),
                    (c.orientation * Vec3::X).round().as_ivec3(),
                    (c.orientation * Vec3::Y).round().as_ivec3(),
                )
            })
            .collect()
    }

    #[test]
    fn test_fresh_engine_is_solved() {
        let engine = CubeEngine::new(1);
        assert!(engine.is_solved());
        assert!(!engine.is_busy());
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_invalid_token_is_reported() {
        let mut engine = CubeEngine::new(1);
        let err = engine.rotate("X2", RotateOptions::default()).unwrap_err();
        assert!(matches!(err, CubeError::InvalidMoveToken(_)));
        assert!(!engine.is_busy());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = EngineSettings {
            tick_dt: 0.0,
            ..Default::default()
        };
        assert!(CubeEngine::with_settings(settings, 1).is_err());
    }

    #[test]
    fn test_moves_queue_while_turning() {
        let mut engine = CubeEngine::new(1);
        for token in ["R", "U", "F"] {
            engine.rotate(token, RotateOptions::default()).unwrap();
        }
        assert!(engine.is_turning());
        assert_eq!(engine.queued_len(), 2);

        engine.settle();
        assert_eq!(engine.queued_len(), 0);
        assert_eq!(engine.history().done(), &[mv("R"), mv("U"), mv("F")]);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["R"]);
        let after_r = snapshot(&engine);
        assert!(!engine.is_solved());

        assert!(engine.undo());
        engine.settle();
        assert!(engine.is_solved());
        assert_eq!(engine.step_count(), 0);
        assert_eq!(engine.history().redo_stack(), &[mv("R")]);

        assert!(engine.redo());
        // Recorded before the animation finishes
        assert_eq!(engine.step_count(), 1);
        engine.settle();
        assert!(!engine.is_solved());
        assert_eq!(snapshot(&engine), after_r);
        assert!(!engine.history().can_redo());
    }

    #[test]
    fn test_undo_redo_noop_cases() {
        let mut engine = CubeEngine::new(1);
        assert!(!engine.undo());
        assert!(!engine.redo());

        user(&mut engine, &["F"]);
        engine.rotate("U", RotateOptions::default()).unwrap();
        assert!(engine.is_turning());
        assert!(!engine.undo());
        assert_eq!(engine.step_count(), 1);

        engine.settle();
        assert!(engine.undo());
        assert!(!engine.redo());
    }

    #[test]
    fn test_new_user_move_clears_redo() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["R", "U"]);
        engine.undo();
        engine.settle();
        assert!(engine.history().can_redo());

        user(&mut engine, &["L"]);
        assert!(!engine.history().can_redo());
        assert_eq!(engine.history().done(), &[mv("R"), mv("L")]);
    }

    #[test]
    fn test_non_user_sources_skip_history() {
        let mut engine = CubeEngine::new(1);
        for source in [MoveSource::Undo, MoveSource::Redo, MoveSource::Reset] {
            engine.rotate("D", RotateOptions::from_source(source)).unwrap();
        }
        engine.settle();
        assert_eq!(engine.step_count(), 0);
        assert!(!engine.is_solved());
    }

    #[test]
    fn test_u_u2_uprime_nets_to_half_turn() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["U", "U2", "U'"]);
        assert!(!engine.is_solved());

        // -pi/2 - pi + pi/2 leaves a single half turn
        let mut reference = CubeEngine::new(1);
        user(&mut reference, &["U2"]);
        assert_eq!(snapshot(&engine), snapshot(&reference));

        assert!(engine.reset());
        engine.settle();
        assert!(engine.is_solved());
        assert!(engine.history().done().is_empty());
        assert!(engine.history().redo_stack().is_empty());
    }

    #[test]
    fn test_reset_clears_redo() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["R", "F'", "B2"]);
        engine.undo();
        engine.settle();
        assert!(engine.history().can_redo());

        engine.reset();
        // History stays until the batch has finished animating
        assert_eq!(engine.step_count(), 2);
        engine.settle();
        assert!(engine.is_solved());
        assert_eq!(engine.step_count(), 0);
        assert!(!engine.history().can_redo());
    }

    #[test]
    fn test_second_reset_while_resetting_is_ignored() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["R", "U"]);
        assert!(engine.reset());
        assert!(!engine.reset());
        engine.tick(SIM_DT);
        assert!(!engine.reset());

        engine.settle();
        assert!(engine.is_solved());
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_reset_allowed_while_user_move_turning() {
        let mut engine = CubeEngine::new(1);
        user(&mut engine, &["R"]);
        engine.rotate("U", RotateOptions::default()).unwrap();
        assert!(engine.is_turning());
        assert!(engine.reset());
        engine.settle();
        // The batch clear also drops the move that finished mid-reset
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_invalid_tick_dt_is_ignored() {
        let mut engine = CubeEngine::new(1);
        engine.rotate("R", RotateOptions::default()).unwrap();
        for dt in [f32::NAN, -SIM_DT, 0.0, f32::INFINITY] {
            assert!(engine.tick(dt).is_none());
            assert!(engine.is_turning());
            assert_eq!(engine.current_turn().unwrap().progress, 0.0);
        }
        assert_eq!(engine.time_ticks(), 0);

        engine.settle();
        assert_eq!(engine.step_count(), 1);
        for cubie in engine.cube().cubies() {
            assert!(cubie.position.is_finite());
        }
    }

    #[test]
    fn test_reset_without_history_is_noop() {
        let mut engine = CubeEngine::new(1);
        assert!(!engine.reset());
        assert!(!engine.is_busy());
    }

    #[test]
    fn test_scramble_records_history() {
        let mut engine = CubeEngine::new(2024);
        let moves = engine.scramble(25);
        assert_eq!(moves.len(), 25);
        for pair in moves.windows(2) {
            assert_ne!(pair[0].face, pair[1].face);
        }

        engine.settle();
        assert_eq!(engine.step_count(), 25);
        assert_eq!(engine.history().done(), moves.as_slice());
        assert!(!engine.is_solved());

        engine.reset();
        engine.settle();
        assert!(engine.is_solved());
    }

    #[test]
    fn test_scramble_is_seeded() {
        let a = CubeEngine::new(7).scramble_default();
        let b = CubeEngine::new(7).scramble_default();
        assert_eq!(a.len(), 25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_move_end_sees_every_move() {
        let mut engine = CubeEngine::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.set_on_move_end(Some(Box::new(move |m: Move| sink.borrow_mut().push(m))));

        user(&mut engine, &["R", "U'"]);
        engine.undo();
        engine.settle();
        assert_eq!(*seen.borrow(), vec![mv("R"), mv("U'"), mv("U")]);

        engine.set_on_move_end(None);
        user(&mut engine, &["F"]);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_panicking_move_end_keeps_sequencing() {
        let mut engine = CubeEngine::new(1);
        engine.set_on_move_end(Some(Box::new(|_: Move| panic!("celebration failed"))));
        user(&mut engine, &["R", "R", "R", "R"]);
        assert_eq!(engine.step_count(), 4);
        assert!(engine.is_solved());
    }

    #[test]
    fn test_batch_callback_runs_after_last_move() {
        let mut engine = CubeEngine::new(1);
        let fired = Rc::new(RefCell::new(None));
        let flag = fired.clone();
        engine.rotate("F", RotateOptions::default()).unwrap();
        engine
            .rotate(
                "B",
                RotateOptions::default().finishing_batch(move |history| {
                    *flag.borrow_mut() = Some(history.step_count());
                }),
            )
            .unwrap();

        engine.tick(SIM_DT);
        assert!(fired.borrow().is_none());
        engine.settle();
        // Runs after the last move was recorded
        assert_eq!(*fired.borrow(), Some(2));
    }

    #[test]
    fn test_history_events_count_steps() {
        let mut engine = CubeEngine::new(3);
        let steps = Rc::new(RefCell::new(Vec::new()));
        let sink = steps.clone();
        engine.subscribe_history(move |event| {
            if let HistoryEvent::UserMoveApplied { step_count, .. } = event {
                sink.borrow_mut().push(*step_count);
            }
        });
        engine.scramble(5);
        engine.settle();
        assert_eq!(*steps.borrow(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_layers_stay_complete_after_each_turn() {
        let mut engine = CubeEngine::new(99);
        engine.scramble(12);
        let mut completed = 0;
        while engine.is_busy() {
            if engine.tick(SIM_DT).is_some() {
                completed += 1;
                for axis in Axis::ALL {
                    for layer in GRID {
                        assert_eq!(engine.cube().select_layer(axis, layer).len(), 9);
                    }
                }
            }
        }
        assert_eq!(completed, 12);
    }

    #[test]
    fn test_update_respects_substep_cap() {
        let mut engine = CubeEngine::new(1);
        engine.rotate("R2", RotateOptions::default()).unwrap();
        let steps = engine.update(10.0);
        assert!(steps >= 1 && steps <= engine.settings().max_substeps);
        assert!(engine.is_turning());
    }

    #[test]
    fn test_update_accumulates_short_frames() {
        let mut engine = CubeEngine::new(1);
        engine.rotate("R", RotateOptions::default()).unwrap();
        let step = engine.settings().tick_dt;
        assert_eq!(engine.update(step * 0.4), 0);
        assert_eq!(engine.update(step * 0.4), 0);
        assert_eq!(engine.update(step * 0.4), 1);
        assert_eq!(engine.time_ticks(), 1);
    }

    #[test]
    fn test_current_turn_progress() {
        let mut engine = CubeEngine::new(1);
        assert!(engine.current_turn().is_none());
        engine.rotate("L", RotateOptions::default()).unwrap();
        engine.tick(SIM_DT);
        let turn = engine.current_turn().unwrap();
        assert_eq!(turn.axis, Axis::X);
        assert_eq!(turn.layer, -1);
        assert!(turn.progress > 0.0);
    }

    fn any_move() -> impl Strategy<Value = Move> {
        prop::sample::select(Move::all().collect::<Vec<_>>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(36))]

        #[test]
        fn prop_move_then_inverse_is_solved(m in any_move()) {
            let mut engine = CubeEngine::new(0);
            engine.execute(m, RotateOptions::default());
            engine.execute(m.inverse(), RotateOptions::default());
            engine.settle();
            prop_assert!(engine.is_solved());
        }

        #[test]
        fn prop_undo_restores_solved(m in any_move()) {
            let mut engine = CubeEngine::new(0);
            engine.execute(m, RotateOptions::default());
            engine.settle();
            prop_assert!(engine.undo());
            engine.settle();
            prop_assert!(engine.is_solved());
        }

        #[test]
        fn prop_reset_after_any_sequence(moves in prop::collection::vec(any_move(), 1..15)) {
            let mut engine = CubeEngine::new(0);
            for &m in &moves {
                engine.execute(m, RotateOptions::default());
            }
            engine.settle();
            prop_assert_eq!(engine.step_count(), moves.len());
            prop_assert!(engine.reset());
            engine.settle();
            prop_assert!(engine.is_solved());
            prop_assert!(engine.history().done().is_empty());
            prop_assert!(engine.history().redo_stack().is_empty());
        }
    }
}
