//! Browser handle for the presentation shell
//!
//! The page owns the render loop and calls `update(dt)` once per frame,
//! then reads `transforms()` to place the 27 cubie meshes.

use js_sys::{Float32Array, Function};
use wasm_bindgen::prelude::*;

use crate::settings::EngineSettings;
use crate::sim::{CubeEngine, Move, MoveEndListener, RotateOptions, SubscriptionId};

/// Floats per cubie in `transforms()`: position xyz + quaternion xyzw
const FLOATS_PER_CUBIE: usize = 7;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Cube Sim loaded");
}

/// Engine handle exported to JavaScript
#[wasm_bindgen]
pub struct CubeHandle {
    engine: CubeEngine,
    history_subscription: Option<SubscriptionId>,
    step_subscription: Option<SubscriptionId>,
}

impl Default for CubeHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl CubeHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CubeHandle {
        let seed = js_sys::Date::now() as u64;
        let engine = match CubeEngine::with_settings(EngineSettings::load(), seed) {
            Ok(engine) => engine,
            Err(e) => {
                log::warn!("Falling back to default settings: {e}");
                CubeEngine::new(seed)
            }
        };
        log::info!("Cube engine initialized with seed: {seed}");
        Self {
            engine,
            history_subscription: None,
            step_subscription: None,
        }
    }

    /// Apply one user move, e.g. `"R'"`
    pub fn rotate(&mut self, token: &str) -> Result<(), JsError> {
        self.engine.rotate(token, RotateOptions::default())?;
        Ok(())
    }

    /// Enqueue a random scramble; returns it as space-separated notation
    pub fn scramble(&mut self, n: Option<u32>) -> String {
        let moves = match n {
            Some(n) => self.engine.scramble(n as usize),
            None => self.engine.scramble_default(),
        };
        moves.iter().map(Move::to_string).collect::<Vec<_>>().join(" ")
    }

    pub fn reset(&mut self) -> bool {
        self.engine.reset()
    }

    pub fn undo(&mut self) -> bool {
        self.engine.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.engine.redo()
    }

    #[wasm_bindgen(js_name = isSolved)]
    pub fn is_solved(&self) -> bool {
        self.engine.is_solved()
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    #[wasm_bindgen(js_name = stepCount)]
    pub fn step_count(&self) -> u32 {
        self.engine.step_count() as u32
    }

    /// Register (or clear with `null`) the per-move listener
    #[wasm_bindgen(js_name = onMoveEnd)]
    pub fn on_move_end(&mut self, callback: Option<Function>) {
        let listener = callback.map(|f| -> MoveEndListener {
            Box::new(move |mv: Move| {
                let token = JsValue::from_str(&mv.to_string());
                if let Err(e) = f.call1(&JsValue::NULL, &token) {
                    log::warn!("onMoveEnd callback threw: {e:?}");
                }
            })
        });
        self.engine.set_on_move_end(listener);
    }

    /// Register (or clear with `null`) a listener for history events,
    /// delivered as JSON strings
    #[wasm_bindgen(js_name = onHistory)]
    pub fn on_history(&mut self, callback: Option<Function>) {
        if let Some(id) = self.history_subscription.take() {
            self.engine.unsubscribe_history(id);
        }
        let Some(f) = callback else {
            return;
        };
        let id = self.engine.subscribe_history(move |event| {
            let Ok(json) = serde_json::to_string(event) else {
                return;
            };
            if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                log::warn!("onHistory callback threw: {e:?}");
            }
        });
        self.history_subscription = Some(id);
    }

    /// Register (or clear with `null`) a listener called with the step
    /// count whenever it changes
    #[wasm_bindgen(js_name = onStep)]
    pub fn on_step(&mut self, callback: Option<Function>) {
        if let Some(id) = self.step_subscription.take() {
            self.engine.unsubscribe_history(id);
        }
        let Some(f) = callback else {
            return;
        };
        let id = self.engine.subscribe_history(move |event| {
            let steps = JsValue::from_f64(event.step_count() as f64);
            if let Err(e) = f.call1(&JsValue::NULL, &steps) {
                log::warn!("onStep callback threw: {e:?}");
            }
        });
        self.step_subscription = Some(id);
    }

    /// Advance the animation by the frame time in seconds
    pub fn update(&mut self, dt: f32) -> u32 {
        self.engine.update(dt)
    }

    /// Position and orientation of every cubie, in id order
    pub fn transforms(&self) -> Float32Array {
        let cubies = self.engine.cube().cubies();
        let mut buf = Vec::with_capacity(cubies.len() * FLOATS_PER_CUBIE);
        for cubie in cubies {
            buf.extend_from_slice(&cubie.position.to_array());
            buf.extend_from_slice(&cubie.orientation.to_array());
        }
        Float32Array::from(buf.as_slice())
    }

    /// JSON snapshot of the cubie registry
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.engine.cube())?)
    }

    /// Persist the active settings to LocalStorage
    #[wasm_bindgen(js_name = saveSettings)]
    pub fn save_settings(&self) {
        self.engine.settings().save();
    }
}
