pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, DecisionTier};
pub use game::{
    check_win, is_board_full, winning_triple, wins_at, Board, GameEvent, GameMode, GameState,
    GameStatus, IntegrityError, Mark, RuleEngine, RuleError, RuleResolution, ScoreRecord,
    BOARD_CELLS, WIN_TRIPLES,
};

/// AI 落子前的默认展示延迟（毫秒），给玩家留出观察时间。
pub const DEFAULT_AI_DELAY_MS: u32 = 500;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn resolution_from_events(state: &GameState, events: Vec<GameEvent>) -> RuleResolution {
    RuleResolution::new(state.clone(), events)
}

fn parse_mode(mode: &str) -> Result<GameMode, JsValue> {
    GameMode::from_str(mode)
        .map_err(|_| JsValue::from_str(&format!("unknown game mode: {mode}")))
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    scores: ScoreRecord,
}

#[wasm_bindgen]
impl GameEngine {
    /// 以指定模式创建引擎（缺省为双人模式）。
    #[wasm_bindgen(constructor)]
    pub fn new(mode: Option<String>) -> Result<GameEngine, JsValue> {
        let mode = match mode {
            Some(value) => parse_mode(&value)?,
            None => GameMode::default(),
        };
        Ok(GameEngine {
            state: GameState::new(mode),
            scores: ScoreRecord::new(),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn scores_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.scores).map_err(serde_to_js_error)
    }

    /// 终局文案（"X wins!" 等），对局进行中返回 None。
    pub fn status_message(&self) -> Option<String> {
        self.state.status.message()
    }

    /// 当前会话胜率推导出的 AI 强度。
    pub fn difficulty(&self) -> f64 {
        AiConfig::from_scores(&self.scores).skill
    }

    /// 模式选择入口：以新模式开局，战绩保留。
    pub fn select_mode(&mut self, mode: &str) -> Result<String, JsValue> {
        let mode = parse_mode(mode)?;
        let mut engine = RuleEngine::new();
        let events = engine.start_match(&mut self.state, mode);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 格子点击入口：非法点击（占用、越界、终局后）静默忽略。
    pub fn handle_cell(&mut self, index: usize) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine.place_mark(&mut self.state, &mut self.scores, index);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 重开一局：沿用上次选择的模式，战绩保留。
    pub fn restart(&mut self) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine.restart(&mut self.state);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 同步计算并应用 AI 落子，返回 `{decision, applied}`。
    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let config = AiConfig::from_scores(&self.scores);
        // 行棋方检查：轮不到 AI 席位时不落子，保证人机时序
        let decision = if self.state.ai_to_move() {
            let mut agent = AiAgent::new(config);
            agent.decide_move(&self.state)
        } else {
            AiDecision::pass(config.skill)
        };

        let applied = match decision.index {
            Some(index) => {
                let mut engine = RuleEngine::new();
                let events = engine.place_mark(&mut self.state, &mut self.scores, index);
                Some(resolution_from_events(&self.state, events))
            }
            None => None,
        };

        let response = AiMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 延迟后的 AI 决策（只决策不落子），默认延迟 500ms。
    /// 延迟仅用于展示节奏，时序由行棋方检查保证。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let state = self.state.clone();
        let config = AiConfig::from_scores(&self.scores);
        let delay = delay_ms.unwrap_or(DEFAULT_AI_DELAY_MS);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = if state.ai_to_move() {
                let mut agent = AiAgent::new(config);
                agent.decide_move(&state)
            } else {
                AiDecision::pass(config.skill)
            };
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回一个新对局状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state(mode: Option<String>) -> Result<JsValue, JsValue> {
    let mode = match mode {
        Some(value) => parse_mode(&value)?,
        None => GameMode::default(),
    };
    to_value(&GameState::new(mode)).map_err(JsValue::from)
}

/// 无状态落子：输入状态与战绩快照，返回新的决议。
#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move(state: JsValue, scores: JsValue, index: usize) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let mut scores: ScoreRecord = from_value(scores).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    let events = engine.place_mark(&mut state, &mut scores, index);

    #[derive(Serialize)]
    struct MoveResponse {
        resolution: RuleResolution,
        scores: ScoreRecord,
    }

    let response = MoveResponse {
        resolution: RuleResolution::new(state, events),
        scores,
    };
    to_value(&response).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "checkWin")]
pub fn check_win_js(state: JsValue, mark: &str) -> Result<bool, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let mark = Mark::from_str(mark)
        .map_err(|_| JsValue::from_str(&format!("unknown mark: {mark}")))?;
    Ok(check_win(&state.board, mark))
}

#[wasm_bindgen(js_name = "isBoardFull")]
pub fn is_board_full_js(state: JsValue) -> Result<bool, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    Ok(is_board_full(&state.board))
}

/// 无状态 AI 决策；`seed` 仅供测试或回放复现。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    state: JsValue,
    skill: Option<f64>,
    seed: Option<u64>,
) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let config = match skill {
        Some(value) => AiConfig::default().with_skill(value),
        None => AiConfig::default(),
    };
    let mut agent = match seed {
        Some(seed) => AiAgent::with_seed(config, seed),
        None => AiAgent::new(config),
    };
    let decision = agent.decide_move(&state);
    to_value(&decision).map_err(JsValue::from)
}

/// 由战绩快照推导 AI 强度（两档阶梯函数）。
#[wasm_bindgen(js_name = "adjustDifficulty")]
pub fn adjust_difficulty(scores: JsValue) -> Result<f64, JsValue> {
    let scores: ScoreRecord = from_value(scores).map_err(JsValue::from)?;
    Ok(AiConfig::from_scores(&scores).skill)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    RuleEngine::ensure_integrity(&state).map_err(to_js_error)?;
    Ok(())
}

/// 背景音乐播放失败时由前端上报：只记录日志，绝不进入对局状态。
#[wasm_bindgen(js_name = "reportAudioError")]
pub fn report_audio_error(detail: &str) {
    let message = format!("Audio playback failed: {detail}");
    web_sys::console::warn_1(&message.into());
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
