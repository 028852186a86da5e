use serde::{Deserialize, Serialize};

use super::state::{
    Board, GameEvent, GameMode, GameState, GameStatus, IntegrityError, Mark, ScoreRecord,
    BOARD_CELLS,
};

/// 8 条胜利线：3 行、3 列、2 条对角线。
pub const WIN_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// `mark` 是否占满任意一条胜利线。
pub fn check_win(board: &Board, mark: Mark) -> bool {
    winning_triple(board, mark).is_some()
}

/// 返回 `mark` 占满的第一条胜利线，用于前端高亮。
pub fn winning_triple(board: &Board, mark: Mark) -> Option<[usize; 3]> {
    if mark.is_empty() {
        return None;
    }
    WIN_TRIPLES
        .iter()
        .find(|triple| triple.iter().all(|&index| board.get(index) == Some(mark)))
        .copied()
}

/// 在 `index` 落下 `mark` 是否立即成线（模拟落子，不改动棋盘）。
pub fn wins_at(board: &Board, index: usize, mark: Mark) -> bool {
    match board.get(index) {
        Some(cell) if cell.is_empty() => {}
        _ => return false,
    }
    let mut probe = *board;
    probe.set(index, mark);
    check_win(&probe, mark)
}

pub fn is_board_full(board: &Board) -> bool {
    board.is_full()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    IntegrityViolation { error: IntegrityError },
}

/// 一次规则操作的完整结果：新状态、事件流与终局信息。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = if state.status.is_terminal() {
            Some(state.status)
        } else {
            None
        };
        let message = state.status.message();
        Self {
            state,
            events,
            outcome,
            message,
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// 当前行棋方在 `index` 落子。
    ///
    /// 非法输入（越界、格子已占、对局已结束）静默忽略：
    /// 不返回事件，也不改动任何状态。
    pub fn place_mark(
        &mut self,
        state: &mut GameState,
        scores: &mut ScoreRecord,
        index: usize,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if state.is_finished() || index >= BOARD_CELLS {
            return events;
        }
        match state.board.get(index) {
            Some(cell) if cell.is_empty() => {}
            _ => return events,
        }

        let mark = state.current_mark;
        state.board.set(index, mark);
        state.last_move = Some(index);
        events.push(GameEvent::MarkPlaced { index, mark });

        events.extend(self.settle_after_move(state, scores));

        for event in &events {
            state.record_event(event.clone());
        }
        events
    }

    /// 落子后的终局判定与换手。胜负与平局都会累计战绩。
    fn settle_after_move(&mut self, state: &mut GameState, scores: &mut ScoreRecord) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mark = state.current_mark;

        if let Some(triple) = winning_triple(&state.board, mark) {
            state.status = GameStatus::Won { winner: mark };
            Self::credit_win(state, scores, mark);
            events.push(GameEvent::GameWon {
                winner: mark,
                triple: Some(triple),
            });
            events.push(scores.as_event());
            return events;
        }

        if state.board.is_full() {
            state.status = GameStatus::Draw;
            scores.record_draw();
            events.push(GameEvent::GameDrawn);
            events.push(scores.as_event());
            return events;
        }

        if let Some(next) = mark.opponent() {
            state.current_mark = next;
            events.push(GameEvent::TurnAdvanced { mark: next });
        }
        events
    }

    /// Solo 模式下 O 是 AI 席位；Duo 模式两个座位都算玩家。
    fn credit_win(state: &GameState, scores: &mut ScoreRecord, winner: Mark) {
        if state.mode == GameMode::Solo && winner == Mark::O {
            scores.record_ai_win();
        } else {
            scores.record_player_win();
        }
    }

    /// 以指定模式开新局（对应前端的模式选择）。
    pub fn start_match(&mut self, state: &mut GameState, mode: GameMode) -> Vec<GameEvent> {
        state.reset();
        state.mode = mode;
        let event = GameEvent::MatchStarted { mode };
        state.record_event(event.clone());
        vec![event]
    }

    /// 按上次选择的模式重开一局，战绩保留。
    pub fn restart(&mut self, state: &mut GameState) -> Vec<GameEvent> {
        state.reset();
        let event = GameEvent::BoardReset;
        state.record_event(event.clone());
        vec![event]
    }

    pub fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }
}
