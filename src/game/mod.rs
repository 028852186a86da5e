//! 游戏核心逻辑模块（棋盘状态机、规则引擎等）。

pub mod rules;
pub mod state;

pub use rules::{
    check_win,
    is_board_full,
    winning_triple,
    wins_at,
    RuleEngine,
    RuleError,
    RuleResolution,
    WIN_TRIPLES,
};
pub use state::{
    Board,
    GameEvent,
    GameMode,
    GameState,
    GameStatus,
    IntegrityError,
    Mark,
    ScoreRecord,
    BOARD_CELLS,
};
