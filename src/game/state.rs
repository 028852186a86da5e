use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::rules::{check_win, winning_triple};

/// 棋盘格子总数（3x3）。
pub const BOARD_CELLS: usize = 9;

/// 格子上的标记。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Empty,
    X,
    O,
}

impl Default for Mark {
    fn default() -> Self {
        Mark::Empty
    }
}

impl Mark {
    pub fn opponent(&self) -> Option<Mark> {
        match self {
            Mark::X => Some(Mark::O),
            Mark::O => Some(Mark::X),
            Mark::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Mark::Empty)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
            Mark::Empty => "",
        }
    }
}

impl FromStr for Mark {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Mark::X),
            "o" => Ok(Mark::O),
            "" | "empty" => Ok(Mark::Empty),
            _ => Err(()),
        }
    }
}

/// 对局模式：单人（对抗 AI）或双人轮流。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Solo,
    Duo,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Duo
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "solo" | "single" | "ai" => Ok(GameMode::Solo),
            "duo" | "double" | "pvp" => Ok(GameMode::Duo),
            _ => Err(()),
        }
    }
}

/// 对局状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameStatus {
    InProgress,
    Won { winner: Mark },
    Draw,
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::InProgress
    }
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    /// 终局展示文案，进行中的对局返回 None。
    pub fn message(&self) -> Option<String> {
        match self {
            GameStatus::Won { winner } => Some(format!("{} wins!", winner.symbol())),
            GameStatus::Draw => Some("It's a draw!".to_string()),
            GameStatus::InProgress => None,
        }
    }
}

/// 3x3 棋盘，下标 0-8 按行排列。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    cells: [Mark; BOARD_CELLS],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [Mark::Empty; BOARD_CELLS],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    pub fn set(&mut self, index: usize, mark: Mark) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = mark;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[Mark; BOARD_CELLS] {
        &self.cells
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|&&cell| cell == mark).count()
    }
}

/// 对局事件流，供前端渲染。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MatchStarted {
        mode: GameMode,
    },
    MarkPlaced {
        index: usize,
        mark: Mark,
    },
    TurnAdvanced {
        mark: Mark,
    },
    GameWon {
        winner: Mark,
        #[serde(skip_serializing_if = "Option::is_none")]
        triple: Option<[usize; 3]>,
    },
    GameDrawn,
    BoardReset,
    ScoresUpdated {
        player_wins: u32,
        ai_wins: u32,
        total_games: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountSkew { x: usize, o: usize },
    LastMoveOutOfRange { index: usize },
    WonWithoutTriple { winner: Mark },
    StaleStatus { winner: Mark },
}

/// 单局状态：棋盘、行棋方、模式与终局判定。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub board: Board,
    pub current_mark: Mark,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new(mode: GameMode) -> Self {
        Self {
            board: Board::new(),
            current_mark: Mark::X,
            mode,
            status: GameStatus::InProgress,
            last_move: None,
            event_log: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// 当前行棋方是否为 AI 席位（Solo 模式下 AI 执 O）。
    pub fn ai_to_move(&self) -> bool {
        self.mode == GameMode::Solo && self.current_mark == Mark::O
    }

    /// 清空棋盘开新局，保留已选模式。
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_mark = Mark::X;
        self.status = GameStatus::InProgress;
        self.last_move = None;
        self.event_log.clear();
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x = self.board.count(Mark::X);
        let o = self.board.count(Mark::O);
        // X 先手：X 的数量只能等于 O 或比 O 多一。
        if x < o || x > o + 1 {
            return Err(IntegrityError::MarkCountSkew { x, o });
        }

        if let Some(index) = self.last_move {
            if index >= BOARD_CELLS {
                return Err(IntegrityError::LastMoveOutOfRange { index });
            }
        }

        match self.status {
            GameStatus::Won { winner } => {
                if winning_triple(&self.board, winner).is_none() {
                    return Err(IntegrityError::WonWithoutTriple { winner });
                }
            }
            GameStatus::InProgress => {
                for mark in [Mark::X, Mark::O] {
                    if check_win(&self.board, mark) {
                        return Err(IntegrityError::StaleStatus { winner: mark });
                    }
                }
            }
            GameStatus::Draw => {}
        }

        Ok(())
    }

    /// 返回一个示例对局状态，方便前端调试或初始化。
    pub fn sample() -> Self {
        let mut state = GameState::new(GameMode::Solo);
        state.board.set(0, Mark::X);
        state.board.set(4, Mark::O);
        state.last_move = Some(4);
        state.record_event(GameEvent::MarkPlaced {
            index: 0,
            mark: Mark::X,
        });
        state.record_event(GameEvent::MarkPlaced {
            index: 4,
            mark: Mark::O,
        });
        state
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

/// 会话内的战绩统计，跨局保留，不做持久化。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRecord {
    #[serde(default)]
    pub player_wins: u32,
    #[serde(default)]
    pub ai_wins: u32,
    #[serde(default)]
    pub total_games: u32,
}

impl ScoreRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn win_rate(&self) -> Option<f64> {
        if self.total_games == 0 {
            None
        } else {
            Some(self.player_wins as f64 / self.total_games as f64)
        }
    }

    pub fn record_player_win(&mut self) {
        self.player_wins += 1;
        self.total_games += 1;
    }

    pub fn record_ai_win(&mut self) {
        self.ai_wins += 1;
        self.total_games += 1;
    }

    pub fn record_draw(&mut self) {
        self.total_games += 1;
    }

    pub fn as_event(&self) -> GameEvent {
        GameEvent::ScoresUpdated {
            player_wins: self.player_wins,
            ai_wins: self.ai_wins,
            total_games: self.total_games,
        }
    }
}
