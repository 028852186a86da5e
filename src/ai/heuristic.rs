use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{wins_at, GameState, ScoreRecord};

/// 无对局记录时的默认强度。
pub const NEUTRAL_SKILL: f64 = 0.5;
/// 玩家胜率偏低时 AI 放水。
pub const EASED_SKILL: f64 = 0.4;
/// 玩家胜率偏高时 AI 加压。
pub const PRESSED_SKILL: f64 = 0.7;

const WIN_RATE_THRESHOLD: f64 = 0.5;

/// AI 强度标量 ∈ [0, 1]，由会话胜率推导。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiConfig {
    pub skill: f64,
}

impl AiConfig {
    /// 两档阶梯函数：无对局 → 0.5；胜率 < 0.5 → 0.4；否则 → 0.7。
    pub fn from_scores(scores: &ScoreRecord) -> Self {
        let skill = match scores.win_rate() {
            None => NEUTRAL_SKILL,
            Some(rate) if rate < WIN_RATE_THRESHOLD => EASED_SKILL,
            Some(_) => PRESSED_SKILL,
        };
        Self { skill }
    }

    pub fn with_skill(mut self, skill: f64) -> Self {
        self.skill = skill.clamp(0.0, 1.0);
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            skill: NEUTRAL_SKILL,
        }
    }
}

/// 命中的决策层级，按优先级依次为：成线、堵截、加权随机。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DecisionTier {
    Winning,
    Blocking,
    Random { evaluated: bool },
}

/// 一次 AI 决策的结果，序列化后交给前端。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<DecisionTier>,
    pub skill: f64,
}

impl AiDecision {
    /// 不落子的空决策（终局、满盘或轮不到 AI）。
    pub fn pass(skill: f64) -> Self {
        Self {
            index: None,
            tier: None,
            skill,
        }
    }
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 按固定优先级选点：先找自己的成线点，再堵对手的成线点，
    /// 最后在剩余空格里随机。弱随机分支只影响决策标注，落子后的
    /// 终局判定始终执行。
    pub fn decide_move(&mut self, state: &GameState) -> AiDecision {
        let skill = self.config.skill;
        if state.is_finished() {
            return AiDecision::pass(skill);
        }

        let mark = state.current_mark;
        let Some(opponent) = mark.opponent() else {
            return AiDecision::pass(skill);
        };

        let open = state.board.empty_cells();
        if open.is_empty() {
            return AiDecision::pass(skill);
        }

        // 第一层：能赢就赢
        if let Some(&index) = open.iter().find(|&&index| wins_at(&state.board, index, mark)) {
            return AiDecision {
                index: Some(index),
                tier: Some(DecisionTier::Winning),
                skill,
            };
        }

        // 第二层：堵住对手的成线点
        if let Some(&index) = open
            .iter()
            .find(|&&index| wins_at(&state.board, index, opponent))
        {
            return AiDecision {
                index: Some(index),
                tier: Some(DecisionTier::Blocking),
                skill,
            };
        }

        // 第三层：加权随机
        let evaluated = self.rng.gen::<f64>() < skill;
        let index = open.choose(&mut self.rng).copied();
        AiDecision {
            index,
            tier: index.map(|_| DecisionTier::Random { evaluated }),
            skill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameMode, GameStatus, Mark, RuleEngine};

    fn solo_state() -> GameState {
        let mut state = GameState::new(GameMode::Solo);
        state.current_mark = Mark::O;
        state
    }

    fn seeded_agent(seed: u64) -> AiAgent {
        AiAgent::with_seed(AiConfig::default(), seed)
    }

    #[test]
    fn skill_steps_follow_session_win_rate() {
        let fresh = ScoreRecord::new();
        assert_eq!(AiConfig::from_scores(&fresh).skill, NEUTRAL_SKILL);

        let losing = ScoreRecord {
            player_wins: 3,
            ai_wins: 5,
            total_games: 10,
        };
        assert_eq!(AiConfig::from_scores(&losing).skill, EASED_SKILL);

        let winning = ScoreRecord {
            player_wins: 6,
            ai_wins: 2,
            total_games: 10,
        };
        assert_eq!(AiConfig::from_scores(&winning).skill, PRESSED_SKILL);
    }

    #[test]
    fn takes_winning_cell_when_available() {
        let mut state = solo_state();
        state.board.set(3, Mark::O);
        state.board.set(5, Mark::O);
        state.board.set(0, Mark::X);
        state.board.set(1, Mark::X);
        // 先手次序无关紧要，这里只关心层级选择
        state.board.set(8, Mark::X);

        let decision = seeded_agent(7).decide_move(&state);
        assert_eq!(decision.index, Some(4), "completes [3, 4, 5]");
        assert_eq!(decision.tier, Some(DecisionTier::Winning));
    }

    #[test]
    fn winning_beats_blocking_when_both_exist() {
        let mut state = solo_state();
        // O 可在 2 成线 [0,1,2]，X 威胁在 8 成线 [6,7,8]
        state.board.set(0, Mark::O);
        state.board.set(1, Mark::O);
        state.board.set(6, Mark::X);
        state.board.set(7, Mark::X);

        for seed in 0..16 {
            let decision = seeded_agent(seed).decide_move(&state);
            assert_eq!(decision.index, Some(2));
            assert_eq!(decision.tier, Some(DecisionTier::Winning));
        }
    }

    #[test]
    fn blocks_opponent_threat_without_own_win() {
        let mut state = solo_state();
        // X 在 0、1，威胁点是 2；O 没有成线机会
        state.board.set(0, Mark::X);
        state.board.set(1, Mark::X);
        state.board.set(4, Mark::O);

        let decision = seeded_agent(11).decide_move(&state);
        assert_eq!(decision.index, Some(2));
        assert_eq!(decision.tier, Some(DecisionTier::Blocking));
    }

    #[test]
    fn random_tier_never_picks_occupied_cell() {
        let mut state = solo_state();
        state.board.set(0, Mark::X);
        state.board.set(4, Mark::O);
        state.board.set(8, Mark::X);

        for seed in 0..64 {
            let decision = seeded_agent(seed).decide_move(&state);
            let index = decision.index.expect("open board yields a move");
            assert!(
                state.board.get(index).expect("in range").is_empty(),
                "seed {seed} picked occupied cell {index}"
            );
            assert!(matches!(
                decision.tier,
                Some(DecisionTier::Random { .. })
            ));
        }
    }

    #[test]
    fn skill_extremes_pin_random_branch() {
        let mut state = solo_state();
        state.board.set(4, Mark::X);

        for seed in 0..32 {
            let strong = AiAgent::with_seed(AiConfig::default().with_skill(1.0), seed)
                .decide_move(&state);
            assert_eq!(
                strong.tier,
                strong.index.map(|_| DecisionTier::Random { evaluated: true })
            );

            let weak = AiAgent::with_seed(AiConfig::default().with_skill(0.0), seed)
                .decide_move(&state);
            assert_eq!(
                weak.tier,
                weak.index.map(|_| DecisionTier::Random { evaluated: false })
            );
        }
    }

    #[test]
    fn passes_on_finished_game() {
        let mut state = solo_state();
        state.status = GameStatus::Draw;

        let decision = seeded_agent(3).decide_move(&state);
        assert!(decision.index.is_none());
        assert!(decision.tier.is_none());
    }

    #[test]
    fn applied_ai_win_updates_scores() {
        let mut state = solo_state();
        let mut scores = ScoreRecord::new();
        state.board.set(3, Mark::O);
        state.board.set(5, Mark::O);
        state.board.set(0, Mark::X);
        state.board.set(1, Mark::X);
        state.board.set(8, Mark::X);

        let decision = seeded_agent(1).decide_move(&state);
        let index = decision.index.expect("winning move available");

        let mut engine = RuleEngine::new();
        let events = engine.place_mark(&mut state, &mut scores, index);

        assert_eq!(state.status, GameStatus::Won { winner: Mark::O });
        assert_eq!(scores.ai_wins, 1);
        assert_eq!(scores.total_games, 1);
        assert!(!events.is_empty());
    }
}
