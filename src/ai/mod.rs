//! AI 决策模块（启发式三层策略与自适应难度）。

pub mod heuristic;

pub use heuristic::{AiAgent, AiConfig, AiDecision, DecisionTier};
