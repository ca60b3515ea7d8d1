//! Rules resolution.
//!
//! Applies shopping actions to the match state, resolves each unit's
//! autonomous turn, and sequences the phases of a round.

pub mod combat;
pub mod economy;
pub mod phase;

pub use combat::{damage, execute_turn, plan_turn, Plan};
pub use economy::{
    buy_territory, check_buy, check_deploy, deploy_unit, settle_interest, EconomyRules, IllegalMove,
};
pub use phase::{
    advance, build_schedule, check_winner, execution_complete, final_outcome, resolve_next,
    Transition,
};
