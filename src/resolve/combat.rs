//! Per-unit turn resolution.
//!
//! A unit's turn is decided from scratch every time (units keep no memory):
//! `plan_turn` reads the grid and picks exactly one plan, and `apply_plan`
//! carries it out. Priority order:
//!
//! 1. No living enemies: idle.
//! 2. Healers mend the weakest wounded ally within range 2, or step toward it.
//!    A healer with nobody to mend falls through to rule 3.
//! 3. Strike the nearest enemy if adjacent, otherwise step toward it.
//!
//! A step picks the empty neighbor that strictly shortens the distance to
//! the target; if none does the unit is blocked and stays put.

use crate::board::{ActionKind, Coord, Grid, Strategy, UnitInstance};

/// Healing reaches allies at most this far away.
pub const HEAL_RANGE: u32 = 2;

/// Attacks reach only adjacent enemies.
pub const ATTACK_RANGE: u32 = 1;

/// The decision taken for one unit turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Idle,
    Heal { target: Coord },
    Attack { target: Coord },
    Step { to: Coord },
    Blocked,
}

/// Damage dealt by `attack` against `defense`; never below 1.
pub fn damage(attack: u32, defense: u32) -> u32 {
    attack.saturating_sub(defense).max(1)
}

/// Decides what the unit standing on `at` does this turn. Pure.
///
/// Ties are broken by row-major board order for enemies, and by ascending
/// spawn order for heal targets.
pub fn plan_turn(grid: &Grid, at: Coord) -> Plan {
    let Some(actor) = grid.unit_at(at) else {
        return Plan::Idle;
    };

    let nearest_enemy = grid
        .units()
        .filter(|(_, u)| u.owner != actor.owner)
        .map(|(pos, _)| (pos, grid.distance(at, pos)))
        .min_by_key(|&(_, d)| d);
    let Some((enemy_at, enemy_dist)) = nearest_enemy else {
        return Plan::Idle;
    };

    if actor.strategy == Strategy::Heal {
        if let Some((ally_at, ally_dist)) = weakest_wounded_ally(grid, at, actor) {
            if ally_dist <= HEAL_RANGE {
                return Plan::Heal { target: ally_at };
            }
            return step_toward(grid, at, ally_at);
        }
    }

    if enemy_dist <= ATTACK_RANGE {
        return Plan::Attack { target: enemy_at };
    }
    step_toward(grid, at, enemy_at)
}

/// The wounded ally (excluding the actor) with the lowest current hp.
fn weakest_wounded_ally(grid: &Grid, at: Coord, actor: &UnitInstance) -> Option<(Coord, u32)> {
    grid.units()
        .filter(|&(pos, u)| pos != at && u.owner == actor.owner && u.is_wounded())
        .min_by_key(|(_, u)| (u.hp, u.spawn_order))
        .map(|(pos, _)| (pos, grid.distance(at, pos)))
}

/// Picks the empty neighbor that brings `from` strictly closer to `target`.
fn step_toward(grid: &Grid, from: Coord, target: Coord) -> Plan {
    let current = grid.distance(from, target);
    grid.neighbors(from)
        .into_iter()
        .filter(|&n| grid.unit_at(n).is_none())
        .map(|n| (n, grid.distance(n, target)))
        .min_by_key(|&(_, d)| d)
        .filter(|&(_, d)| d < current)
        .map_or(Plan::Blocked, |(to, _)| Plan::Step { to })
}

/// Carries out `plan` for the unit on `at` and describes the result.
///
/// A step claims the destination cell for the mover, so a unit always
/// stands on territory its owner holds. A kill clears the victim's cell but
/// leaves its ownership alone.
pub fn apply_plan(grid: &mut Grid, at: Coord, plan: Plan) -> ActionKind {
    let Some(actor) = grid.unit_at(at).copied() else {
        return ActionKind::Idle;
    };
    match plan {
        Plan::Idle => ActionKind::Idle,
        Plan::Blocked => ActionKind::Blocked,
        Plan::Heal { target } => match grid.unit_at_mut(target) {
            Some(ally) => {
                let amount = ally.heal(actor.attack());
                ActionKind::Heal {
                    target,
                    amount,
                    hp_after: ally.hp,
                }
            }
            None => ActionKind::Idle,
        },
        Plan::Attack { target } => {
            let Some(cell) = grid.cell_mut(target) else {
                return ActionKind::Idle;
            };
            let Some(victim) = cell.occupant.as_mut() else {
                return ActionKind::Idle;
            };
            let dealt = damage(actor.attack(), victim.defense());
            let hp_after = victim.take_damage(dealt);
            if hp_after == 0 {
                let victim_id = victim.id();
                cell.occupant = None;
                ActionKind::Kill {
                    target,
                    victim: victim_id,
                    damage: dealt,
                }
            } else {
                ActionKind::Hit {
                    target,
                    damage: dealt,
                    hp_after,
                }
            }
        }
        Plan::Step { to } => {
            let Some(mover) = grid.cell_mut(at).and_then(|c| c.occupant.take()) else {
                return ActionKind::Idle;
            };
            if let Some(dest) = grid.cell_mut(to) {
                dest.owner = Some(mover.owner);
                dest.occupant = Some(mover);
            }
            ActionKind::Move { to }
        }
    }
}

/// Plans and applies one turn for the unit on `at`.
pub fn execute_turn(grid: &mut Grid, at: Coord) -> ActionKind {
    let plan = plan_turn(grid, at);
    apply_plan(grid, at, plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Orientation, Player, UnitKind};

    fn put(grid: &mut Grid, at: Coord, owner: Player, kind: UnitKind, spawn: u32) {
        let cell = grid.cell_mut(at).unwrap();
        cell.owner = Some(owner);
        cell.occupant = Some(UnitInstance::spawn(kind, owner, spawn));
    }

    fn board() -> Grid {
        Grid::new(7, 7, Orientation::OddR)
    }

    #[test]
    fn damage_has_a_floor_of_one() {
        assert_eq!(damage(15, 20), 1);
        assert_eq!(damage(20, 20), 1);
        assert_eq!(damage(30, 20), 10);
        assert_eq!(damage(8, 3), 5);
    }

    #[test]
    fn adjacent_units_trade_blows() {
        // Attack 30 into defense 20, and attack 8 back into defense 3.
        assert_eq!(damage(30, 20), 10);
        assert_eq!(damage(8, 3), 5);

        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Knight, 0);
        put(&mut g, Coord::new(3, 4), Player::P2, UnitKind::Guardian, 0);
        let effect = execute_turn(&mut g, Coord::new(3, 3));
        assert_eq!(
            effect,
            ActionKind::Hit {
                target: Coord::new(3, 4),
                damage: 10,
                hp_after: 130,
            }
        );
    }

    #[test]
    fn lethal_hit_removes_victim() {
        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Titan, 0);
        put(&mut g, Coord::new(3, 4), Player::P2, UnitKind::Healer, 5);
        g.unit_at_mut(Coord::new(3, 4)).unwrap().hp = 10;
        let effect = execute_turn(&mut g, Coord::new(3, 3));
        assert!(matches!(effect, ActionKind::Kill { damage: 37, .. }));
        assert!(g.unit_at(Coord::new(3, 4)).is_none());
        assert_eq!(g.cell(Coord::new(3, 4)).unwrap().owner, Some(Player::P2));
    }

    #[test]
    fn no_enemies_means_idle() {
        let mut g = board();
        put(&mut g, Coord::new(0, 0), Player::P1, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(0, 1), Player::P1, UnitKind::Healer, 1);
        g.unit_at_mut(Coord::new(0, 0)).unwrap().hp = 1;
        assert_eq!(plan_turn(&g, Coord::new(0, 0)), Plan::Idle);
        // Healers idle too once the enemy is gone, even with wounded allies.
        assert_eq!(plan_turn(&g, Coord::new(0, 1)), Plan::Idle);
    }

    #[test]
    fn healer_mends_ally_in_range_without_moving() {
        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Healer, 0);
        put(&mut g, Coord::new(3, 5), Player::P1, UnitKind::Healer, 1);
        put(&mut g, Coord::new(6, 6), Player::P2, UnitKind::Warrior, 0);
        g.unit_at_mut(Coord::new(3, 5)).unwrap().hp = 40;

        let effect = execute_turn(&mut g, Coord::new(3, 3));
        assert_eq!(
            effect,
            ActionKind::Heal {
                target: Coord::new(3, 5),
                amount: 10,
                hp_after: 50,
            }
        );
        assert_eq!(g.unit_at(Coord::new(3, 5)).unwrap().hp, 50);
        assert!(g.unit_at(Coord::new(3, 3)).is_some());
    }

    #[test]
    fn healer_prefers_weakest_then_lowest_spawn() {
        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Healer, 0);
        put(&mut g, Coord::new(3, 4), Player::P1, UnitKind::Warrior, 2);
        put(&mut g, Coord::new(2, 3), Player::P1, UnitKind::Warrior, 1);
        put(&mut g, Coord::new(6, 0), Player::P2, UnitKind::Warrior, 0);
        g.unit_at_mut(Coord::new(3, 4)).unwrap().hp = 30;
        g.unit_at_mut(Coord::new(2, 3)).unwrap().hp = 30;
        assert_eq!(
            plan_turn(&g, Coord::new(3, 3)),
            Plan::Heal {
                target: Coord::new(2, 3)
            }
        );
    }

    #[test]
    fn healer_walks_toward_distant_ally() {
        let mut g = board();
        put(&mut g, Coord::new(0, 0), Player::P1, UnitKind::Healer, 0);
        put(&mut g, Coord::new(0, 5), Player::P1, UnitKind::Warrior, 1);
        put(&mut g, Coord::new(6, 6), Player::P2, UnitKind::Warrior, 0);
        g.unit_at_mut(Coord::new(0, 5)).unwrap().hp = 50;
        let effect = execute_turn(&mut g, Coord::new(0, 0));
        assert_eq!(effect, ActionKind::Move { to: Coord::new(0, 1) });
        assert_eq!(g.cell(Coord::new(0, 1)).unwrap().owner, Some(Player::P1));
    }

    #[test]
    fn healer_without_patients_fights() {
        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Healer, 0);
        put(&mut g, Coord::new(3, 4), Player::P2, UnitKind::Berserker, 0);
        let effect = execute_turn(&mut g, Coord::new(3, 3));
        assert_eq!(
            effect,
            ActionKind::Hit {
                target: Coord::new(3, 4),
                damage: 8,
                hp_after: 72,
            }
        );
    }

    #[test]
    fn attacker_targets_nearest_enemy_in_board_order() {
        let mut g = board();
        put(&mut g, Coord::new(3, 3), Player::P1, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(3, 5), Player::P2, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(1, 3), Player::P2, UnitKind::Warrior, 1);
        put(&mut g, Coord::new(6, 6), Player::P2, UnitKind::Warrior, 2);
        // (1,3) and (3,5) are both two steps away; (1,3) comes first row-major.
        let plan = plan_turn(&g, Coord::new(3, 3));
        let Plan::Step { to } = plan else {
            panic!("expected a step, got {:?}", plan);
        };
        assert_eq!(g.distance(to, Coord::new(1, 3)), 1);
    }

    #[test]
    fn step_moves_and_claims_cell() {
        let mut g = board();
        put(&mut g, Coord::new(0, 0), Player::P1, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(0, 4), Player::P2, UnitKind::Warrior, 0);
        let effect = execute_turn(&mut g, Coord::new(0, 0));
        assert_eq!(effect, ActionKind::Move { to: Coord::new(0, 1) });
        assert!(g.unit_at(Coord::new(0, 0)).is_none());
        assert_eq!(g.cell(Coord::new(0, 0)).unwrap().owner, Some(Player::P1));
        let cell = g.cell(Coord::new(0, 1)).unwrap();
        assert_eq!(cell.owner, Some(Player::P1));
        assert_eq!(cell.occupant.unwrap().spawn_order, 0);
        assert!(g.check_invariants().is_ok());
    }

    #[test]
    fn boxed_in_unit_is_blocked() {
        let mut g = board();
        put(&mut g, Coord::new(0, 0), Player::P1, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(0, 1), Player::P1, UnitKind::Guardian, 1);
        put(&mut g, Coord::new(1, 0), Player::P1, UnitKind::Guardian, 2);
        put(&mut g, Coord::new(6, 6), Player::P2, UnitKind::Warrior, 0);
        let before = g.clone();
        assert_eq!(execute_turn(&mut g, Coord::new(0, 0)), ActionKind::Blocked);
        assert_eq!(g, before);
    }

    #[test]
    fn hole_blocks_the_only_path() {
        let mut g = Grid::with_holes(1, 3, Orientation::OddR, &[Coord::new(0, 1)]);
        put(&mut g, Coord::new(0, 0), Player::P1, UnitKind::Warrior, 0);
        put(&mut g, Coord::new(0, 2), Player::P2, UnitKind::Warrior, 0);
        assert_eq!(plan_turn(&g, Coord::new(0, 0)), Plan::Blocked);
    }

    #[test]
    fn empty_cell_plans_idle() {
        let g = board();
        assert_eq!(plan_turn(&g, Coord::new(2, 2)), Plan::Idle);
    }
}
