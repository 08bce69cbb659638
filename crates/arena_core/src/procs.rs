//! Proc resolution: eligibility, effective rate, and the draw itself.

use crate::archetypes::{AbilityDef, Effect};
use crate::combatant::Combatant;
use crate::config::ArenaConfig;
use crate::math::{probability_from_bp, Fixed};
use crate::rng::MatchRng;

/// `base + actor_bonus - defender_resist`, clamped to `[0, 1]`.
#[must_use]
pub fn proc_probability(base_bp: u32, actor_bonus_bp: u32, defender_resist_bp: u32) -> Fixed {
    let bp = i64::from(base_bp) + i64::from(actor_bonus_bp) - i64::from(defender_resist_bp);
    probability_from_bp(bp)
}

/// Whether an ability may roll at all: not a spent single-use, and its gate holds.
///
/// Ineligible abilities consume no draw.
#[must_use]
pub fn is_eligible(owner: &Combatant, opponent: &Combatant, slot: usize, ability: &AbilityDef) -> bool {
    if ability.single_use && owner.ability_used(slot) {
        return false;
    }
    ability.gate.map_or(true, |gate| owner.check(gate, opponent))
}

/// An ability that won its roll, with the effect to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredAbility {
    /// The owner's ability.
    pub name: &'static str,
    /// For copies, the opponent ability that was borrowed.
    pub copied_from: Option<&'static str>,
    /// Effect to apply (already scaled for copies).
    pub effect: Effect,
}

/// Roll one eligible ability slot.
///
/// Consumes exactly one draw, plus one more when a copy ability fires and
/// must pick which opponent ability to borrow. Marks single-use abilities
/// as spent when they fire.
pub fn roll_ability(
    owner: &mut Combatant,
    opponent: &Combatant,
    slot: usize,
    config: &ArenaConfig,
    rng: &mut MatchRng,
) -> Option<FiredAbility> {
    let ability = owner.archetype().abilities[slot];
    let probability = proc_probability(
        config.tier_rate_bp(ability.tier),
        owner.derived().proc_bonus_bp,
        opponent.resist_bp(),
    );
    if !rng.chance(probability) {
        return None;
    }
    if ability.single_use {
        owner.mark_ability_used(slot);
    }

    match ability.effect {
        Effect::CopyRandomAbility { pct } => {
            let pool = &opponent.archetype().abilities;
            let borrowed = pool[rng.pick(pool.len())];
            // Copying a copy has nothing to borrow.
            let effect = match borrowed.effect {
                Effect::CopyRandomAbility { .. } => Effect::FlatDamageMult { pct: 100 },
                other => other.scaled(pct),
            };
            Some(FiredAbility {
                name: ability.name,
                copied_from: Some(borrowed.name),
                effect,
            })
        }
        effect => Some(FiredAbility {
            name: ability.name,
            copied_from: None,
            effect,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Animal;
    use crate::combatant::Side;
    use crate::grid::Position;
    use crate::stats::Build;

    fn fighter(side: Side, animal: Animal, stats: [i64; 4]) -> Combatant {
        let [hp, atk, spd, wil] = stats;
        let build = Build::new(animal, hp, atk, spd, wil).expect("valid");
        Combatant::new(side, build, &ArenaConfig::default().stats, Position::new(0, 0))
    }

    #[test]
    fn test_probability_subtracts_resist_and_clamps() {
        assert_eq!(proc_probability(450, 8, 0), probability_from_bp(458));
        assert_eq!(proc_probability(450, 8, 3300), Fixed::ZERO);
        assert_eq!(proc_probability(9000, 2000, 0), Fixed::ONE);
    }

    #[test]
    fn test_gate_controls_eligibility() {
        let mut bear = fighter(Side::A, Animal::Bear, [5, 5, 5, 5]);
        let wolf = fighter(Side::B, Animal::Wolf, [5, 5, 5, 5]);
        let last_stand = bear.archetype().abilities[1];
        assert!(!is_eligible(&bear, &wolf, 1, &last_stand));
        bear.hp = 10;
        assert!(is_eligible(&bear, &wolf, 1, &last_stand));
        bear.mark_ability_used(1);
        assert!(!is_eligible(&bear, &wolf, 1, &last_stand));
    }

    #[test]
    fn test_zero_probability_still_draws() {
        let mut bear = fighter(Side::A, Animal::Bear, [5, 5, 5, 5]);
        let owl = fighter(Side::B, Animal::Owl, [1, 1, 1, 17]);
        let mut rng = MatchRng::from_seed(0);
        let config = ArenaConfig::default();
        assert_eq!(roll_ability(&mut bear, &owl, 0, &config, &mut rng), None);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_certain_single_use_is_spent() {
        let mut raven = fighter(Side::A, Animal::Raven, [5, 5, 5, 5]);
        let bear = fighter(Side::B, Animal::Bear, [5, 5, 5, 5]);
        let mut config = ArenaConfig::default();
        config.procs.standard_bp = 20_000;
        let mut rng = MatchRng::from_seed(0);
        let fired = roll_ability(&mut raven, &bear, 0, &config, &mut rng).expect("certain proc");
        assert_eq!(fired.name, "Shadow Clone");
        assert!(raven.ability_used(0));
    }

    #[test]
    fn test_copy_consumes_pick_draw() {
        let mut monkey = fighter(Side::A, Animal::Monkey, [5, 5, 5, 5]);
        let tiger = fighter(Side::B, Animal::Tiger, [5, 5, 5, 5]);
        let mut config = ArenaConfig::default();
        config.procs.strong_bp = 20_000;
        let mut rng = MatchRng::from_seed(11);
        let fired = roll_ability(&mut monkey, &tiger, 1, &config, &mut rng).expect("certain proc");
        assert_eq!(rng.draws(), 2);
        let borrowed = fired.copied_from.expect("copied");
        assert!(borrowed == "Pounce" || borrowed == "Hamstring");
        if borrowed == "Pounce" {
            assert_eq!(fired.effect, Effect::FlatDamageMult { pct: 152 });
        }
    }
}
