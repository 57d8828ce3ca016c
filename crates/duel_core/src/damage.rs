//! Damage rolls.
//!
//! Accuracy narrows the roll toward `attack_power`: the minimum is
//! `attack_power * accuracy / 100` (integer division), the maximum is
//! `attack_power` itself.

use rand::Rng;

use crate::combatant::Combatant;

/// Inclusive `(min, max)` damage bounds for an attacker.
#[must_use]
pub fn damage_bounds(attack_power: u32, accuracy: u8) -> (u32, u32) {
    let accuracy = u64::from(accuracy.min(100));
    let min = u64::from(attack_power) * accuracy / 100;
    // min <= attack_power always holds, so the conversion cannot fail
    let min = u32::try_from(min).unwrap_or(attack_power);
    (min, attack_power)
}

/// Roll damage for `attacker` using the engine's seeded generator.
pub fn roll_damage<R: Rng + ?Sized>(attacker: &Combatant, rng: &mut R) -> u32 {
    let (min, max) = damage_bounds(attacker.attack_power, attacker.accuracy);
    if min == max {
        return max;
    }
    rng.gen_range(min..=max)
}
