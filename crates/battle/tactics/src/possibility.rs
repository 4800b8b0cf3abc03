use battle_core::{BattleHex, Unit, UnitId};

use crate::estimator::{AttackInfo, DamageEstimator};

/// One way of attacking one defender, with its estimated exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackPossibility {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub shooting: bool,
    /// Hex the attacker strikes from; [`BattleHex::INVALID`] for shots.
    pub dest: BattleHex,
    /// Movement distance to `dest`.
    pub charged_fields: u32,
    pub damage_dealt: i64,
    /// Retaliation expected back, 0 for shots and fatal blows.
    pub damage_received: i64,
    pub defender_killed: i32,
}

impl AttackPossibility {
    /// Estimates `attack` from `dest`, including the answer of the defender.
    pub fn evaluate(
        attack: &AttackInfo<'_>,
        dest: BattleHex,
        estimator: &dyn DamageEstimator,
    ) -> Self {
        let dealt = estimator
            .estimate(attack)
            .average()
            .clamp(0, attack.defender.available_health());

        let mut survivor = attack.defender.acquire();
        survivor.damage(dealt);

        let received = if !attack.shooting && survivor.alive() && survivor.able_to_retaliate() {
            estimator
                .estimate(&AttackInfo::new(&survivor, attack.attacker, false))
                .average()
                .clamp(0, attack.attacker.available_health())
        } else {
            0
        };

        Self {
            attacker: attack.attacker.unit_id(),
            defender: attack.defender.unit_id(),
            shooting: attack.shooting,
            dest,
            charged_fields: attack.charged_fields,
            damage_dealt: dealt,
            damage_received: received,
            defender_killed: attack.defender.count() - survivor.count(),
        }
    }

    /// Net health swing in the attacker's favour.
    pub fn attack_value(&self) -> i64 {
        self.damage_dealt - self.damage_received
    }
}
