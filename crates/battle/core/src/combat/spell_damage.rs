use crate::bonus::{BonusBearer, BonusKind, NO_SUBTYPE};
use crate::spells::SpellDefinition;

/// Applies the target's spell damage modifiers to raw spell damage.
///
/// Reductions matching any of the spell's schools (or all schools) are summed
/// and capped at 100 percent. Extra damage from this particular spell is
/// applied afterwards.
pub fn adjust_spell_damage(spell: &SpellDefinition, target: &dyn BonusBearer, raw: i64) -> i64 {
    let reduction = target
        .value_of(&|b| {
            b.kind == BonusKind::SpellDamageReduction
                && (b.subtype == NO_SUBTYPE
                    || spell.schools.iter().any(|school| school.index() == b.subtype))
        })
        .clamp(0, 100);
    let mut damage = raw * i64::from(100 - reduction) / 100;

    let extra = target.value_of_subtype(BonusKind::MoreDamageFromSpell, spell.id.0);
    if extra != 0 {
        damage = damage * i64::from(100 + extra) / 100;
    }
    damage.max(0)
}
