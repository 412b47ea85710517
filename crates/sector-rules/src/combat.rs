//! Opposed attribute checks and attack resolution.
//!
//! Each side rolls 1d10 and adds the rating named by the attack pattern.
//! The attacker wins on a higher total; equal totals are a tie in which
//! both sides deal damage, unless a tag makes one side lose ties outright.

use crate::error::{InvariantViolation, RuleError};
use sector_core::dice::CHECK_DIE_SIDES;
use sector_core::tags::{self, RollModifiers, RollPurpose};
use sector_core::{
    find_faction, AssetDefId, AssetId, AttackPattern, Catalog, Change, ChangeSet, DiceExpr,
    DieRoller, Faction, FactionId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tag-driven roll adjustments for both sides of a check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagContext {
    pub attacker: RollModifiers,
    pub defender: RollModifiers,
}

impl TagContext {
    /// Context for `attacker` hitting an asset of `defender` that stands on
    /// `defending_on_homeworld`.
    pub fn for_attack(
        attacker: &Faction,
        defender: &Faction,
        pattern: &AttackPattern,
        defending_on_homeworld: bool,
    ) -> Self {
        Self {
            attacker: tags::roll_modifiers(
                attacker.tags.iter(),
                RollPurpose::Attack {
                    attribute: pattern.attacker,
                },
            ),
            defender: tags::roll_modifiers(
                defender.tags.iter(),
                RollPurpose::Defense {
                    attribute: pattern.defender,
                    on_homeworld: defending_on_homeworld,
                },
            ),
        }
    }
}

/// One side's 1d10, with every die that was thrown for the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRoll {
    pub kept: u32,
    pub dice: Vec<u32>,
}

/// Roll a single check die under `mods`.
pub fn check_roll<D: DieRoller + ?Sized>(dice: &mut D, mods: RollModifiers) -> CheckRoll {
    let mut thrown = Vec::with_capacity(4);
    let mut one = |thrown: &mut Vec<u32>| {
        let mut v = dice.roll_die(CHECK_DIE_SIDES);
        thrown.push(v);
        if mods.reroll_ones && v == 1 {
            v = dice.roll_die(CHECK_DIE_SIDES);
            thrown.push(v);
        }
        v
    };
    let mut kept = one(&mut thrown);
    if mods.extra_die {
        kept = kept.max(one(&mut thrown));
    }
    CheckRoll {
        kept,
        dice: thrown,
    }
}

/// Full breakdown of an opposed check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposedRoll {
    pub attacker_roll: u32,
    pub defender_roll: u32,
    pub attacker_dice: Vec<u32>,
    pub defender_dice: Vec<u32>,
    pub attacker_rating: u8,
    pub defender_rating: u8,
    pub attacker_total: i32,
    pub defender_total: i32,
    pub margin: i32,
    pub success: bool,
    pub tie: bool,
}

/// Roll attacker against defender.
pub fn opposed_roll<D: DieRoller + ?Sized>(
    dice: &mut D,
    attacker_value: u8,
    defender_value: u8,
    ctx: &TagContext,
) -> OpposedRoll {
    let a = check_roll(dice, ctx.attacker);
    let d = check_roll(dice, ctx.defender);
    settle(a, d, attacker_value, defender_value, ctx)
}

fn settle(
    a: CheckRoll,
    d: CheckRoll,
    attacker_value: u8,
    defender_value: u8,
    ctx: &TagContext,
) -> OpposedRoll {
    let attacker_total = a.kept as i32 + i32::from(attacker_value);
    let defender_total = d.kept as i32 + i32::from(defender_value);
    let margin = attacker_total - defender_total;
    let (success, tie) = if margin != 0 {
        (margin > 0, false)
    } else {
        match (ctx.attacker.loses_ties, ctx.defender.loses_ties) {
            (true, false) => (false, false),
            (false, true) => (true, false),
            // Neither or both: an ordinary tie.
            _ => (false, true),
        }
    };
    OpposedRoll {
        attacker_roll: a.kept,
        defender_roll: d.kept,
        attacker_dice: a.dice,
        defender_dice: d.dice,
        attacker_rating: attacker_value,
        defender_rating: defender_value,
        attacker_total,
        defender_total,
        margin,
        success,
        tie,
    }
}

/// Damage rolled after a check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage to the defending asset.
    pub attack_damage: i32,
    /// Damage to the attacking asset.
    pub counter_damage: i32,
    pub attack_rolled: Option<DiceExpr>,
    pub counter_rolled: Option<DiceExpr>,
}

/// Roll the damage a check calls for.
///
/// Tie: both attack and counter damage. Success: attack damage only.
/// Failure: counter damage only. A missing or `none` counter deals nothing.
pub fn resolve_damage<D: DieRoller + ?Sized>(
    dice: &mut D,
    roll: &OpposedRoll,
    attack: Option<&AttackPattern>,
    counter: Option<&DiceExpr>,
) -> Result<DamageOutcome, InvariantViolation> {
    let attack = attack.ok_or(InvariantViolation::MissingAttackPattern)?;
    Ok(damage_for(dice, roll, attack, counter))
}

fn damage_for<D: DieRoller + ?Sized>(
    dice: &mut D,
    roll: &OpposedRoll,
    attack: &AttackPattern,
    counter: Option<&DiceExpr>,
) -> DamageOutcome {
    let counter = counter.filter(|c| !c.is_zero());
    let mut out = DamageOutcome::default();
    if roll.success || roll.tie {
        out.attack_damage = clamp_damage(attack.damage.roll(dice));
        out.attack_rolled = Some(attack.damage);
    }
    if !roll.success {
        if let Some(c) = counter {
            out.counter_damage = clamp_damage(c.roll(dice));
            out.counter_rolled = Some(*c);
        }
    }
    out
}

fn clamp_damage(v: i64) -> i32 {
    i32::try_from(v.max(0)).unwrap_or(i32::MAX)
}

/// Who attacks whom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub attacker: FactionId,
    pub attacking_asset: AssetId,
    pub defender: FactionId,
    pub defending_asset: AssetId,
}

/// Audit trail of a resolved attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub order: AttackOrder,
    pub attacker_def: AssetDefId,
    pub defender_def: AssetDefId,
    pub pattern: AttackPattern,
    pub roll: OpposedRoll,
    pub damage: DamageOutcome,
    /// The defender was acquired this turn and could not strike back.
    pub counter_suppressed: bool,
    /// Damage mirrored onto the defending faction by a hit on its claim.
    pub faction_damage: i32,
    pub defender_destroyed: bool,
    pub attacker_destroyed: bool,
}

/// Resolve an attack between two co-located assets.
pub fn resolve_attack<D: DieRoller + ?Sized>(
    dice: &mut D,
    catalog: &Catalog,
    factions: &[Faction],
    order: AttackOrder,
    turn: u32,
) -> Result<(AttackReport, ChangeSet), RuleError> {
    if order.attacker == order.defender {
        return Err(RuleError::SameFaction);
    }
    let att_f = find_faction(factions, order.attacker)
        .ok_or(RuleError::UnknownFaction(order.attacker))?;
    let def_f = find_faction(factions, order.defender)
        .ok_or(RuleError::UnknownFaction(order.defender))?;
    let att_asset = att_f
        .asset(order.attacking_asset)
        .ok_or(RuleError::UnknownAsset {
            faction: order.attacker,
            asset: order.attacking_asset,
        })?;
    let def_asset = def_f
        .asset(order.defending_asset)
        .ok_or(RuleError::UnknownAsset {
            faction: order.defender,
            asset: order.defending_asset,
        })?;
    let att_def = catalog
        .get(&att_asset.def)
        .ok_or_else(|| RuleError::UnknownDefinition(att_asset.def.clone()))?;
    let def_def = catalog
        .get(&def_asset.def)
        .ok_or_else(|| RuleError::UnknownDefinition(def_asset.def.clone()))?;
    let pattern = att_def
        .attack
        .as_ref()
        .ok_or_else(|| RuleError::CannotAttack(att_def.id.clone()))?;
    if !att_asset.is_ready(turn) {
        return Err(RuleError::NotReady {
            asset: att_asset.id,
            ready_on: att_asset.acquired_turn() + 1,
        });
    }
    if att_asset.location != def_asset.location {
        return Err(RuleError::NotCoLocated {
            attacker_at: att_asset.location,
            defender_at: def_asset.location,
        });
    }
    if def_asset.stealthed {
        return Err(RuleError::Stealthed(def_asset.id));
    }

    let on_home = def_asset.location == def_f.homeworld;
    let ctx = TagContext::for_attack(att_f, def_f, pattern, on_home);
    let roll = opposed_roll(
        dice,
        att_f.rating(pattern.attacker),
        def_f.rating(pattern.defender),
        &ctx,
    );
    let counter_suppressed = !def_asset.is_ready(turn);
    let counter = if counter_suppressed {
        None
    } else {
        def_def.counter_damage()
    };
    let damage = damage_for(dice, &roll, pattern, counter);

    let mut set = ChangeSet::new();
    let mut faction_damage = 0;
    let defender_destroyed = damage.attack_damage > 0 && damage.attack_damage >= def_asset.hp;
    if damage.attack_damage > 0 {
        set.push(Change::DamageAsset {
            faction: def_f.id,
            asset: def_asset.id,
            amount: damage.attack_damage,
        });
        if def_def.is_base_of_influence() {
            faction_damage = damage.attack_damage.min(def_asset.hp);
            set.push(Change::DamageFaction {
                faction: def_f.id,
                amount: faction_damage,
            });
        }
        if defender_destroyed {
            set.push(Change::DestroyAsset {
                faction: def_f.id,
                asset: def_asset.id,
            });
        }
    }
    let attacker_destroyed = damage.counter_damage > 0 && damage.counter_damage >= att_asset.hp;
    if damage.counter_damage > 0 {
        set.push(Change::DamageAsset {
            faction: att_f.id,
            asset: att_asset.id,
            amount: damage.counter_damage,
        });
        if attacker_destroyed {
            set.push(Change::DestroyAsset {
                faction: att_f.id,
                asset: att_asset.id,
            });
        }
    }

    debug!(?roll, ?damage, "attack rolled");
    info!(
        attacker = %att_f.name,
        defender = %def_f.name,
        asset = %att_def.name,
        target = %def_def.name,
        margin = roll.margin,
        hit = damage.attack_damage,
        counter = damage.counter_damage,
        "attack resolved"
    );
    let report = AttackReport {
        order,
        attacker_def: att_def.id.clone(),
        defender_def: def_def.id.clone(),
        pattern: pattern.clone(),
        roll,
        damage,
        counter_suppressed,
        faction_damage,
        defender_destroyed,
        attacker_destroyed,
    };
    Ok((report, set))
}
