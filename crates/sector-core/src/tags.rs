//! Faction tags and the rule modifiers they grant.

use crate::model::Attribute;
use serde::{Deserialize, Serialize};

/// Highest world tech level.
pub const MAX_TECH_LEVEL: u8 = 5;

/// A faction tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Homeworld counts as TL4 and grants permission for gated assets.
    Colonists,
    /// Extra die when defending on the homeworld.
    DeepRooted,
    /// May field gengineered assets.
    EugenicsCultists,
    /// Rerolls ones but always loses ties.
    Fanatical,
    /// Extra die on influence expansion.
    Imperialists,
    /// Extra die on Cunning attacks.
    Machiavellian,
    /// Rules its homeworld outright.
    PlanetaryGovernment,
    /// Extra die on Wealth attacks.
    Plutocratic,
    /// Controlled worlds count one tech level higher.
    PreceptorArchive,
    /// Controlled worlds count as at least TL4.
    TechnicalExpertise,
    /// Extra die on Force attacks.
    Warlike,
}

/// Why a die is being rolled; tags react to different situations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollPurpose {
    Attack { attribute: Attribute },
    Defense { attribute: Attribute, on_homeworld: bool },
    Expansion,
    ExpansionRival,
}

/// Composable adjustments to a single 1d10 check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollModifiers {
    /// Roll a second die and keep the higher.
    pub extra_die: bool,
    /// A natural 1 is rolled again once.
    pub reroll_ones: bool,
    /// A margin of zero counts as a loss for this side.
    pub loses_ties: bool,
}

impl RollModifiers {
    pub fn merge(self, other: RollModifiers) -> RollModifiers {
        RollModifiers {
            extra_die: self.extra_die || other.extra_die,
            reroll_ones: self.reroll_ones || other.reroll_ones,
            loses_ties: self.loses_ties || other.loses_ties,
        }
    }
}

/// How a tag adjusts the tech level of a world the faction controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TechBonus {
    None,
    AtLeast(u8),
    Plus(u8),
}

impl TechBonus {
    pub fn apply(self, tech_level: u8) -> u8 {
        match self {
            TechBonus::None => tech_level,
            TechBonus::AtLeast(floor) => tech_level.max(floor),
            TechBonus::Plus(n) => tech_level.saturating_add(n).min(MAX_TECH_LEVEL),
        }
    }
}

impl Tag {
    /// Roll adjustments this tag grants for `purpose`.
    pub fn roll_modifiers(self, purpose: RollPurpose) -> RollModifiers {
        let mut m = RollModifiers::default();
        match (self, purpose) {
            (Tag::Fanatical, _) => {
                m.reroll_ones = true;
                m.loses_ties = true;
            }
            (
                Tag::DeepRooted,
                RollPurpose::Defense {
                    on_homeworld: true, ..
                },
            ) => m.extra_die = true,
            (Tag::Imperialists, RollPurpose::Expansion) => m.extra_die = true,
            (
                Tag::Machiavellian,
                RollPurpose::Attack {
                    attribute: Attribute::Cunning,
                },
            )
            | (
                Tag::Plutocratic,
                RollPurpose::Attack {
                    attribute: Attribute::Wealth,
                },
            )
            | (
                Tag::Warlike,
                RollPurpose::Attack {
                    attribute: Attribute::Force,
                },
            ) => m.extra_die = true,
            _ => {}
        }
        m
    }

    /// Tech bonus on a world the faction controls.
    pub fn tech_bonus(self, is_homeworld: bool) -> TechBonus {
        match self {
            Tag::TechnicalExpertise => TechBonus::AtLeast(4),
            Tag::PreceptorArchive => TechBonus::Plus(1),
            Tag::Colonists if is_homeworld => TechBonus::AtLeast(4),
            _ => TechBonus::None,
        }
    }

    /// Whether the tag stands in for planetary-government permission.
    pub fn grants_permission(self, is_homeworld: bool) -> bool {
        is_homeworld && matches!(self, Tag::PlanetaryGovernment | Tag::Colonists)
    }
}

/// Combined roll adjustments of every tag in `tags`.
pub fn roll_modifiers<'a, I>(tags: I, purpose: RollPurpose) -> RollModifiers
where
    I: IntoIterator<Item = &'a Tag>,
{
    tags.into_iter()
        .fold(RollModifiers::default(), |acc, t| {
            acc.merge(t.roll_modifiers(purpose))
        })
}

/// Apply every tag's tech bonus to a controlled world's tech level.
pub fn boosted_tech_level<'a, I>(tags: I, tech_level: u8, is_homeworld: bool) -> u8
where
    I: IntoIterator<Item = &'a Tag>,
{
    // Floors first so a flat bonus stacks on top of them.
    let mut floors = Vec::new();
    let mut plus = 0u8;
    for t in tags {
        match t.tech_bonus(is_homeworld) {
            TechBonus::AtLeast(f) => floors.push(f),
            TechBonus::Plus(n) => plus = plus.saturating_add(n),
            TechBonus::None => {}
        }
    }
    let floored = floors
        .into_iter()
        .fold(tech_level, |tl, f| TechBonus::AtLeast(f).apply(tl));
    TechBonus::Plus(plus).apply(floored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_rooted_only_at_home() {
        let home = RollPurpose::Defense {
            attribute: Attribute::Force,
            on_homeworld: true,
        };
        let away = RollPurpose::Defense {
            attribute: Attribute::Force,
            on_homeworld: false,
        };
        assert!(Tag::DeepRooted.roll_modifiers(home).extra_die);
        assert!(!Tag::DeepRooted.roll_modifiers(away).extra_die);
    }

    #[test]
    fn attack_tags_match_attribute() {
        let force = RollPurpose::Attack {
            attribute: Attribute::Force,
        };
        assert!(Tag::Warlike.roll_modifiers(force).extra_die);
        assert!(!Tag::Plutocratic.roll_modifiers(force).extra_die);
        assert!(!Tag::Machiavellian.roll_modifiers(force).extra_die);
    }

    #[test]
    fn modifiers_compose() {
        let tags = [Tag::Fanatical, Tag::Imperialists];
        let m = roll_modifiers(tags.iter(), RollPurpose::Expansion);
        assert!(m.extra_die && m.reroll_ones && m.loses_ties);
    }

    #[test]
    fn tech_bonus_stacking() {
        let tags = [Tag::PreceptorArchive, Tag::TechnicalExpertise];
        assert_eq!(boosted_tech_level(tags.iter(), 1, false), 5);
        assert_eq!(boosted_tech_level(tags.iter(), 5, false), 5);
        assert_eq!(boosted_tech_level([Tag::Colonists].iter(), 0, false), 0);
        assert_eq!(boosted_tech_level([Tag::Colonists].iter(), 0, true), 4);
    }
}
