use sector_core::{AssetDefId, AssetId, FactionId, SystemId};
use thiserror::Error;

/// A caller broke a precondition it is responsible for. Never produced by
/// ordinary play.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("combat resolved without an attack pattern")]
    MissingAttackPattern,
}

/// Reasons a rules request is refused. Nothing is changed when one is
/// returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("unknown faction {0}")]
    UnknownFaction(FactionId),
    #[error("{faction} owns no asset {asset}")]
    UnknownAsset { faction: FactionId, asset: AssetId },
    #[error("unknown asset definition {0}")]
    UnknownDefinition(AssetDefId),
    #[error("unknown system {0}")]
    UnknownSystem(SystemId),
    #[error("a faction cannot target itself")]
    SameFaction,
    #[error("{0} has no attack")]
    CannotAttack(AssetDefId),
    #[error("{asset} was acquired this turn and can act from turn {ready_on}")]
    NotReady { asset: AssetId, ready_on: u32 },
    #[error("{attacker_at} and {defender_at} are different worlds")]
    NotCoLocated {
        attacker_at: SystemId,
        defender_at: SystemId,
    },
    #[error("{0} is stealthed and cannot be targeted")]
    Stealthed(AssetId),
    #[error("insufficient FacCreds: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },
    #[error("a Base of Influence needs at least 1 hp, asked for {0}")]
    InvalidHp(i32),
    #[error("no non-claim asset present on {0}")]
    NoPresence(SystemId),
    #[error("a Base of Influence already stands on {0}")]
    AlreadyClaimed(SystemId),
    #[error("a campaign is already under way")]
    CampaignActive,
    #[error("no campaign is under way")]
    NoCampaign,
    #[error("the faction already governs {0}")]
    AlreadyGoverned(SystemId),
    #[error("cannot seize {0}: no fighting asset there or rivals remain in the open")]
    SeizureBlocked(SystemId),
    #[error("{0} is already the homeworld")]
    AlreadyHome(SystemId),
    #[error("no Base of Influence on {0}")]
    NoBaseOnTarget(SystemId),
    #[error("{0} is out of movement range")]
    OutOfRange(SystemId),
    #[error("{0} cannot be moved by this ability")]
    NotMovable(AssetId),
    #[error("at most {0} assets may move at once")]
    TooManyAssets(u32),
    #[error("no assets selected to move")]
    NothingToMove,
}
