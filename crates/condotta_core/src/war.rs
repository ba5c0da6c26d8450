//! War entities.

use crate::faction::Faction;

/// The two sides of a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum WarSide {
    /// The declaring faction.
    Attacker,
    /// The faction the war was declared on.
    Defender,
}

/// A war row.
///
/// At most one war per guild is `active`; resolution deactivates the row
/// rather than deleting it. A later war gets a fresh row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct War {
    /// Serial row id.
    pub id: i32,
    /// Guild the war is scoped to.
    pub guild_id: i64,
    /// Declaring faction.
    pub attacker_faction_id: i32,
    /// Defending faction.
    pub defender_faction_id: i32,
    /// Whether the war is still being scored.
    pub active: bool,
    /// Qualifying messages counted for the attacker.
    pub attacker_messages: i64,
    /// Qualifying messages counted for the defender.
    pub defender_messages: i64,
}

impl War {
    /// Which side the given faction fights on, if either.
    pub fn side_of(&self, faction_id: i32) -> Option<WarSide> {
        if faction_id == self.attacker_faction_id {
            Some(WarSide::Attacker)
        } else if faction_id == self.defender_faction_id {
            Some(WarSide::Defender)
        } else {
            None
        }
    }

    /// Message count for the given side.
    pub fn messages(&self, side: WarSide) -> i64 {
        match side {
            WarSide::Attacker => self.attacker_messages,
            WarSide::Defender => self.defender_messages,
        }
    }
}

/// Fields for inserting a new war row.
///
/// New wars start active with both counters at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewWar {
    /// Guild the war is scoped to.
    pub guild_id: i64,
    /// Declaring faction.
    pub attacker_faction_id: i32,
    /// Defending faction.
    pub defender_faction_id: i32,
}

/// Read-only report of the active war.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarReport {
    /// Declaring faction.
    pub attacker: Faction,
    /// Defending faction.
    pub defender: Faction,
    /// Messages counted for the attacker.
    pub attacker_messages: i64,
    /// Messages counted for the defender.
    pub defender_messages: i64,
}

/// Result of resolving a war.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarOutcome {
    /// Equal counts: the war deactivates and nothing is destroyed.
    Draw {
        /// Declaring faction.
        attacker: Faction,
        /// Defending faction.
        defender: Faction,
        /// The shared message count.
        messages: i64,
    },
    /// One side strictly outscored the other; the loser was destroyed.
    Victory {
        /// The winning faction.
        winner: Faction,
        /// The destroyed faction.
        loser: Faction,
        /// Winner's message count.
        winner_messages: i64,
        /// Loser's message count.
        loser_messages: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn war() -> War {
        War {
            id: 1,
            guild_id: 10,
            attacker_faction_id: 2,
            defender_faction_id: 3,
            active: true,
            attacker_messages: 4,
            defender_messages: 7,
        }
    }

    #[test]
    fn side_of_distinguishes_participants() {
        let war = war();
        assert_eq!(war.side_of(2), Some(WarSide::Attacker));
        assert_eq!(war.side_of(3), Some(WarSide::Defender));
        assert_eq!(war.side_of(9), None);
    }

    #[test]
    fn messages_reads_the_matching_counter() {
        let war = war();
        assert_eq!(war.messages(WarSide::Attacker), 4);
        assert_eq!(war.messages(WarSide::Defender), 7);
    }
}
