//! Core engine for the Condotta faction bot.
//!
//! This crate contains the transport-independent heart of the system: the
//! entity model, the [`FactionStore`] and [`Provisioner`] seams, and the
//! three managers that coordinate them:
//!
//! - [`FactionLifecycle`] creates and destroys factions, keeping durable
//!   rows and externally provisioned resources consistent through a
//!   debit → provision → commit saga with reverse compensation.
//! - [`MembershipSync`] applies invite/join/kick/promote/demote/leave while
//!   keeping the membership table and externally visible ranks in lockstep.
//! - [`WarTracker`] runs the per-guild war state machine and resolves wars
//!   by destroying the losing faction.
//!
//! Mutations on the same faction or guild are serialized through
//! [`EntityLocks`]; currency awards are throttled by the process-scoped
//! [`CooldownCache`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cooldown;
mod currency;
mod faction;
mod lifecycle;
mod locks;
mod membership;
mod policy;
mod provision;
pub mod store;
mod war;
mod warfare;

pub use cooldown::CooldownCache;
pub use currency::{AWARD_PER_MESSAGE, CurrencyLedger};
pub use faction::{ChannelSet, Faction, FactionInfo, Membership, NewFaction, Rank, RoleSet};
pub use lifecycle::{DEFAULT_CREATE_COST, FactionLifecycle};
pub use locks::{EntityLocks, LockKey};
pub use membership::MembershipSync;
pub use policy::{Action, Actor, authorize};
pub use provision::{
    Capability, ChannelKind, ChannelSpec, Overwrite, OverwriteParty, Provisioner, ResourceId,
    member_overwrites, panel_overwrites,
};
pub use store::{FactionStore, MemoryStore};
pub use war::{NewWar, War, WarOutcome, WarReport, WarSide};
pub use warfare::WarTracker;
