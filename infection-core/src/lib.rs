//! Infection core library.
//!
//! Models version propagation through a directed user graph. A
//! [`Population`] owns users, their versions and their outgoing edges, and
//! exposes two ways of upgrading ("infecting") users:
//!
//! - [`Population::full_infection`] upgrades the whole connected component of
//!   a seed user.
//! - [`Population::limited_infection`] upgrades a requested number of users,
//!   assembled from whole connected components explored in ascending rank
//!   order (see [`rank()`]).
//!
//! Connectivity and ranking always operate on the [symmetrized](Adjacency)
//! view of the graph, so an edge in either direction links two users.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod adjacency;
mod builder;
mod error;
#[cfg(feature = "generate")]
mod generate;
mod population;
mod rank;
mod selector;
mod trace;

use std::collections::BTreeMap;

pub use crate::{
    adjacency::Adjacency,
    builder::PopulationBuilder,
    error::{InfectionError, InfectionErrorCode, Result},
    population::Population,
    rank::{RankConfig, Ranks, rank, rank_adjacency},
    selector::{Selection, SelectionOutcome, select_limited},
    trace::trace_component,
};

#[cfg(feature = "generate")]
pub use crate::generate::{GenerationConfig, user_name};

/// Mapping from user identifier to its current version.
pub type UserVersions = BTreeMap<String, u64>;

/// Mapping from user identifier to the users it links to (directed edges).
pub type UserGraph = BTreeMap<String, Vec<String>>;
