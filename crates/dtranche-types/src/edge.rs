//! Permission edges between protocol components.
//!
//! An edge `(subject, object, relation)` says the object contract must
//! recognise the subject's address in the given role, e.g. the senior token
//! must accept the vault as its vault, and the protocol token must accept the
//! vault as a minter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{Capability, ComponentKind};

/// Role the subject plays on the object contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Object is a tranche token; subject is its vault (`isVault` / `setVault`).
    IsVaultOf,
    /// Object is the protocol token; subject may mint it (`isMinter` / `addMinter`).
    IsMinterOf,
}

impl Relation {
    /// Capability the object contract needs for this relation.
    pub fn required_capability(&self) -> Capability {
        match self {
            Self::IsVaultOf => Capability::VaultRegistry,
            Self::IsMinterOf => Capability::MinterRegistry,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsVaultOf => f.write_str("isVaultOf"),
            Self::IsMinterOf => f.write_str("isMinterOf"),
        }
    }
}

/// A required permission link between two components.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionEdge {
    /// Component being granted the role.
    pub subject: ComponentKind,
    /// Component whose state records the grant.
    pub object: ComponentKind,
    /// The role.
    pub relation: Relation,
}

impl PermissionEdge {
    /// Create an edge.
    pub fn new(subject: ComponentKind, object: ComponentKind, relation: Relation) -> Self {
        Self {
            subject,
            object,
            relation,
        }
    }

    /// Edges the vault needs before it can operate: it must be the vault of
    /// both tranche tokens and a minter of the protocol token.
    pub fn vault_edges() -> Vec<PermissionEdge> {
        vec![
            Self::new(ComponentKind::Vault, ComponentKind::SeniorToken, Relation::IsVaultOf),
            Self::new(ComponentKind::Vault, ComponentKind::JuniorToken, Relation::IsVaultOf),
            Self::new(ComponentKind::Vault, ComponentKind::ProtocolToken, Relation::IsMinterOf),
        ]
    }

    /// Edge a reward pool needs to mint the rewards it distributes.
    pub fn reward_pool_edge(pool: ComponentKind) -> PermissionEdge {
        Self::new(pool, ComponentKind::ProtocolToken, Relation::IsMinterOf)
    }
}

impl fmt::Display for PermissionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.relation, self.object)
    }
}
