//! DAO directory.
//!
//! ## Identity
//!
//! `dao_id` is handed out by a counter that starts at 1. Ids are never
//! reused, not after `delorg` and not after `reset`: offer books and balance
//! rows outlive their DAO and stay keyed by its id. Only `resetsttngs`,
//! which wipes those tables too, restarts the counter. Names are unique
//! across live DAOs.
//!
//! ## Provisioning
//!
//! `create` asks the host to buy RAM and delegate bandwidth for the new DAO
//! when the corresponding settings are present and positive.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::error::RegistryError;
use crate::registry::settings::{CPU_STAKE_KEY, NET_STAKE_KEY, RAM_BYTES_KEY};
use crate::registry::{ActionContext, RegistryState, TokenRegistry};
use crate::types::{ActionReceipt, Name, OutboundAction, VariantValue};

/// A registered organization.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dao {
    pub dao_id: u64,

    /// Unique DAO name
    pub dao: Name,

    pub creator: Name,

    /// Content hash of the DAO's public metadata
    pub ipfs: String,

    /// Attributes in first-insertion order, keys unique
    pub attributes: Vec<(String, VariantValue)>,

    /// Tokens the DAO accepts
    pub tokens: TokenRegistry,
}

impl Dao {
    pub fn attribute(&self, key: &str) -> Option<&VariantValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Overwrite existing keys in place, append new ones
    pub fn upsert_attributes(&mut self, pairs: Vec<(String, VariantValue)>) {
        for (key, value) in pairs {
            match self.attributes.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => self.attributes.push((key, value)),
            }
        }
    }

    /// Remove keys; unknown keys are ignored
    pub fn delete_attributes(&mut self, keys: &[String]) {
        self.attributes.retain(|(k, _)| !keys.contains(k));
    }
}

/// All DAOs, ordered by id.
///
/// Rows are shared between clones and copied on first write.
#[derive(Debug, Clone)]
pub struct DaoDirectory {
    daos: BTreeMap<u64, Arc<Dao>>,
    by_name: BTreeMap<Name, u64>,
    next_id: u64,
}

impl Default for DaoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DaoDirectory {
    pub fn new() -> Self {
        Self {
            daos: BTreeMap::new(),
            by_name: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register a new DAO
    ///
    /// # Returns
    ///
    /// The assigned `dao_id`
    pub fn insert(&mut self, dao: Name, creator: Name, ipfs: String) -> Result<u64, RegistryError> {
        if self.by_name.contains_key(&dao) {
            return Err(RegistryError::DuplicateName(dao));
        }

        let dao_id = self.next_id;
        self.next_id += 1;

        self.by_name.insert(dao, dao_id);
        self.daos.insert(
            dao_id,
            Arc::new(Dao {
                dao_id,
                dao,
                creator,
                ipfs,
                attributes: Vec::new(),
                tokens: TokenRegistry::new(),
            }),
        );
        Ok(dao_id)
    }

    pub fn get(&self, dao_id: u64) -> Option<&Dao> {
        self.daos.get(&dao_id).map(Arc::as_ref)
    }

    pub fn find_by_name(&self, dao: Name) -> Option<&Dao> {
        self.by_name.get(&dao).and_then(|id| self.get(*id))
    }

    /// DAO by id, or `OrgNotFound`
    pub fn require(&self, dao_id: u64) -> Result<&Dao, RegistryError> {
        self.get(dao_id).ok_or(RegistryError::OrgNotFound)
    }

    pub(crate) fn require_mut(&mut self, dao_id: u64) -> Result<&mut Dao, RegistryError> {
        self.daos
            .get_mut(&dao_id)
            .map(Arc::make_mut)
            .ok_or(RegistryError::OrgNotFound)
    }

    pub fn remove(&mut self, dao_id: u64) -> Result<Dao, RegistryError> {
        let dao = self.daos.remove(&dao_id).ok_or(RegistryError::OrgNotFound)?;
        self.by_name.remove(&dao.dao);
        Ok(Arc::unwrap_or_clone(dao))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dao> {
        self.daos.values().map(Arc::as_ref)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.daos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.daos.is_empty()
    }

    /// Drop every DAO; the id counter keeps counting
    pub fn clear(&mut self) {
        self.daos.clear();
        self.by_name.clear();
    }

    /// Id the next created DAO will get
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

// ============================================================================
// Actions
// ============================================================================

impl RegistryState {
    pub(crate) fn create(
        &mut self,
        ctx: &ActionContext,
        dao: Name,
        creator: Name,
        ipfs: String,
        receipt: &mut ActionReceipt,
    ) -> Result<(), RegistryError> {
        ctx.require_auth(creator)?;
        let dao_id = self.directory.insert(dao, creator, ipfs)?;

        if let Some(bytes) = skip_missing(self.settings.get_uint64(RAM_BYTES_KEY))? {
            if bytes > 0 {
                receipt.outbound.push(OutboundAction::BuyRamBytes {
                    payer: self.account,
                    receiver: dao,
                    bytes: u32::try_from(bytes).map_err(|_| RegistryError::Overflow)?,
                });
            }
        }

        let net = skip_missing(self.settings.get_asset(NET_STAKE_KEY))?;
        let cpu = skip_missing(self.settings.get_asset(CPU_STAKE_KEY))?;
        if let (Some(net), Some(cpu)) = (net, cpu) {
            if !net.is_zero() && !cpu.is_zero() {
                receipt.outbound.push(OutboundAction::DelegateBandwidth {
                    from: self.account,
                    receiver: dao,
                    net,
                    cpu,
                    transfer: true,
                });
            }
        }

        info!(dao_id, %dao, %creator, "DAO created");
        Ok(())
    }

    pub(crate) fn update(&mut self, ctx: &ActionContext, dao_id: u64, ipfs: String) -> Result<(), RegistryError> {
        let dao = self.directory.require_mut(dao_id)?;
        ctx.require_auth(dao.creator)?;
        dao.ipfs = ipfs;

        info!(dao_id, "DAO updated");
        Ok(())
    }

    pub(crate) fn delorg(&mut self, ctx: &ActionContext, dao_id: u64) -> Result<(), RegistryError> {
        self.directory.require(dao_id)?;
        self.require_admin(ctx)?;
        let dao = self.directory.remove(dao_id)?;

        info!(dao_id, dao = %dao.dao, "DAO deleted");
        Ok(())
    }

    pub(crate) fn upsertattrs(
        &mut self,
        ctx: &ActionContext,
        dao_id: u64,
        attributes: Vec<(String, VariantValue)>,
    ) -> Result<(), RegistryError> {
        let dao = self.directory.require_mut(dao_id)?;
        ctx.require_auth(dao.creator)?;
        dao.upsert_attributes(attributes);
        Ok(())
    }

    pub(crate) fn delattrs(&mut self, ctx: &ActionContext, dao_id: u64, keys: &[String]) -> Result<(), RegistryError> {
        let dao = self.directory.require_mut(dao_id)?;
        ctx.require_auth(dao.creator)?;
        dao.delete_attributes(keys);
        Ok(())
    }

    pub(crate) fn reset(&mut self, ctx: &ActionContext) -> Result<(), RegistryError> {
        self.require_admin(ctx)?;
        self.directory.clear();

        info!(next_dao_id = self.directory.next_id(), "DAO directory reset");
        Ok(())
    }
}

/// Treat a missing setting as absent
fn skip_missing<T>(result: Result<T, RegistryError>) -> Result<Option<T>, RegistryError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RegistryError::SettingNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
