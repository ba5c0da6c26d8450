//! Shared test harness: in-memory store plus a scripted fake provisioner.

use async_trait::async_trait;
use condotta_core::{
    ChannelSpec, CurrencyLedger, EntityLocks, Faction, FactionLifecycle, FactionStore,
    MembershipSync, MemoryStore, Provisioner, ResourceId, WarTracker,
};
use condotta_error::{CondottaResult, ProvisionError, ProvisionErrorKind};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fake provisioner that hands out sequential ids, records every call, and
/// can be scripted to fail the nth creation call or all role grants.
#[derive(Default)]
pub struct FakeProvisioner {
    next_id: AtomicI64,
    create_calls: AtomicUsize,
    /// Fail the creation call with this zero-based index (and later ones).
    pub fail_create_from: Mutex<Option<usize>>,
    /// Fail every grant_role call.
    pub fail_grants: Mutex<bool>,
    pub created: Mutex<Vec<ResourceId>>,
    pub deleted: Mutex<Vec<ResourceId>>,
    pub grants: Mutex<Vec<(i64, i64)>>,
    pub revokes: Mutex<Vec<(i64, i64)>>,
    pub messages: Mutex<Vec<(i64, String)>>,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_create(&self) -> CondottaResult<i64> {
        let index = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(from) = *self.fail_create_from.lock().unwrap()
            && index >= from
        {
            return Err(ProvisionError::new(ProvisionErrorKind::Channel(format!(
                "scripted failure at call {index}"
            )))
            .into());
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Ids created so far, in creation order.
    pub fn created_ids(&self) -> Vec<ResourceId> {
        self.created.lock().unwrap().clone()
    }

    /// Ids deleted so far, in deletion order.
    pub fn deleted_ids(&self) -> Vec<ResourceId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn posted_messages(&self) -> Vec<(i64, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn create_role(&self, _guild_id: i64, _name: &str) -> CondottaResult<i64> {
        let id = self.next_create()?;
        self.created.lock().unwrap().push(ResourceId::Role(id));
        Ok(id)
    }

    async fn create_container(&self, _guild_id: i64, _name: &str) -> CondottaResult<i64> {
        let id = self.next_create()?;
        self.created.lock().unwrap().push(ResourceId::Container(id));
        Ok(id)
    }

    async fn create_channel(&self, _guild_id: i64, _spec: &ChannelSpec<'_>) -> CondottaResult<i64> {
        let id = self.next_create()?;
        self.created.lock().unwrap().push(ResourceId::Channel(id));
        Ok(id)
    }

    async fn delete_resource(&self, _guild_id: i64, resource: ResourceId) -> CondottaResult<()> {
        // Idempotent by contract; the fake just records the request.
        self.deleted.lock().unwrap().push(resource);
        Ok(())
    }

    async fn grant_role(&self, _guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()> {
        if *self.fail_grants.lock().unwrap() {
            return Err(
                ProvisionError::new(ProvisionErrorKind::Grant("scripted grant failure".into()))
                    .into(),
            );
        }
        self.grants.lock().unwrap().push((user_id, role_id));
        Ok(())
    }

    async fn revoke_role(&self, _guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()> {
        self.revokes.lock().unwrap().push((user_id, role_id));
        Ok(())
    }

    async fn post_message(&self, channel_id: i64, content: &str) -> CondottaResult<()> {
        self.messages
            .lock()
            .unwrap()
            .push((channel_id, content.to_string()));
        Ok(())
    }
}

/// Fully wired engine over the in-memory store and fake provisioner.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provisioner: Arc<FakeProvisioner>,
    pub lifecycle: Arc<FactionLifecycle<MemoryStore, FakeProvisioner>>,
    pub membership: MembershipSync<MemoryStore, FakeProvisioner>,
    pub wars: WarTracker<MemoryStore, FakeProvisioner>,
    pub currency: CurrencyLedger<MemoryStore>,
}

pub const GUILD: i64 = 900;

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let provisioner = Arc::new(FakeProvisioner::new());
        let locks = Arc::new(EntityLocks::new());
        let lifecycle = Arc::new(FactionLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&provisioner),
            Arc::clone(&locks),
        ));
        let membership = MembershipSync::new(
            Arc::clone(&store),
            Arc::clone(&provisioner),
            Arc::clone(&locks),
        );
        let wars = WarTracker::new(
            Arc::clone(&store),
            Arc::clone(&provisioner),
            Arc::clone(&locks),
            Arc::clone(&lifecycle),
        );
        let currency = CurrencyLedger::new(Arc::clone(&store), Duration::from_secs(10));
        Self {
            store,
            provisioner,
            lifecycle,
            membership,
            wars,
            currency,
        }
    }

    /// Credit a user so they can afford faction creation.
    pub async fn fund(&self, user_id: i64, amount: i64) {
        self.store.adjust_balance(user_id, amount).await.unwrap();
    }

    /// Fund and create a faction led by `leader`.
    pub async fn found(&self, leader: i64, name: &str) -> Faction {
        self.fund(leader, self.lifecycle.create_cost()).await;
        self.lifecycle.create(GUILD, leader, name).await.unwrap()
    }

    pub async fn balance(&self, user_id: i64) -> i64 {
        self.store.get_or_create_account(user_id).await.unwrap()
    }
}

/// Extract the user-facing command kind from an error, panicking on any
/// other error family.
pub fn command_kind(err: condotta_error::CondottaError) -> condotta_error::CommandErrorKind {
    match err.kind() {
        condotta_error::CondottaErrorKind::Command(cmd) => cmd.kind.clone(),
        other => panic!("expected command error, got {other:?}"),
    }
}
