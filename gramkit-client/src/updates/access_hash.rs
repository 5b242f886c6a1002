//! Access-hash harvesting.
//!
//! Requests that address a user or channel must carry its access hash, which
//! the server only reveals inside objects that mention the entity. Every
//! decoded response and update is walked and any hash found is cached here.

use std::collections::HashMap;

use gramkit_tl_types::walk::{self, TlObject};
use gramkit_tl_types::{enums, types};
use parking_lot::RwLock;

use crate::session::{CachedEntity, EntityKind};

/// Concurrent `(kind, id) -> access_hash` map.
#[derive(Debug, Default)]
pub struct AccessHashGetter {
    hashes: RwLock<HashMap<(EntityKind, i64), i64>>,
}

impl AccessHashGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[CachedEntity]) -> Self {
        let hashes = records.iter().map(|e| ((e.kind, e.id), e.access_hash)).collect();
        Self { hashes: RwLock::new(hashes) }
    }

    /// Snapshot for persistence, sorted for stable output.
    pub fn records(&self) -> Vec<CachedEntity> {
        let mut records: Vec<_> = self
            .hashes
            .read()
            .iter()
            .map(|(&(kind, id), &access_hash)| CachedEntity { kind, id, access_hash })
            .collect();
        records.sort_by_key(|e| (e.kind as u8, e.id));
        records
    }

    pub fn get(&self, kind: EntityKind, id: i64) -> Option<i64> {
        self.hashes.read().get(&(kind, id)).copied()
    }

    pub fn contains(&self, kind: EntityKind, id: i64) -> bool {
        self.hashes.read().contains_key(&(kind, id))
    }

    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.read().is_empty()
    }

    pub fn insert(&self, kind: EntityKind, id: i64, access_hash: i64) {
        self.hashes.write().insert((kind, id), access_hash);
    }

    /// Walk `root` and cache every access hash in it. Returns how many
    /// entries were new or changed.
    pub fn harvest(&self, root: &dyn TlObject) -> usize {
        let mut found = Vec::new();
        walk::walk(root, &mut |_, obj| {
            if let Some(entry) = entity_hash(obj) {
                found.push(entry);
            }
            true
        });
        if found.is_empty() {
            return 0;
        }

        let mut hashes = self.hashes.write();
        let mut changed = 0;
        for (key, hash) in found {
            if hashes.insert(key, hash) != Some(hash) {
                changed += 1;
            }
        }
        if changed > 0 {
            log::debug!("[gramkit] cached {changed} access hashes");
        }
        changed
    }

    /// `InputChannel` for `channel_id`, or the empty constructor if unknown.
    pub fn input_channel(&self, channel_id: i64) -> enums::InputChannel {
        match self.get(EntityKind::Channel, channel_id) {
            Some(access_hash) => types::InputChannel { channel_id, access_hash }.into(),
            None => types::InputChannelEmpty {}.into(),
        }
    }

    /// `InputUser` for `user_id`, or the empty constructor if unknown.
    pub fn input_user(&self, user_id: i64) -> enums::InputUser {
        match self.get(EntityKind::User, user_id) {
            Some(access_hash) => types::InputUser { user_id, access_hash }.into(),
            None => types::InputUserEmpty {}.into(),
        }
    }
}

fn entity_hash(obj: &dyn TlObject) -> Option<((EntityKind, i64), i64)> {
    let any = obj.as_any();
    if let Some(u) = any.downcast_ref::<types::User>() {
        // Hashes on min constructors are not valid for requests.
        return match (u.min, u.access_hash) {
            (false, Some(hash)) => Some(((EntityKind::User, u.id), hash)),
            _ => None,
        };
    }
    if let Some(c) = any.downcast_ref::<types::Channel>() {
        return match (c.min, c.access_hash) {
            (false, Some(hash)) => Some(((EntityKind::Channel, c.id), hash)),
            _ => None,
        };
    }
    if let Some(c) = any.downcast_ref::<types::ChannelForbidden>() {
        return Some(((EntityKind::Channel, c.id), c.access_hash));
    }
    if let Some(p) = any.downcast_ref::<types::InputPeerUser>() {
        return Some(((EntityKind::User, p.user_id), p.access_hash));
    }
    if let Some(p) = any.downcast_ref::<types::InputPeerChannel>() {
        return Some(((EntityKind::Channel, p.channel_id), p.access_hash));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, access_hash: Option<i64>, min: bool) -> enums::User {
        types::User {
            is_self: false,
            contact: false,
            bot: false,
            min,
            id,
            access_hash,
            first_name: Some("A".into()),
            last_name: None,
            username: None,
            phone: None,
        }
        .into()
    }

    #[test]
    fn min_users_are_skipped() {
        let cache = AccessHashGetter::new();
        let users = vec![user(1, Some(11), false), user(2, Some(22), true), user(3, None, false)];
        assert_eq!(cache.harvest(&users), 1);
        assert_eq!(cache.get(EntityKind::User, 1), Some(11));
        assert!(!cache.contains(EntityKind::User, 2));
        assert!(!cache.contains(EntityKind::User, 3));
    }

    #[test]
    fn records_round_trip() {
        let cache = AccessHashGetter::new();
        cache.insert(EntityKind::Channel, 5, 55);
        cache.insert(EntityKind::User, 9, 99);
        let restored = AccessHashGetter::from_records(&cache.records());
        assert_eq!(restored.get(EntityKind::Channel, 5), Some(55));
        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.input_channel(5),
            enums::InputChannel::from(types::InputChannel { channel_id: 5, access_hash: 55 })
        );
        assert_eq!(restored.input_user(1), enums::InputUser::from(types::InputUserEmpty {}));
    }

    #[test]
    fn unchanged_hashes_are_not_counted() {
        let cache = AccessHashGetter::new();
        let users = vec![user(1, Some(11), false)];
        assert_eq!(cache.harvest(&users), 1);
        assert_eq!(cache.harvest(&users), 0);
    }
}
