//! Session persistence: data center, auth key, salt, clock offset, update
//! watermarks and the entity access-hash cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Production data centers, used until the server config names better ones.
pub fn default_dc_addresses() -> HashMap<i32, String> {
    [
        (1, "149.154.175.53:443"),
        (2, "149.154.167.51:443"),
        (3, "149.154.175.100:443"),
        (4, "149.154.167.91:443"),
        (5, "91.108.56.130:443"),
    ]
    .into_iter()
    .map(|(id, addr)| (id, addr.to_string()))
    .collect()
}

/// What an access hash belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Channel,
}

/// One persisted `(kind, id) -> access_hash` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntity {
    pub kind: EntityKind,
    pub id: i64,
    pub access_hash: i64,
}

/// Update watermarks.
///
/// `pts` is the global position, `channel_pts` the per-channel ones. A
/// missing entry means the position for that scope is not known yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateState {
    pub pts: Option<i32>,
    pub qts: i32,
    pub date: i32,
    pub seq: Option<i32>,
    #[serde(default)]
    pub channel_pts: HashMap<i64, i32>,
}

impl UpdateState {
    /// Position for `scope`: `None` is the global scope, `Some(id)` a channel.
    pub fn pts(&self, scope: Option<i64>) -> Option<i32> {
        match scope {
            None => self.pts,
            Some(channel_id) => self.channel_pts.get(&channel_id).copied(),
        }
    }

    pub fn set_pts(&mut self, scope: Option<i64>, pts: i32) {
        match scope {
            None => self.pts = Some(pts),
            Some(channel_id) => {
                self.channel_pts.insert(channel_id, pts);
            }
        }
    }
}

/// Everything needed to resume a logged-in connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub dc_id: i32,
    pub ip_address: String,
    pub port: u16,
    #[serde(with = "auth_key_base64")]
    pub auth_key: Option<[u8; 256]>,
    pub salt: i64,
    pub time_offset: i32,
    #[serde(default)]
    pub update_state: UpdateState,
    #[serde(default)]
    pub entities: Vec<CachedEntity>,
}

impl Session {
    /// A session with no key yet, pointing at `dc_id` reachable at `addr`.
    pub fn new(dc_id: i32, addr: &str) -> Self {
        let (ip_address, port) = split_addr(addr);
        Self {
            dc_id,
            ip_address,
            port,
            auth_key: None,
            salt: 0,
            time_offset: 0,
            update_state: UpdateState::default(),
            entities: Vec::new(),
        }
    }

    /// `ip:port`, bracketing IPv6 literals.
    pub fn addr(&self) -> String {
        if self.ip_address.contains(':') {
            format!("[{}]:{}", self.ip_address, self.port)
        } else {
            format!("{}:{}", self.ip_address, self.port)
        }
    }

    /// Point the session at another data center. The old key is useless there.
    pub fn move_to(&mut self, dc_id: i32, addr: &str) {
        let (ip_address, port) = split_addr(addr);
        self.dc_id = dc_id;
        self.ip_address = ip_address;
        self.port = port;
        self.auth_key = None;
        self.salt = 0;
    }
}

fn split_addr(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((ip, port)) => (
            ip.trim_start_matches('[').trim_end_matches(']').to_string(),
            port.parse().unwrap_or(443),
        ),
        None => (addr.to_string(), 443),
    }
}

mod auth_key_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &Option<[u8; 256]>, s: S) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => s.serialize_some(&STANDARD.encode(key)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<[u8; 256]>, D::Error> {
        let Some(text) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        let bytes = STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)?;
        let key: [u8; 256] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::custom(format!("auth key is {} bytes, expected 256", v.len())))?;
        Ok(Some(key))
    }
}
