//! RPC functions as `struct`s implementing [`RemoteCall`](crate::RemoteCall).

use crate::deserialize::{Buffer, Result};
use crate::schema::{bit_if, bit_some, flagged};
use crate::{Deserializable, Identifiable, RemoteCall, Serializable, enums};

// ─── MTProto ──────────────────────────────────────────────────────────────────

tl_function! {
    /// `req_pq_multi#be7e8ef1 nonce:int128 = ResPQ`
    pub struct ReqPqMulti = 0xbe7e8ef1 -> enums::ResPq {
        pub nonce: [u8; 16],
    }
}

tl_function! {
    /// `req_DH_params#d712e4be nonce:int128 server_nonce:int128 p:string q:string public_key_fingerprint:long encrypted_data:string = Server_DH_Params`
    pub struct ReqDhParams = 0xd712e4be -> enums::ServerDhParams {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub p: Vec<u8>,
        pub q: Vec<u8>,
        pub public_key_fingerprint: i64,
        pub encrypted_data: Vec<u8>,
    }
}

tl_function! {
    /// `set_client_DH_params#f5045f1f nonce:int128 server_nonce:int128 encrypted_data:string = Set_client_DH_params_answer`
    pub struct SetClientDhParams = 0xf5045f1f -> enums::SetClientDhParamsAnswer {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub encrypted_data: Vec<u8>,
    }
}

tl_function! {
    /// `ping#7abe77ec ping_id:long = Pong`
    pub struct Ping = 0x7abe77ec -> enums::Pong {
        pub ping_id: i64,
    }
}

tl_function! {
    /// `ping_delay_disconnect#f3427b8c ping_id:long disconnect_delay:int = Pong`
    pub struct PingDelayDisconnect = 0xf3427b8c -> enums::Pong {
        pub ping_id: i64,
        pub disconnect_delay: i32,
    }
}

tl_function! {
    /// `get_future_salts#b921bd04 num:int = FutureSalts`
    pub struct GetFutureSalts = 0xb921bd04 -> enums::FutureSalts {
        pub num: i32,
    }
}

// ─── Connection setup ─────────────────────────────────────────────────────────

/// `invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X`
#[derive(Clone, Debug, PartialEq)]
pub struct InvokeWithLayer<X> {
    pub layer: i32,
    pub query: X,
}

impl<X> Identifiable for InvokeWithLayer<X> {
    const CONSTRUCTOR_ID: u32 = 0xda9b0d0d;
}

impl<X: Serializable> Serializable for InvokeWithLayer<X> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.layer.serialize(buf);
        self.query.serialize(buf);
    }
}

impl<X: RemoteCall> RemoteCall for InvokeWithLayer<X> {
    type Return = X::Return;
}

/// `initConnection#c1cd5ea9 {X:Type} flags:# api_id:int device_model:string system_version:string app_version:string system_lang_code:string lang_pack:string lang_code:string query:!X = X`
///
/// The `proxy` and `params` flag fields are never sent.
#[derive(Clone, Debug, PartialEq)]
pub struct InitConnection<X> {
    pub api_id: i32,
    pub device_model: String,
    pub system_version: String,
    pub app_version: String,
    pub system_lang_code: String,
    pub lang_pack: String,
    pub lang_code: String,
    pub query: X,
}

impl<X> Identifiable for InitConnection<X> {
    const CONSTRUCTOR_ID: u32 = 0xc1cd5ea9;
}

impl<X: Serializable> Serializable for InitConnection<X> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        0u32.serialize(buf);
        self.api_id.serialize(buf);
        self.device_model.serialize(buf);
        self.system_version.serialize(buf);
        self.app_version.serialize(buf);
        self.system_lang_code.serialize(buf);
        self.lang_pack.serialize(buf);
        self.lang_code.serialize(buf);
        self.query.serialize(buf);
    }
}

impl<X: RemoteCall> RemoteCall for InitConnection<X> {
    type Return = X::Return;
}

// ─── Namespaces ───────────────────────────────────────────────────────────────

pub mod help {
    use crate::enums;

    tl_function! {
        /// `help.getConfig#c4f9186b = Config`
        pub struct GetConfig = 0xc4f9186b -> enums::Config {}
    }

    tl_function! {
        /// `help.getNearestDc#1fb33026 = NearestDc`
        pub struct GetNearestDc = 0x1fb33026 -> enums::NearestDc {}
    }
}

pub mod users {
    use crate::enums;

    tl_function! {
        /// `users.getUsers#0d91a548 id:Vector<InputUser> = Vector<User>`
        pub struct GetUsers = 0x0d91a548 -> Vec<enums::User> {
            pub id: Vec<enums::InputUser>,
        }
    }
}

pub mod channels {
    use crate::enums;

    tl_function! {
        /// `channels.getFullChannel#08736a09 channel:InputChannel = messages.ChatFull`
        pub struct GetFullChannel = 0x08736a09 -> enums::messages::ChatFull {
            pub channel: enums::InputChannel,
        }
    }
}

pub mod updates {
    use super::*;

    tl_function! {
        /// `updates.getState#edd4882a = updates.State`
        pub struct GetState = 0xedd4882a -> enums::updates::State {}
    }

    /// `updates.getDifference#19c2f763 flags:# pts:int pts_limit:flags.1?int pts_total_limit:flags.0?int date:int qts:int qts_limit:flags.2?int = updates.Difference`
    #[derive(Clone, Debug, PartialEq)]
    pub struct GetDifference {
        pub pts: i32,
        pub pts_limit: Option<i32>,
        pub pts_total_limit: Option<i32>,
        pub date: i32,
        pub qts: i32,
        pub qts_limit: Option<i32>,
    }

    impl Identifiable for GetDifference {
        const CONSTRUCTOR_ID: u32 = 0x19c2f763;
    }

    impl Serializable for GetDifference {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            let flags = bit_some(&self.pts_limit, 1)
                | bit_some(&self.pts_total_limit, 0)
                | bit_some(&self.qts_limit, 2);
            flags.serialize(buf);
            self.pts.serialize(buf);
            self.pts_limit.serialize(buf);
            self.pts_total_limit.serialize(buf);
            self.date.serialize(buf);
            self.qts.serialize(buf);
            self.qts_limit.serialize(buf);
        }
    }

    impl Deserializable for GetDifference {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                pts: i32::deserialize(buf)?,
                pts_limit: flagged(flags, 1, buf)?,
                pts_total_limit: flagged(flags, 0, buf)?,
                date: i32::deserialize(buf)?,
                qts: i32::deserialize(buf)?,
                qts_limit: flagged(flags, 2, buf)?,
            })
        }
    }

    impl RemoteCall for GetDifference {
        type Return = enums::updates::Difference;
    }

    /// `updates.getChannelDifference#03173d78 flags:# force:flags.0?true channel:InputChannel filter:ChannelMessagesFilter pts:int limit:int = updates.ChannelDifference`
    #[derive(Clone, Debug, PartialEq)]
    pub struct GetChannelDifference {
        pub force: bool,
        pub channel: enums::InputChannel,
        pub filter: enums::ChannelMessagesFilter,
        pub pts: i32,
        pub limit: i32,
    }

    impl Identifiable for GetChannelDifference {
        const CONSTRUCTOR_ID: u32 = 0x03173d78;
    }

    impl Serializable for GetChannelDifference {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            bit_if(self.force, 0).serialize(buf);
            self.channel.serialize(buf);
            self.filter.serialize(buf);
            self.pts.serialize(buf);
            self.limit.serialize(buf);
        }
    }

    impl Deserializable for GetChannelDifference {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                force: flags & (1 << 0) != 0,
                channel: enums::InputChannel::deserialize(buf)?,
                filter: enums::ChannelMessagesFilter::deserialize(buf)?,
                pts: i32::deserialize(buf)?,
                limit: i32::deserialize(buf)?,
            })
        }
    }

    impl RemoteCall for GetChannelDifference {
        type Return = enums::updates::ChannelDifference;
    }
}

pub mod auth {
    use super::*;

    tl_function! {
        /// `auth.sendCode#a677244f phone_number:string api_id:int api_hash:string settings:CodeSettings = auth.SentCode`
        pub struct SendCode = 0xa677244f -> enums::auth::SentCode {
            pub phone_number: String,
            pub api_id: i32,
            pub api_hash: String,
            pub settings: enums::CodeSettings,
        }
    }

    /// `auth.signIn#8d52a951 flags:# phone_number:string phone_code_hash:string phone_code:flags.0?string = auth.Authorization`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SignIn {
        pub phone_number: String,
        pub phone_code_hash: String,
        pub phone_code: Option<String>,
    }

    impl Identifiable for SignIn {
        const CONSTRUCTOR_ID: u32 = 0x8d52a951;
    }

    impl Serializable for SignIn {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            bit_some(&self.phone_code, 0).serialize(buf);
            self.phone_number.serialize(buf);
            self.phone_code_hash.serialize(buf);
            self.phone_code.serialize(buf);
        }
    }

    impl Deserializable for SignIn {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                phone_number: String::deserialize(buf)?,
                phone_code_hash: String::deserialize(buf)?,
                phone_code: flagged(flags, 0, buf)?,
            })
        }
    }

    impl RemoteCall for SignIn {
        type Return = enums::auth::Authorization;
    }

    /// `auth.signUp#aac7b717 flags:# no_joined_notifications:flags.0?true phone_number:string phone_code_hash:string first_name:string last_name:string = auth.Authorization`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SignUp {
        pub no_joined_notifications: bool,
        pub phone_number: String,
        pub phone_code_hash: String,
        pub first_name: String,
        pub last_name: String,
    }

    impl Identifiable for SignUp {
        const CONSTRUCTOR_ID: u32 = 0xaac7b717;
    }

    impl Serializable for SignUp {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            bit_if(self.no_joined_notifications, 0).serialize(buf);
            self.phone_number.serialize(buf);
            self.phone_code_hash.serialize(buf);
            self.first_name.serialize(buf);
            self.last_name.serialize(buf);
        }
    }

    impl Deserializable for SignUp {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                no_joined_notifications: flags & (1 << 0) != 0,
                phone_number: String::deserialize(buf)?,
                phone_code_hash: String::deserialize(buf)?,
                first_name: String::deserialize(buf)?,
                last_name: String::deserialize(buf)?,
            })
        }
    }

    impl RemoteCall for SignUp {
        type Return = enums::auth::Authorization;
    }
}
