//! Concrete constructors (bare types).

use crate::deserialize::{Buffer, Result};
use crate::schema::{bit_if, bit_some, flagged};
use crate::{Deserializable, RawVec, Serializable, enums};

// ─── MTProto: key exchange ────────────────────────────────────────────────────

tl_type! {
    /// `resPQ#05162463 nonce:int128 server_nonce:int128 pq:string server_public_key_fingerprints:Vector<long> = ResPQ`
    pub struct ResPq = 0x05162463 {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub pq: Vec<u8>,
        pub server_public_key_fingerprints: Vec<i64>,
    }
}

tl_type! {
    /// `p_q_inner_data#83c95aec pq:string p:string q:string nonce:int128 server_nonce:int128 new_nonce:int256 = P_Q_inner_data`
    pub struct PQInnerData = 0x83c95aec {
        pub pq: Vec<u8>,
        pub p: Vec<u8>,
        pub q: Vec<u8>,
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce: [u8; 32],
    }
}

tl_type! {
    /// `server_DH_params_fail#79cb045d nonce:int128 server_nonce:int128 new_nonce_hash:int128 = Server_DH_Params`
    pub struct ServerDhParamsFail = 0x79cb045d {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash: [u8; 16],
    }
}

tl_type! {
    /// `server_DH_params_ok#d0e8075c nonce:int128 server_nonce:int128 encrypted_answer:string = Server_DH_Params`
    pub struct ServerDhParamsOk = 0xd0e8075c {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub encrypted_answer: Vec<u8>,
    }
}

tl_type! {
    /// `server_DH_inner_data#b5890dba nonce:int128 server_nonce:int128 g:int dh_prime:string g_a:string server_time:int = Server_DH_inner_data`
    pub struct ServerDhInnerData = 0xb5890dba {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub g: i32,
        pub dh_prime: Vec<u8>,
        pub g_a: Vec<u8>,
        pub server_time: i32,
    }
}

tl_type! {
    /// `client_DH_inner_data#6643b654 nonce:int128 server_nonce:int128 retry_id:long g_b:string = Client_DH_Inner_Data`
    pub struct ClientDhInnerData = 0x6643b654 {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub retry_id: i64,
        pub g_b: Vec<u8>,
    }
}

tl_type! {
    /// `dh_gen_ok#3bcbf734 nonce:int128 server_nonce:int128 new_nonce_hash1:int128 = Set_client_DH_params_answer`
    pub struct DhGenOk = 0x3bcbf734 {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash1: [u8; 16],
    }
}

tl_type! {
    /// `dh_gen_retry#46dc1fb9 nonce:int128 server_nonce:int128 new_nonce_hash2:int128 = Set_client_DH_params_answer`
    pub struct DhGenRetry = 0x46dc1fb9 {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash2: [u8; 16],
    }
}

tl_type! {
    /// `dh_gen_fail#a69dae02 nonce:int128 server_nonce:int128 new_nonce_hash3:int128 = Set_client_DH_params_answer`
    pub struct DhGenFail = 0xa69dae02 {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash3: [u8; 16],
    }
}

// ─── MTProto: service messages ────────────────────────────────────────────────

tl_type! {
    /// `rpc_error#2144ca19 error_code:int error_message:string = RpcError`
    pub struct RpcError = 0x2144ca19 {
        pub error_code: i32,
        pub error_message: String,
    }
}

tl_type! {
    /// `pong#347773c5 msg_id:long ping_id:long = Pong`
    pub struct Pong = 0x347773c5 {
        pub msg_id: i64,
        pub ping_id: i64,
    }
}

tl_type! {
    /// `new_session_created#9ec20908 first_msg_id:long unique_id:long server_salt:long = NewSession`
    pub struct NewSessionCreated = 0x9ec20908 {
        pub first_msg_id: i64,
        pub unique_id: i64,
        pub server_salt: i64,
    }
}

tl_type! {
    /// `msgs_ack#62d6b459 msg_ids:Vector<long> = MsgsAck`
    pub struct MsgsAck = 0x62d6b459 {
        pub msg_ids: Vec<i64>,
    }
}

tl_type! {
    /// `bad_msg_notification#a7eff811 bad_msg_id:long bad_msg_seqno:int error_code:int = BadMsgNotification`
    pub struct BadMsgNotification = 0xa7eff811 {
        pub bad_msg_id: i64,
        pub bad_msg_seqno: i32,
        pub error_code: i32,
    }
}

tl_type! {
    /// `bad_server_salt#edab447b bad_msg_id:long bad_msg_seqno:int error_code:int new_server_salt:long = BadMsgNotification`
    pub struct BadServerSalt = 0xedab447b {
        pub bad_msg_id: i64,
        pub bad_msg_seqno: i32,
        pub error_code: i32,
        pub new_server_salt: i64,
    }
}

tl_type! {
    /// `msgs_state_req#da69fb52 msg_ids:Vector<long> = MsgsStateReq`
    pub struct MsgsStateReq = 0xda69fb52 {
        pub msg_ids: Vec<i64>,
    }
}

tl_type! {
    /// `msgs_state_info#04deb57d req_msg_id:long info:string = MsgsStateInfo`
    pub struct MsgsStateInfo = 0x04deb57d {
        pub req_msg_id: i64,
        pub info: Vec<u8>,
    }
}

tl_type! {
    /// `msgs_all_info#8cc0d131 msg_ids:Vector<long> info:string = MsgsAllInfo`
    pub struct MsgsAllInfo = 0x8cc0d131 {
        pub msg_ids: Vec<i64>,
        pub info: Vec<u8>,
    }
}

tl_type! {
    /// `msg_detailed_info#276d3ec6 msg_id:long answer_msg_id:long bytes:int status:int = MsgDetailedInfo`
    pub struct MsgDetailedInfo = 0x276d3ec6 {
        pub msg_id: i64,
        pub answer_msg_id: i64,
        pub bytes: i32,
        pub status: i32,
    }
}

tl_type! {
    /// `msg_new_detailed_info#809db6df answer_msg_id:long bytes:int status:int = MsgDetailedInfo`
    pub struct MsgNewDetailedInfo = 0x809db6df {
        pub answer_msg_id: i64,
        pub bytes: i32,
        pub status: i32,
    }
}

tl_type! {
    /// `msg_resend_req#7d861a08 msg_ids:Vector<long> = MsgResendReq`
    pub struct MsgResendReq = 0x7d861a08 {
        pub msg_ids: Vec<i64>,
    }
}

tl_type! {
    /// `future_salt#0949d9dc valid_since:int valid_until:int salt:long = FutureSalt`
    pub struct FutureSalt = 0x0949d9dc {
        pub valid_since: i32,
        pub valid_until: i32,
        pub salt: i64,
    }
}

tl_type! {
    /// `future_salts#ae500895 req_msg_id:long now:int salts:vector<future_salt> = FutureSalts`
    pub struct FutureSalts = 0xae500895 {
        pub req_msg_id: i64,
        pub now: i32,
        pub salts: RawVec<FutureSalt>,
    }
}

// ─── Peers ────────────────────────────────────────────────────────────────────

tl_type! {
    /// `peerUser#59511722 user_id:long = Peer`
    pub struct PeerUser = 0x59511722 {
        pub user_id: i64,
    }
}

tl_type! {
    /// `peerChat#36c6019a chat_id:long = Peer`
    pub struct PeerChat = 0x36c6019a {
        pub chat_id: i64,
    }
}

tl_type! {
    /// `peerChannel#a2a5371e channel_id:long = Peer`
    pub struct PeerChannel = 0xa2a5371e {
        pub channel_id: i64,
    }
}

tl_type! {
    /// `inputPeerEmpty#7f3b18ea = InputPeer`
    pub struct InputPeerEmpty = 0x7f3b18ea {}
}

tl_type! {
    /// `inputPeerSelf#7da07ec9 = InputPeer`
    pub struct InputPeerSelf = 0x7da07ec9 {}
}

tl_type! {
    /// `inputPeerChat#35a95cb9 chat_id:long = InputPeer`
    pub struct InputPeerChat = 0x35a95cb9 {
        pub chat_id: i64,
    }
}

tl_type! {
    /// `inputPeerUser#dde8a54c user_id:long access_hash:long = InputPeer`
    pub struct InputPeerUser = 0xdde8a54c {
        pub user_id: i64,
        pub access_hash: i64,
    }
}

tl_type! {
    /// `inputPeerChannel#27bcbbfc channel_id:long access_hash:long = InputPeer`
    pub struct InputPeerChannel = 0x27bcbbfc {
        pub channel_id: i64,
        pub access_hash: i64,
    }
}

tl_type! {
    /// `inputUserEmpty#b98886cf = InputUser`
    pub struct InputUserEmpty = 0xb98886cf {}
}

tl_type! {
    /// `inputUserSelf#f7c1b13f = InputUser`
    pub struct InputUserSelf = 0xf7c1b13f {}
}

tl_type! {
    /// `inputUser#f21158c6 user_id:long access_hash:long = InputUser`
    pub struct InputUser = 0xf21158c6 {
        pub user_id: i64,
        pub access_hash: i64,
    }
}

tl_type! {
    /// `inputChannelEmpty#ee8c1e86 = InputChannel`
    pub struct InputChannelEmpty = 0xee8c1e86 {}
}

tl_type! {
    /// `inputChannel#f35aec28 channel_id:long access_hash:long = InputChannel`
    pub struct InputChannel = 0xf35aec28 {
        pub channel_id: i64,
        pub access_hash: i64,
    }
}

// ─── Users and chats ──────────────────────────────────────────────────────────

tl_type! {
    /// `userEmpty#d3bc4b7a id:long = User`
    pub struct UserEmpty = 0xd3bc4b7a {
        pub id: i64,
    }
}

/// `user#83314fca flags:# self:flags.10?true contact:flags.11?true bot:flags.14?true min:flags.20?true id:long access_hash:flags.0?long first_name:flags.1?string last_name:flags.2?string username:flags.3?string phone:flags.4?string = User`
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub is_self: bool,
    pub contact: bool,
    pub bot: bool,
    pub min: bool,
    pub id: i64,
    pub access_hash: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
}

impl crate::Identifiable for User {
    const CONSTRUCTOR_ID: u32 = 0x83314fca;
}

impl Serializable for User {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.is_self, 10)
            | bit_if(self.contact, 11)
            | bit_if(self.bot, 14)
            | bit_if(self.min, 20)
            | bit_some(&self.access_hash, 0)
            | bit_some(&self.first_name, 1)
            | bit_some(&self.last_name, 2)
            | bit_some(&self.username, 3)
            | bit_some(&self.phone, 4);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.access_hash.serialize(buf);
        self.first_name.serialize(buf);
        self.last_name.serialize(buf);
        self.username.serialize(buf);
        self.phone.serialize(buf);
    }
}

impl Deserializable for User {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i64::deserialize(buf)?;
        let access_hash = flagged(flags, 0, buf)?;
        let first_name = flagged(flags, 1, buf)?;
        let last_name = flagged(flags, 2, buf)?;
        let username = flagged(flags, 3, buf)?;
        let phone = flagged(flags, 4, buf)?;
        Ok(Self {
            is_self: flags & (1 << 10) != 0,
            contact: flags & (1 << 11) != 0,
            bot: flags & (1 << 14) != 0,
            min: flags & (1 << 20) != 0,
            id,
            access_hash,
            first_name,
            last_name,
            username,
            phone,
        })
    }
}

impl_walk!(User {});

tl_type! {
    /// `chatEmpty#29562865 id:long = Chat`
    pub struct ChatEmpty = 0x29562865 {
        pub id: i64,
    }
}

/// `chat#41cbf256 flags:# creator:flags.0?true left:flags.2?true deactivated:flags.5?true id:long title:string participants_count:int date:int = Chat`
#[derive(Clone, Debug, PartialEq)]
pub struct Chat {
    pub creator: bool,
    pub left: bool,
    pub deactivated: bool,
    pub id: i64,
    pub title: String,
    pub participants_count: i32,
    pub date: i32,
}

impl crate::Identifiable for Chat {
    const CONSTRUCTOR_ID: u32 = 0x41cbf256;
}

impl Serializable for Chat {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.creator, 0) | bit_if(self.left, 2) | bit_if(self.deactivated, 5);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.title.serialize(buf);
        self.participants_count.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for Chat {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            creator: flags & (1 << 0) != 0,
            left: flags & (1 << 2) != 0,
            deactivated: flags & (1 << 5) != 0,
            id: i64::deserialize(buf)?,
            title: String::deserialize(buf)?,
            participants_count: i32::deserialize(buf)?,
            date: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(Chat {});

tl_type! {
    /// `chatForbidden#6592a1a7 id:long title:string = Chat`
    pub struct ChatForbidden = 0x6592a1a7 {
        pub id: i64,
        pub title: String,
    }
}

/// `channel#0aadfc8f flags:# broadcast:flags.5?true megagroup:flags.8?true min:flags.12?true id:long access_hash:flags.13?long title:string username:flags.6?string date:int = Chat`
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub broadcast: bool,
    pub megagroup: bool,
    pub min: bool,
    pub id: i64,
    pub access_hash: Option<i64>,
    pub title: String,
    pub username: Option<String>,
    pub date: i32,
}

impl crate::Identifiable for Channel {
    const CONSTRUCTOR_ID: u32 = 0x0aadfc8f;
}

impl Serializable for Channel {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.broadcast, 5)
            | bit_if(self.megagroup, 8)
            | bit_if(self.min, 12)
            | bit_some(&self.access_hash, 13)
            | bit_some(&self.username, 6);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.access_hash.serialize(buf);
        self.title.serialize(buf);
        self.username.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for Channel {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i64::deserialize(buf)?;
        let access_hash = flagged(flags, 13, buf)?;
        let title = String::deserialize(buf)?;
        let username = flagged(flags, 6, buf)?;
        let date = i32::deserialize(buf)?;
        Ok(Self {
            broadcast: flags & (1 << 5) != 0,
            megagroup: flags & (1 << 8) != 0,
            min: flags & (1 << 12) != 0,
            id,
            access_hash,
            title,
            username,
            date,
        })
    }
}

impl_walk!(Channel {});

/// `channelForbidden#17d493d5 flags:# broadcast:flags.5?true megagroup:flags.8?true id:long access_hash:long title:string until_date:flags.16?int = Chat`
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelForbidden {
    pub broadcast: bool,
    pub megagroup: bool,
    pub id: i64,
    pub access_hash: i64,
    pub title: String,
    pub until_date: Option<i32>,
}

impl crate::Identifiable for ChannelForbidden {
    const CONSTRUCTOR_ID: u32 = 0x17d493d5;
}

impl Serializable for ChannelForbidden {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.broadcast, 5) | bit_if(self.megagroup, 8) | bit_some(&self.until_date, 16);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.access_hash.serialize(buf);
        self.title.serialize(buf);
        self.until_date.serialize(buf);
    }
}

impl Deserializable for ChannelForbidden {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i64::deserialize(buf)?;
        let access_hash = i64::deserialize(buf)?;
        let title = String::deserialize(buf)?;
        let until_date = flagged(flags, 16, buf)?;
        Ok(Self {
            broadcast: flags & (1 << 5) != 0,
            megagroup: flags & (1 << 8) != 0,
            id,
            access_hash,
            title,
            until_date,
        })
    }
}

impl_walk!(ChannelForbidden {});

// ─── Messages ─────────────────────────────────────────────────────────────────

/// `messageEmpty#90a6ca84 flags:# id:int peer_id:flags.0?Peer = Message`
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEmpty {
    pub id: i32,
    pub peer_id: Option<enums::Peer>,
}

impl crate::Identifiable for MessageEmpty {
    const CONSTRUCTOR_ID: u32 = 0x90a6ca84;
}

impl Serializable for MessageEmpty {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        bit_some(&self.peer_id, 0).serialize(buf);
        self.id.serialize(buf);
        self.peer_id.serialize(buf);
    }
}

impl Deserializable for MessageEmpty {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i32::deserialize(buf)?;
        let peer_id = flagged(flags, 0, buf)?;
        Ok(Self { id, peer_id })
    }
}

impl_walk!(MessageEmpty { peer_id });

/// `message#94345242 flags:# out:flags.1?true mentioned:flags.4?true silent:flags.13?true post:flags.14?true id:int from_id:flags.8?Peer peer_id:Peer date:int message:string = Message`
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub out: bool,
    pub mentioned: bool,
    pub silent: bool,
    pub post: bool,
    pub id: i32,
    pub from_id: Option<enums::Peer>,
    pub peer_id: enums::Peer,
    pub date: i32,
    pub message: String,
}

impl crate::Identifiable for Message {
    const CONSTRUCTOR_ID: u32 = 0x94345242;
}

impl Serializable for Message {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.out, 1)
            | bit_if(self.mentioned, 4)
            | bit_if(self.silent, 13)
            | bit_if(self.post, 14)
            | bit_some(&self.from_id, 8);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.from_id.serialize(buf);
        self.peer_id.serialize(buf);
        self.date.serialize(buf);
        self.message.serialize(buf);
    }
}

impl Deserializable for Message {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i32::deserialize(buf)?;
        let from_id = flagged(flags, 8, buf)?;
        let peer_id = enums::Peer::deserialize(buf)?;
        let date = i32::deserialize(buf)?;
        let message = String::deserialize(buf)?;
        Ok(Self {
            out: flags & (1 << 1) != 0,
            mentioned: flags & (1 << 4) != 0,
            silent: flags & (1 << 13) != 0,
            post: flags & (1 << 14) != 0,
            id,
            from_id,
            peer_id,
            date,
            message,
        })
    }
}

impl_walk!(Message { from_id, peer_id });

/// `messageService#2b085862 flags:# out:flags.1?true id:int from_id:flags.8?Peer peer_id:Peer date:int = Message`
#[derive(Clone, Debug, PartialEq)]
pub struct MessageService {
    pub out: bool,
    pub id: i32,
    pub from_id: Option<enums::Peer>,
    pub peer_id: enums::Peer,
    pub date: i32,
}

impl crate::Identifiable for MessageService {
    const CONSTRUCTOR_ID: u32 = 0x2b085862;
}

impl Serializable for MessageService {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        (bit_if(self.out, 1) | bit_some(&self.from_id, 8)).serialize(buf);
        self.id.serialize(buf);
        self.from_id.serialize(buf);
        self.peer_id.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for MessageService {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let id = i32::deserialize(buf)?;
        let from_id = flagged(flags, 8, buf)?;
        let peer_id = enums::Peer::deserialize(buf)?;
        let date = i32::deserialize(buf)?;
        Ok(Self { out: flags & (1 << 1) != 0, id, from_id, peer_id, date })
    }
}

impl_walk!(MessageService { from_id, peer_id });

// ─── Secret chats ─────────────────────────────────────────────────────────────

tl_type! {
    /// `encryptedFileEmpty#c21f497e = EncryptedFile`
    pub struct EncryptedFileEmpty = 0xc21f497e {}
}

tl_type! {
    /// `encryptedFile#a8008cd8 id:long access_hash:long size:long dc_id:int key_fingerprint:int = EncryptedFile`
    pub struct EncryptedFile = 0xa8008cd8 {
        pub id: i64,
        pub access_hash: i64,
        pub size: i64,
        pub dc_id: i32,
        pub key_fingerprint: i32,
    }
}

tl_type! {
    /// `encryptedMessage#ed18c118 random_id:long chat_id:int date:int bytes:bytes file:EncryptedFile = EncryptedMessage`
    pub struct EncryptedMessage = 0xed18c118 {
        pub random_id: i64,
        pub chat_id: i32,
        pub date: i32,
        pub bytes: Vec<u8>,
        pub file: enums::EncryptedFile,
    }
}

tl_type! {
    /// `encryptedMessageService#23734b06 random_id:long chat_id:int date:int bytes:bytes = EncryptedMessage`
    pub struct EncryptedMessageService = 0x23734b06 {
        pub random_id: i64,
        pub chat_id: i32,
        pub date: i32,
        pub bytes: Vec<u8>,
    }
}

// ─── Updates ──────────────────────────────────────────────────────────────────

tl_type! {
    /// `updateNewMessage#1f2b0afd message:Message pts:int pts_count:int = Update`
    pub struct UpdateNewMessage = 0x1f2b0afd {
        pub message: enums::Message,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateMessageID#4e90bfd6 id:int random_id:long = Update`
    pub struct UpdateMessageId = 0x4e90bfd6 {
        pub id: i32,
        pub random_id: i64,
    }
}

tl_type! {
    /// `updateDeleteMessages#a20db0e5 messages:Vector<int> pts:int pts_count:int = Update`
    pub struct UpdateDeleteMessages = 0xa20db0e5 {
        pub messages: Vec<i32>,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateNewChannelMessage#62ba04d9 message:Message pts:int pts_count:int = Update`
    pub struct UpdateNewChannelMessage = 0x62ba04d9 {
        pub message: enums::Message,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateEditMessage#e40370a3 message:Message pts:int pts_count:int = Update`
    pub struct UpdateEditMessage = 0xe40370a3 {
        pub message: enums::Message,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateEditChannelMessage#1b3f4df7 message:Message pts:int pts_count:int = Update`
    pub struct UpdateEditChannelMessage = 0x1b3f4df7 {
        pub message: enums::Message,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateDeleteChannelMessages#c32d5b12 channel_id:long messages:Vector<int> pts:int pts_count:int = Update`
    pub struct UpdateDeleteChannelMessages = 0xc32d5b12 {
        pub channel_id: i64,
        pub messages: Vec<i32>,
        pub pts: i32,
        pub pts_count: i32,
    }
}

tl_type! {
    /// `updateReadHistoryOutbox#2f2f21bf peer:Peer max_id:int pts:int pts_count:int = Update`
    pub struct UpdateReadHistoryOutbox = 0x2f2f21bf {
        pub peer: enums::Peer,
        pub max_id: i32,
        pub pts: i32,
        pub pts_count: i32,
    }
}

/// `updateReadChannelInbox#922e6e10 flags:# folder_id:flags.0?int channel_id:long max_id:int still_unread_count:int pts:int = Update`
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateReadChannelInbox {
    pub folder_id: Option<i32>,
    pub channel_id: i64,
    pub max_id: i32,
    pub still_unread_count: i32,
    pub pts: i32,
}

impl crate::Identifiable for UpdateReadChannelInbox {
    const CONSTRUCTOR_ID: u32 = 0x922e6e10;
}

impl Serializable for UpdateReadChannelInbox {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        bit_some(&self.folder_id, 0).serialize(buf);
        self.folder_id.serialize(buf);
        self.channel_id.serialize(buf);
        self.max_id.serialize(buf);
        self.still_unread_count.serialize(buf);
        self.pts.serialize(buf);
    }
}

impl Deserializable for UpdateReadChannelInbox {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            folder_id: flagged(flags, 0, buf)?,
            channel_id: i64::deserialize(buf)?,
            max_id: i32::deserialize(buf)?,
            still_unread_count: i32::deserialize(buf)?,
            pts: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(UpdateReadChannelInbox {});

/// `updateChannelTooLong#108d941f flags:# channel_id:long pts:flags.0?int = Update`
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateChannelTooLong {
    pub channel_id: i64,
    pub pts: Option<i32>,
}

impl crate::Identifiable for UpdateChannelTooLong {
    const CONSTRUCTOR_ID: u32 = 0x108d941f;
}

impl Serializable for UpdateChannelTooLong {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        bit_some(&self.pts, 0).serialize(buf);
        self.channel_id.serialize(buf);
        self.pts.serialize(buf);
    }
}

impl Deserializable for UpdateChannelTooLong {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        let channel_id = i64::deserialize(buf)?;
        let pts = flagged(flags, 0, buf)?;
        Ok(Self { channel_id, pts })
    }
}

impl_walk!(UpdateChannelTooLong {});

tl_type! {
    /// `updateChannel#635b4c09 channel_id:long = Update`
    pub struct UpdateChannel = 0x635b4c09 {
        pub channel_id: i64,
    }
}

tl_type! {
    /// `updateNewEncryptedMessage#12bcbd9a message:EncryptedMessage qts:int = Update`
    pub struct UpdateNewEncryptedMessage = 0x12bcbd9a {
        pub message: enums::EncryptedMessage,
        pub qts: i32,
    }
}

tl_type! {
    /// `updatesTooLong#e317af7e = Updates`
    pub struct UpdatesTooLong = 0xe317af7e {}
}

/// `updateShortMessage#313bc7f8 flags:# out:flags.1?true mentioned:flags.4?true media_unread:flags.5?true silent:flags.13?true id:int user_id:long message:string pts:int pts_count:int date:int = Updates`
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateShortMessage {
    pub out: bool,
    pub mentioned: bool,
    pub media_unread: bool,
    pub silent: bool,
    pub id: i32,
    pub user_id: i64,
    pub message: String,
    pub pts: i32,
    pub pts_count: i32,
    pub date: i32,
}

impl crate::Identifiable for UpdateShortMessage {
    const CONSTRUCTOR_ID: u32 = 0x313bc7f8;
}

impl Serializable for UpdateShortMessage {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.out, 1)
            | bit_if(self.mentioned, 4)
            | bit_if(self.media_unread, 5)
            | bit_if(self.silent, 13);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.user_id.serialize(buf);
        self.message.serialize(buf);
        self.pts.serialize(buf);
        self.pts_count.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for UpdateShortMessage {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            out: flags & (1 << 1) != 0,
            mentioned: flags & (1 << 4) != 0,
            media_unread: flags & (1 << 5) != 0,
            silent: flags & (1 << 13) != 0,
            id: i32::deserialize(buf)?,
            user_id: i64::deserialize(buf)?,
            message: String::deserialize(buf)?,
            pts: i32::deserialize(buf)?,
            pts_count: i32::deserialize(buf)?,
            date: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(UpdateShortMessage {});

/// `updateShortChatMessage#4d6deea5 flags:# out:flags.1?true mentioned:flags.4?true media_unread:flags.5?true silent:flags.13?true id:int from_id:long chat_id:long message:string pts:int pts_count:int date:int = Updates`
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateShortChatMessage {
    pub out: bool,
    pub mentioned: bool,
    pub media_unread: bool,
    pub silent: bool,
    pub id: i32,
    pub from_id: i64,
    pub chat_id: i64,
    pub message: String,
    pub pts: i32,
    pub pts_count: i32,
    pub date: i32,
}

impl crate::Identifiable for UpdateShortChatMessage {
    const CONSTRUCTOR_ID: u32 = 0x4d6deea5;
}

impl Serializable for UpdateShortChatMessage {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.out, 1)
            | bit_if(self.mentioned, 4)
            | bit_if(self.media_unread, 5)
            | bit_if(self.silent, 13);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.from_id.serialize(buf);
        self.chat_id.serialize(buf);
        self.message.serialize(buf);
        self.pts.serialize(buf);
        self.pts_count.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for UpdateShortChatMessage {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            out: flags & (1 << 1) != 0,
            mentioned: flags & (1 << 4) != 0,
            media_unread: flags & (1 << 5) != 0,
            silent: flags & (1 << 13) != 0,
            id: i32::deserialize(buf)?,
            from_id: i64::deserialize(buf)?,
            chat_id: i64::deserialize(buf)?,
            message: String::deserialize(buf)?,
            pts: i32::deserialize(buf)?,
            pts_count: i32::deserialize(buf)?,
            date: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(UpdateShortChatMessage {});

tl_type! {
    /// `updateShort#78d4dec1 update:Update date:int = Updates`
    pub struct UpdateShort = 0x78d4dec1 {
        pub update: enums::Update,
        pub date: i32,
    }
}

tl_type! {
    /// `updatesCombined#725b04c3 updates:Vector<Update> users:Vector<User> chats:Vector<Chat> date:int seq_start:int seq:int = Updates`
    pub struct UpdatesCombined = 0x725b04c3 {
        pub updates: Vec<enums::Update>,
        pub users: Vec<enums::User>,
        pub chats: Vec<enums::Chat>,
        pub date: i32,
        pub seq_start: i32,
        pub seq: i32,
    }
}

tl_type! {
    /// `updates#74ae4240 updates:Vector<Update> users:Vector<User> chats:Vector<Chat> date:int seq:int = Updates`
    pub struct Updates = 0x74ae4240 {
        pub updates: Vec<enums::Update>,
        pub users: Vec<enums::User>,
        pub chats: Vec<enums::Chat>,
        pub date: i32,
        pub seq: i32,
    }
}

/// `updateShortSentMessage#9015e101 flags:# out:flags.1?true id:int pts:int pts_count:int date:int = Updates`
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateShortSentMessage {
    pub out: bool,
    pub id: i32,
    pub pts: i32,
    pub pts_count: i32,
    pub date: i32,
}

impl crate::Identifiable for UpdateShortSentMessage {
    const CONSTRUCTOR_ID: u32 = 0x9015e101;
}

impl Serializable for UpdateShortSentMessage {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        bit_if(self.out, 1).serialize(buf);
        self.id.serialize(buf);
        self.pts.serialize(buf);
        self.pts_count.serialize(buf);
        self.date.serialize(buf);
    }
}

impl Deserializable for UpdateShortSentMessage {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            out: flags & (1 << 1) != 0,
            id: i32::deserialize(buf)?,
            pts: i32::deserialize(buf)?,
            pts_count: i32::deserialize(buf)?,
            date: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(UpdateShortSentMessage {});

// ─── Dialogs and filters ──────────────────────────────────────────────────────

/// `dialog#d58a08c6 flags:# pinned:flags.2?true unread_mark:flags.3?true peer:Peer top_message:int read_inbox_max_id:int read_outbox_max_id:int unread_count:int pts:flags.0?int = Dialog`
#[derive(Clone, Debug, PartialEq)]
pub struct Dialog {
    pub pinned: bool,
    pub unread_mark: bool,
    pub peer: enums::Peer,
    pub top_message: i32,
    pub read_inbox_max_id: i32,
    pub read_outbox_max_id: i32,
    pub unread_count: i32,
    pub pts: Option<i32>,
}

impl crate::Identifiable for Dialog {
    const CONSTRUCTOR_ID: u32 = 0xd58a08c6;
}

impl Serializable for Dialog {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.pinned, 2) | bit_if(self.unread_mark, 3) | bit_some(&self.pts, 0);
        flags.serialize(buf);
        self.peer.serialize(buf);
        self.top_message.serialize(buf);
        self.read_inbox_max_id.serialize(buf);
        self.read_outbox_max_id.serialize(buf);
        self.unread_count.serialize(buf);
        self.pts.serialize(buf);
    }
}

impl Deserializable for Dialog {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            pinned: flags & (1 << 2) != 0,
            unread_mark: flags & (1 << 3) != 0,
            peer: enums::Peer::deserialize(buf)?,
            top_message: i32::deserialize(buf)?,
            read_inbox_max_id: i32::deserialize(buf)?,
            read_outbox_max_id: i32::deserialize(buf)?,
            unread_count: i32::deserialize(buf)?,
            pts: flagged(flags, 0, buf)?,
        })
    }
}

impl_walk!(Dialog { peer });

tl_type! {
    /// `channelMessagesFilterEmpty#94d42ee7 = ChannelMessagesFilter`
    pub struct ChannelMessagesFilterEmpty = 0x94d42ee7 {}
}

// ─── Full info ────────────────────────────────────────────────────────────────

tl_type! {
    /// `chatFull#2633421b id:long about:string = ChatFull`
    pub struct ChatFull = 0x2633421b {
        pub id: i64,
        pub about: String,
    }
}

/// `channelFull#44c054a7 flags:# can_view_participants:flags.3?true id:long about:string participants_count:flags.0?int pts:int = ChatFull`
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelFull {
    pub can_view_participants: bool,
    pub id: i64,
    pub about: String,
    pub participants_count: Option<i32>,
    pub pts: i32,
}

impl crate::Identifiable for ChannelFull {
    const CONSTRUCTOR_ID: u32 = 0x44c054a7;
}

impl Serializable for ChannelFull {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        (bit_if(self.can_view_participants, 3) | bit_some(&self.participants_count, 0)).serialize(buf);
        self.id.serialize(buf);
        self.about.serialize(buf);
        self.participants_count.serialize(buf);
        self.pts.serialize(buf);
    }
}

impl Deserializable for ChannelFull {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            can_view_participants: flags & (1 << 3) != 0,
            id: i64::deserialize(buf)?,
            about: String::deserialize(buf)?,
            participants_count: flagged(flags, 0, buf)?,
            pts: i32::deserialize(buf)?,
        })
    }
}

impl_walk!(ChannelFull {});

// ─── Configuration ────────────────────────────────────────────────────────────

tl_type! {
    /// `nearestDc#8e1a1775 country:string this_dc:int nearest_dc:int = NearestDc`
    pub struct NearestDc = 0x8e1a1775 {
        pub country: String,
        pub this_dc: i32,
        pub nearest_dc: i32,
    }
}

/// `dcOption#18b7a10d flags:# ipv6:flags.0?true media_only:flags.1?true tcpo_only:flags.2?true cdn:flags.3?true static:flags.4?true this_port_only:flags.5?true id:int ip_address:string port:int secret:flags.10?bytes = DcOption`
#[derive(Clone, Debug, PartialEq)]
pub struct DcOption {
    pub ipv6: bool,
    pub media_only: bool,
    pub tcpo_only: bool,
    pub cdn: bool,
    pub r#static: bool,
    pub this_port_only: bool,
    pub id: i32,
    pub ip_address: String,
    pub port: i32,
    pub secret: Option<Vec<u8>>,
}

impl crate::Identifiable for DcOption {
    const CONSTRUCTOR_ID: u32 = 0x18b7a10d;
}

impl Serializable for DcOption {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags = bit_if(self.ipv6, 0)
            | bit_if(self.media_only, 1)
            | bit_if(self.tcpo_only, 2)
            | bit_if(self.cdn, 3)
            | bit_if(self.r#static, 4)
            | bit_if(self.this_port_only, 5)
            | bit_some(&self.secret, 10);
        flags.serialize(buf);
        self.id.serialize(buf);
        self.ip_address.serialize(buf);
        self.port.serialize(buf);
        self.secret.serialize(buf);
    }
}

impl Deserializable for DcOption {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            ipv6: flags & (1 << 0) != 0,
            media_only: flags & (1 << 1) != 0,
            tcpo_only: flags & (1 << 2) != 0,
            cdn: flags & (1 << 3) != 0,
            r#static: flags & (1 << 4) != 0,
            this_port_only: flags & (1 << 5) != 0,
            id: i32::deserialize(buf)?,
            ip_address: String::deserialize(buf)?,
            port: i32::deserialize(buf)?,
            secret: flagged(flags, 10, buf)?,
        })
    }
}

impl_walk!(DcOption {});

tl_type! {
    /// `config#cc1a241e date:int expires:int test_mode:Bool this_dc:int dc_options:Vector<DcOption> = Config`
    pub struct Config = 0xcc1a241e {
        pub date: i32,
        pub expires: i32,
        pub test_mode: bool,
        pub this_dc: i32,
        pub dc_options: Vec<enums::DcOption>,
    }
}

/// `codeSettings#ad253d78 flags:# allow_flashcall:flags.0?true current_number:flags.1?true allow_app_hash:flags.4?true = CodeSettings`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeSettings {
    pub allow_flashcall: bool,
    pub current_number: bool,
    pub allow_app_hash: bool,
}

impl crate::Identifiable for CodeSettings {
    const CONSTRUCTOR_ID: u32 = 0xad253d78;
}

impl Serializable for CodeSettings {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        (bit_if(self.allow_flashcall, 0) | bit_if(self.current_number, 1) | bit_if(self.allow_app_hash, 4))
            .serialize(buf);
    }
}

impl Deserializable for CodeSettings {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let flags = u32::deserialize(buf)?;
        Ok(Self {
            allow_flashcall: flags & (1 << 0) != 0,
            current_number: flags & (1 << 1) != 0,
            allow_app_hash: flags & (1 << 4) != 0,
        })
    }
}

impl_walk!(CodeSettings {});

tl_type! {
    /// `dataJSON#7d748d04 data:string = DataJSON`
    pub struct DataJson = 0x7d748d04 {
        pub data: String,
    }
}

// ─── Namespaces ───────────────────────────────────────────────────────────────

pub mod updates {
    use crate::deserialize::{Buffer, Result};
    use crate::schema::{bit_if, bit_some, flagged};
    use crate::{Deserializable, Serializable, enums};

    tl_type! {
        /// `updates.state#a56c2a3e pts:int qts:int date:int seq:int unread_count:int = updates.State`
        pub struct State = 0xa56c2a3e {
            pub pts: i32,
            pub qts: i32,
            pub date: i32,
            pub seq: i32,
            pub unread_count: i32,
        }
    }

    tl_type! {
        /// `updates.differenceEmpty#5d75a138 date:int seq:int = updates.Difference`
        pub struct DifferenceEmpty = 0x5d75a138 {
            pub date: i32,
            pub seq: i32,
        }
    }

    tl_type! {
        /// `updates.difference#00f49ca0 new_messages:Vector<Message> new_encrypted_messages:Vector<EncryptedMessage> other_updates:Vector<Update> chats:Vector<Chat> users:Vector<User> state:updates.State = updates.Difference`
        pub struct Difference = 0x00f49ca0 {
            pub new_messages: Vec<enums::Message>,
            pub new_encrypted_messages: Vec<enums::EncryptedMessage>,
            pub other_updates: Vec<enums::Update>,
            pub chats: Vec<enums::Chat>,
            pub users: Vec<enums::User>,
            pub state: enums::updates::State,
        }
    }

    tl_type! {
        /// `updates.differenceSlice#a8fb1981 new_messages:Vector<Message> new_encrypted_messages:Vector<EncryptedMessage> other_updates:Vector<Update> chats:Vector<Chat> users:Vector<User> intermediate_state:updates.State = updates.Difference`
        pub struct DifferenceSlice = 0xa8fb1981 {
            pub new_messages: Vec<enums::Message>,
            pub new_encrypted_messages: Vec<enums::EncryptedMessage>,
            pub other_updates: Vec<enums::Update>,
            pub chats: Vec<enums::Chat>,
            pub users: Vec<enums::User>,
            pub intermediate_state: enums::updates::State,
        }
    }

    tl_type! {
        /// `updates.differenceTooLong#4afe8f6d pts:int = updates.Difference`
        pub struct DifferenceTooLong = 0x4afe8f6d {
            pub pts: i32,
        }
    }

    /// `updates.channelDifferenceEmpty#3e11affb flags:# final:flags.0?true pts:int timeout:flags.1?int = updates.ChannelDifference`
    #[derive(Clone, Debug, PartialEq)]
    pub struct ChannelDifferenceEmpty {
        pub r#final: bool,
        pub pts: i32,
        pub timeout: Option<i32>,
    }

    impl crate::Identifiable for ChannelDifferenceEmpty {
        const CONSTRUCTOR_ID: u32 = 0x3e11affb;
    }

    impl Serializable for ChannelDifferenceEmpty {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_if(self.r#final, 0) | bit_some(&self.timeout, 1)).serialize(buf);
            self.pts.serialize(buf);
            self.timeout.serialize(buf);
        }
    }

    impl Deserializable for ChannelDifferenceEmpty {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                r#final: flags & (1 << 0) != 0,
                pts: i32::deserialize(buf)?,
                timeout: flagged(flags, 1, buf)?,
            })
        }
    }

    impl_walk!(ChannelDifferenceEmpty {});

    /// `updates.channelDifferenceTooLong#a4bcc6fe flags:# final:flags.0?true timeout:flags.1?int dialog:Dialog messages:Vector<Message> chats:Vector<Chat> users:Vector<User> = updates.ChannelDifference`
    #[derive(Clone, Debug, PartialEq)]
    pub struct ChannelDifferenceTooLong {
        pub r#final: bool,
        pub timeout: Option<i32>,
        pub dialog: enums::Dialog,
        pub messages: Vec<enums::Message>,
        pub chats: Vec<enums::Chat>,
        pub users: Vec<enums::User>,
    }

    impl crate::Identifiable for ChannelDifferenceTooLong {
        const CONSTRUCTOR_ID: u32 = 0xa4bcc6fe;
    }

    impl Serializable for ChannelDifferenceTooLong {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_if(self.r#final, 0) | bit_some(&self.timeout, 1)).serialize(buf);
            self.timeout.serialize(buf);
            self.dialog.serialize(buf);
            self.messages.serialize(buf);
            self.chats.serialize(buf);
            self.users.serialize(buf);
        }
    }

    impl Deserializable for ChannelDifferenceTooLong {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                r#final: flags & (1 << 0) != 0,
                timeout: flagged(flags, 1, buf)?,
                dialog: enums::Dialog::deserialize(buf)?,
                messages: Vec::deserialize(buf)?,
                chats: Vec::deserialize(buf)?,
                users: Vec::deserialize(buf)?,
            })
        }
    }

    impl_walk!(ChannelDifferenceTooLong { dialog, messages, chats, users });

    /// `updates.channelDifference#2064674e flags:# final:flags.0?true pts:int timeout:flags.1?int new_messages:Vector<Message> other_updates:Vector<Update> chats:Vector<Chat> users:Vector<User> = updates.ChannelDifference`
    #[derive(Clone, Debug, PartialEq)]
    pub struct ChannelDifference {
        pub r#final: bool,
        pub pts: i32,
        pub timeout: Option<i32>,
        pub new_messages: Vec<enums::Message>,
        pub other_updates: Vec<enums::Update>,
        pub chats: Vec<enums::Chat>,
        pub users: Vec<enums::User>,
    }

    impl crate::Identifiable for ChannelDifference {
        const CONSTRUCTOR_ID: u32 = 0x2064674e;
    }

    impl Serializable for ChannelDifference {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_if(self.r#final, 0) | bit_some(&self.timeout, 1)).serialize(buf);
            self.pts.serialize(buf);
            self.timeout.serialize(buf);
            self.new_messages.serialize(buf);
            self.other_updates.serialize(buf);
            self.chats.serialize(buf);
            self.users.serialize(buf);
        }
    }

    impl Deserializable for ChannelDifference {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                r#final: flags & (1 << 0) != 0,
                pts: i32::deserialize(buf)?,
                timeout: flagged(flags, 1, buf)?,
                new_messages: Vec::deserialize(buf)?,
                other_updates: Vec::deserialize(buf)?,
                chats: Vec::deserialize(buf)?,
                users: Vec::deserialize(buf)?,
            })
        }
    }

    impl_walk!(ChannelDifference { new_messages, other_updates, chats, users });
}

pub mod messages {
    use crate::enums;

    tl_type! {
        /// `messages.chatFull#e5d7d19c full_chat:ChatFull chats:Vector<Chat> users:Vector<User> = messages.ChatFull`
        pub struct ChatFull = 0xe5d7d19c {
            pub full_chat: enums::ChatFull,
            pub chats: Vec<enums::Chat>,
            pub users: Vec<enums::User>,
        }
    }
}

pub mod help {
    use crate::deserialize::{Buffer, Result};
    use crate::schema::{bit_if, bit_some, flagged};
    use crate::{Deserializable, Serializable, enums};

    /// `help.termsOfService#780a0310 flags:# popup:flags.0?true id:DataJSON text:string min_age_confirm:flags.1?int = help.TermsOfService`
    #[derive(Clone, Debug, PartialEq)]
    pub struct TermsOfService {
        pub popup: bool,
        pub id: enums::DataJson,
        pub text: String,
        pub min_age_confirm: Option<i32>,
    }

    impl crate::Identifiable for TermsOfService {
        const CONSTRUCTOR_ID: u32 = 0x780a0310;
    }

    impl Serializable for TermsOfService {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_if(self.popup, 0) | bit_some(&self.min_age_confirm, 1)).serialize(buf);
            self.id.serialize(buf);
            self.text.serialize(buf);
            self.min_age_confirm.serialize(buf);
        }
    }

    impl Deserializable for TermsOfService {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                popup: flags & (1 << 0) != 0,
                id: enums::DataJson::deserialize(buf)?,
                text: String::deserialize(buf)?,
                min_age_confirm: flagged(flags, 1, buf)?,
            })
        }
    }

    impl_walk!(TermsOfService { id });
}

pub mod auth {
    use crate::deserialize::{Buffer, Result};
    use crate::schema::{bit_if, bit_some, flagged};
    use crate::{Deserializable, Serializable, enums};

    tl_type! {
        /// `auth.sentCodeTypeApp#3dbb5986 length:int = auth.SentCodeType`
        pub struct SentCodeTypeApp = 0x3dbb5986 {
            pub length: i32,
        }
    }

    tl_type! {
        /// `auth.sentCodeTypeSms#c000bba2 length:int = auth.SentCodeType`
        pub struct SentCodeTypeSms = 0xc000bba2 {
            pub length: i32,
        }
    }

    tl_type! {
        /// `auth.sentCodeTypeCall#5353e5a7 length:int = auth.SentCodeType`
        pub struct SentCodeTypeCall = 0x5353e5a7 {
            pub length: i32,
        }
    }

    tl_type! {
        /// `auth.sentCodeTypeFlashCall#ab03c6d9 pattern:string = auth.SentCodeType`
        pub struct SentCodeTypeFlashCall = 0xab03c6d9 {
            pub pattern: String,
        }
    }

    tl_type! {
        /// `auth.codeTypeSms#72a3158c = auth.CodeType`
        pub struct CodeTypeSms = 0x72a3158c {}
    }

    tl_type! {
        /// `auth.codeTypeCall#741cd3e3 = auth.CodeType`
        pub struct CodeTypeCall = 0x741cd3e3 {}
    }

    tl_type! {
        /// `auth.codeTypeFlashCall#226ccefb = auth.CodeType`
        pub struct CodeTypeFlashCall = 0x226ccefb {}
    }

    /// `auth.sentCode#5e002502 flags:# type:auth.SentCodeType phone_code_hash:string next_type:flags.1?auth.CodeType timeout:flags.2?int = auth.SentCode`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SentCode {
        pub r#type: enums::auth::SentCodeType,
        pub phone_code_hash: String,
        pub next_type: Option<enums::auth::CodeType>,
        pub timeout: Option<i32>,
    }

    impl crate::Identifiable for SentCode {
        const CONSTRUCTOR_ID: u32 = 0x5e002502;
    }

    impl Serializable for SentCode {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_some(&self.next_type, 1) | bit_some(&self.timeout, 2)).serialize(buf);
            self.r#type.serialize(buf);
            self.phone_code_hash.serialize(buf);
            self.next_type.serialize(buf);
            self.timeout.serialize(buf);
        }
    }

    impl Deserializable for SentCode {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                r#type: enums::auth::SentCodeType::deserialize(buf)?,
                phone_code_hash: String::deserialize(buf)?,
                next_type: flagged(flags, 1, buf)?,
                timeout: flagged(flags, 2, buf)?,
            })
        }
    }

    impl_walk!(SentCode { r#type, next_type });

    /// `auth.authorization#2ea2c0d4 flags:# setup_password_required:flags.1?true tmp_sessions:flags.0?int user:User = auth.Authorization`
    #[derive(Clone, Debug, PartialEq)]
    pub struct Authorization {
        pub setup_password_required: bool,
        pub tmp_sessions: Option<i32>,
        pub user: enums::User,
    }

    impl crate::Identifiable for Authorization {
        const CONSTRUCTOR_ID: u32 = 0x2ea2c0d4;
    }

    impl Serializable for Authorization {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            (bit_if(self.setup_password_required, 1) | bit_some(&self.tmp_sessions, 0)).serialize(buf);
            self.tmp_sessions.serialize(buf);
            self.user.serialize(buf);
        }
    }

    impl Deserializable for Authorization {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self {
                setup_password_required: flags & (1 << 1) != 0,
                tmp_sessions: flagged(flags, 0, buf)?,
                user: enums::User::deserialize(buf)?,
            })
        }
    }

    impl_walk!(Authorization { user });

    /// `auth.authorizationSignUpRequired#44747e9a flags:# terms_of_service:flags.0?help.TermsOfService = auth.Authorization`
    #[derive(Clone, Debug, PartialEq)]
    pub struct AuthorizationSignUpRequired {
        pub terms_of_service: Option<enums::help::TermsOfService>,
    }

    impl crate::Identifiable for AuthorizationSignUpRequired {
        const CONSTRUCTOR_ID: u32 = 0x44747e9a;
    }

    impl Serializable for AuthorizationSignUpRequired {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            bit_some(&self.terms_of_service, 0).serialize(buf);
            self.terms_of_service.serialize(buf);
        }
    }

    impl Deserializable for AuthorizationSignUpRequired {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let flags = u32::deserialize(buf)?;
            Ok(Self { terms_of_service: flagged(flags, 0, buf)? })
        }
    }

    impl_walk!(AuthorizationSignUpRequired { terms_of_service });
}
