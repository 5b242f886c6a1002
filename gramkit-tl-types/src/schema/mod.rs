//! Hand-maintained schema catalogue.
//!
//! The catalogue covers the MTProto service layer in full and the subset of
//! the API schema the client core talks: key exchange, connection setup,
//! sign-in, update delivery and difference fetching. API constructors keep
//! their real ids and field order, but trailing fields the core never reads
//! are left out; the doc comment on each type shows the exact shape decoded.

use crate::deserialize::{Buffer, Result};
use crate::Deserializable;

pub mod enums;
pub mod functions;
pub mod types;

/// The API layer requests are wrapped in.
pub const LAYER: i32 = 166;

/// Reads an optional field when `bit` is set in `flags`.
pub(crate) fn flagged<T: Deserializable>(flags: u32, bit: u32, buf: Buffer) -> Result<Option<T>> {
    if flags & (1 << bit) != 0 {
        T::deserialize(buf).map(Some)
    } else {
        Ok(None)
    }
}

/// Flag-word contribution of a `flags.N?true` field.
pub(crate) fn bit_if(on: bool, bit: u32) -> u32 {
    if on { 1 << bit } else { 0 }
}

/// Flag-word contribution of a `flags.N?T` field.
pub(crate) fn bit_some<T>(value: &Option<T>, bit: u32) -> u32 {
    bit_if(value.is_some(), bit)
}

/// Returns the TL name for a known constructor ID.
#[cfg(feature = "name-for-id")]
pub fn name_for_id(id: u32) -> Option<&'static str> {
    Some(match id {
        0x05162463 => "resPQ",
        0x83c95aec => "p_q_inner_data",
        0x79cb045d => "server_DH_params_fail",
        0xd0e8075c => "server_DH_params_ok",
        0xb5890dba => "server_DH_inner_data",
        0x6643b654 => "client_DH_inner_data",
        0x3bcbf734 => "dh_gen_ok",
        0x46dc1fb9 => "dh_gen_retry",
        0xa69dae02 => "dh_gen_fail",
        0xf35c6d01 => "rpc_result",
        0x2144ca19 => "rpc_error",
        0x347773c5 => "pong",
        0x9ec20908 => "new_session_created",
        0x73f1f8dc => "msg_container",
        0x3072cfa1 => "gzip_packed",
        0x62d6b459 => "msgs_ack",
        0xa7eff811 => "bad_msg_notification",
        0xedab447b => "bad_server_salt",
        0xda69fb52 => "msgs_state_req",
        0x04deb57d => "msgs_state_info",
        0x8cc0d131 => "msgs_all_info",
        0x276d3ec6 => "msg_detailed_info",
        0x809db6df => "msg_new_detailed_info",
        0x7d861a08 => "msg_resend_req",
        0x0949d9dc => "future_salt",
        0xae500895 => "future_salts",
        0xbe7e8ef1 => "req_pq_multi",
        0xd712e4be => "req_DH_params",
        0xf5045f1f => "set_client_DH_params",
        0x7abe77ec => "ping",
        0xf3427b8c => "ping_delay_disconnect",
        0xb921bd04 => "get_future_salts",
        0xe317af7e => "updatesTooLong",
        0x313bc7f8 => "updateShortMessage",
        0x4d6deea5 => "updateShortChatMessage",
        0x78d4dec1 => "updateShort",
        0x725b04c3 => "updatesCombined",
        0x74ae4240 => "updates",
        0x9015e101 => "updateShortSentMessage",
        0x1f2b0afd => "updateNewMessage",
        0x4e90bfd6 => "updateMessageID",
        0xa20db0e5 => "updateDeleteMessages",
        0x62ba04d9 => "updateNewChannelMessage",
        0xe40370a3 => "updateEditMessage",
        0x1b3f4df7 => "updateEditChannelMessage",
        0xc32d5b12 => "updateDeleteChannelMessages",
        0x2f2f21bf => "updateReadHistoryOutbox",
        0x922e6e10 => "updateReadChannelInbox",
        0x108d941f => "updateChannelTooLong",
        0x635b4c09 => "updateChannel",
        0x12bcbd9a => "updateNewEncryptedMessage",
        0xa56c2a3e => "updates.state",
        0x5d75a138 => "updates.differenceEmpty",
        0x00f49ca0 => "updates.difference",
        0xa8fb1981 => "updates.differenceSlice",
        0x4afe8f6d => "updates.differenceTooLong",
        0x3e11affb => "updates.channelDifferenceEmpty",
        0xa4bcc6fe => "updates.channelDifferenceTooLong",
        0x2064674e => "updates.channelDifference",
        0xda9b0d0d => "invokeWithLayer",
        0xc1cd5ea9 => "initConnection",
        0xc4f9186b => "help.getConfig",
        0x1fb33026 => "help.getNearestDc",
        0xedd4882a => "updates.getState",
        0x19c2f763 => "updates.getDifference",
        0x03173d78 => "updates.getChannelDifference",
        0x08736a09 => "channels.getFullChannel",
        0x0d91a548 => "users.getUsers",
        0xa677244f => "auth.sendCode",
        0x8d52a951 => "auth.signIn",
        0xaac7b717 => "auth.signUp",
        _ => return None,
    })
}
