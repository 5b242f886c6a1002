//! Boxed types as `enum`s, one variant per constructor.

use crate::types;

// ─── MTProto ──────────────────────────────────────────────────────────────────

tl_enum! {
    pub enum ResPq {
        ResPq(types::ResPq),
    }
}

tl_enum! {
    pub enum PQInnerData {
        PQInnerData(types::PQInnerData),
    }
}

tl_enum! {
    pub enum ServerDhParams {
        Fail(types::ServerDhParamsFail),
        Ok(types::ServerDhParamsOk),
    }
}

tl_enum! {
    pub enum ServerDhInnerData {
        ServerDhInnerData(types::ServerDhInnerData),
    }
}

tl_enum! {
    pub enum ClientDhInnerData {
        ClientDhInnerData(types::ClientDhInnerData),
    }
}

tl_enum! {
    pub enum SetClientDhParamsAnswer {
        DhGenOk(types::DhGenOk),
        DhGenRetry(types::DhGenRetry),
        DhGenFail(types::DhGenFail),
    }
}

tl_enum! {
    pub enum RpcError {
        RpcError(types::RpcError),
    }
}

tl_enum! {
    pub enum Pong {
        Pong(types::Pong),
    }
}

tl_enum! {
    pub enum NewSession {
        Created(types::NewSessionCreated),
    }
}

tl_enum! {
    pub enum MsgsAck {
        MsgsAck(types::MsgsAck),
    }
}

tl_enum! {
    pub enum BadMsgNotification {
        BadMsgNotification(types::BadMsgNotification),
        BadServerSalt(types::BadServerSalt),
    }
}

tl_enum! {
    pub enum MsgsStateReq {
        MsgsStateReq(types::MsgsStateReq),
    }
}

tl_enum! {
    pub enum MsgsStateInfo {
        MsgsStateInfo(types::MsgsStateInfo),
    }
}

tl_enum! {
    pub enum MsgsAllInfo {
        MsgsAllInfo(types::MsgsAllInfo),
    }
}

tl_enum! {
    pub enum MsgDetailedInfo {
        MsgDetailedInfo(types::MsgDetailedInfo),
        MsgNewDetailedInfo(types::MsgNewDetailedInfo),
    }
}

tl_enum! {
    pub enum MsgResendReq {
        MsgResendReq(types::MsgResendReq),
    }
}

tl_enum! {
    pub enum FutureSalts {
        FutureSalts(types::FutureSalts),
    }
}

// ─── API ──────────────────────────────────────────────────────────────────────

tl_enum! {
    pub enum Peer {
        User(types::PeerUser),
        Chat(types::PeerChat),
        Channel(types::PeerChannel),
    }
}

tl_enum! {
    pub enum InputPeer {
        Empty(types::InputPeerEmpty),
        PeerSelf(types::InputPeerSelf),
        Chat(types::InputPeerChat),
        User(types::InputPeerUser),
        Channel(types::InputPeerChannel),
    }
}

tl_enum! {
    pub enum InputUser {
        Empty(types::InputUserEmpty),
        UserSelf(types::InputUserSelf),
        User(types::InputUser),
    }
}

tl_enum! {
    pub enum InputChannel {
        Empty(types::InputChannelEmpty),
        Channel(types::InputChannel),
    }
}

tl_enum! {
    pub enum User {
        Empty(types::UserEmpty),
        User(types::User),
    }
}

tl_enum! {
    pub enum Chat {
        Empty(types::ChatEmpty),
        Chat(types::Chat),
        Forbidden(types::ChatForbidden),
        Channel(types::Channel),
        ChannelForbidden(types::ChannelForbidden),
    }
}

tl_enum! {
    pub enum Message {
        Empty(types::MessageEmpty),
        Message(types::Message),
        Service(types::MessageService),
    }
}

tl_enum! {
    pub enum EncryptedFile {
        Empty(types::EncryptedFileEmpty),
        File(types::EncryptedFile),
    }
}

tl_enum! {
    pub enum EncryptedMessage {
        Message(types::EncryptedMessage),
        Service(types::EncryptedMessageService),
    }
}

tl_enum! {
    pub enum Update {
        NewMessage(types::UpdateNewMessage),
        MessageId(types::UpdateMessageId),
        DeleteMessages(types::UpdateDeleteMessages),
        NewChannelMessage(types::UpdateNewChannelMessage),
        EditMessage(types::UpdateEditMessage),
        EditChannelMessage(types::UpdateEditChannelMessage),
        DeleteChannelMessages(types::UpdateDeleteChannelMessages),
        ReadHistoryOutbox(types::UpdateReadHistoryOutbox),
        ReadChannelInbox(types::UpdateReadChannelInbox),
        ChannelTooLong(types::UpdateChannelTooLong),
        Channel(types::UpdateChannel),
        NewEncryptedMessage(types::UpdateNewEncryptedMessage),
    }
}

tl_enum! {
    pub enum Updates {
        TooLong(types::UpdatesTooLong),
        UpdateShortMessage(types::UpdateShortMessage),
        UpdateShortChatMessage(types::UpdateShortChatMessage),
        UpdateShort(types::UpdateShort),
        Combined(types::UpdatesCombined),
        Updates(types::Updates),
        UpdateShortSentMessage(types::UpdateShortSentMessage),
    }
}

tl_enum! {
    pub enum Dialog {
        Dialog(types::Dialog),
    }
}

tl_enum! {
    pub enum ChannelMessagesFilter {
        Empty(types::ChannelMessagesFilterEmpty),
    }
}

tl_enum! {
    pub enum ChatFull {
        ChatFull(types::ChatFull),
        ChannelFull(types::ChannelFull),
    }
}

tl_enum! {
    pub enum NearestDc {
        NearestDc(types::NearestDc),
    }
}

tl_enum! {
    pub enum DcOption {
        DcOption(types::DcOption),
    }
}

tl_enum! {
    pub enum Config {
        Config(types::Config),
    }
}

tl_enum! {
    pub enum CodeSettings {
        CodeSettings(types::CodeSettings),
    }
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self::CodeSettings(types::CodeSettings::default())
    }
}

tl_enum! {
    pub enum DataJson {
        DataJson(types::DataJson),
    }
}

// ─── Namespaces ───────────────────────────────────────────────────────────────

pub mod updates {
    use crate::types;

    tl_enum! {
        pub enum State {
            State(types::updates::State),
        }
    }

    tl_enum! {
        pub enum Difference {
            Empty(types::updates::DifferenceEmpty),
            Difference(types::updates::Difference),
            Slice(types::updates::DifferenceSlice),
            TooLong(types::updates::DifferenceTooLong),
        }
    }

    tl_enum! {
        pub enum ChannelDifference {
            Empty(types::updates::ChannelDifferenceEmpty),
            TooLong(types::updates::ChannelDifferenceTooLong),
            Difference(types::updates::ChannelDifference),
        }
    }
}

pub mod messages {
    use crate::types;

    tl_enum! {
        pub enum ChatFull {
            ChatFull(types::messages::ChatFull),
        }
    }
}

pub mod help {
    use crate::types;

    tl_enum! {
        pub enum TermsOfService {
            TermsOfService(types::help::TermsOfService),
        }
    }
}

pub mod auth {
    use crate::types;

    tl_enum! {
        pub enum SentCode {
            SentCode(types::auth::SentCode),
        }
    }

    tl_enum! {
        pub enum SentCodeType {
            App(types::auth::SentCodeTypeApp),
            Sms(types::auth::SentCodeTypeSms),
            Call(types::auth::SentCodeTypeCall),
            FlashCall(types::auth::SentCodeTypeFlashCall),
        }
    }

    tl_enum! {
        pub enum CodeType {
            Sms(types::auth::CodeTypeSms),
            Call(types::auth::CodeTypeCall),
            FlashCall(types::auth::CodeTypeFlashCall),
        }
    }

    tl_enum! {
        pub enum Authorization {
            Authorization(types::auth::Authorization),
            SignUpRequired(types::auth::AuthorizationSignUpRequired),
        }
    }
}
