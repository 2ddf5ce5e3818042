//! Event record types: everything the catalog in [`crate::events`] can
//! construct from a `notify*` line.

use crate::codec::{ArgMap, WireDecode};

/// `notifyclientleftview`: a client left a channel or disconnected.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientLeftView {
    pub from_channel_id: i64,
    pub to_channel_id: i64,
    pub reason_id: i64,
    pub reason_msg: String,
    pub clid: i64,
}

impl WireDecode for ClientLeftView {
    fn decode(map: &ArgMap) -> Self {
        Self {
            from_channel_id: map.get_int("cfid"),
            to_channel_id: map.get_int("ctid"),
            reason_id: map.get_int("reasonid"),
            reason_msg: map.get_string("reasonmsg"),
            clid: map.get_int("clid"),
        }
    }
}

/// `notifytextmessage`: a chat message addressed to this connection.
#[derive(Clone, Debug, PartialEq)]
pub struct TextMessageReceived {
    pub target_mode: i64,
    pub msg: String,
    pub target: i64,
    pub invoker_id: i64,
    pub invoker_name: String,
    pub invoker_uid: String,
}

impl WireDecode for TextMessageReceived {
    fn decode(map: &ArgMap) -> Self {
        Self {
            target_mode: map.get_int("targetmode"),
            msg: map.get_string("msg"),
            target: map.get_int("target"),
            invoker_id: map.get_int("invokerid"),
            invoker_name: map.get_string("invokername"),
            invoker_uid: map.get_string("invokeruid"),
        }
    }
}

/// Any `notify*` line whose name has no registered constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownEvent {
    pub name: String,
    pub args: ArgMap,
}
