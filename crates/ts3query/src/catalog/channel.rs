//! Channel-facing queries: `channellist`, `channelinfo`.

use crate::catalog::{decode_list, decode_single, Command};
use crate::codec::{ArgMap, WireDecode};
use crate::error::Error;

/// Fields shared by every channel record.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelBasicInfo {
    pub id: i64,
    pub parent_id: i64,
    pub order: i64,
    pub name: String,
    pub topic: String,
    pub is_default: bool,
    pub is_passworded: bool,
    pub is_permanent: bool,
    pub is_semi_permanent: bool,
    pub max_clients: i64,
    pub max_family_clients: i64,
}

impl WireDecode for ChannelBasicInfo {
    fn decode(map: &ArgMap) -> Self {
        Self {
            id: map.get_int("cid"),
            parent_id: map.get_int("pid"),
            order: map.get_int("channel_order"),
            name: map.get_string("channel_name"),
            topic: map.get_string("channel_topic"),
            is_default: map.get_bool("channel_flag_default"),
            is_passworded: map.get_bool("channel_flag_password"),
            is_permanent: map.get_bool("channel_flag_permanent"),
            is_semi_permanent: map.get_bool("channel_flag_semi_permanent"),
            max_clients: map.get_int("channel_maxclients"),
            max_family_clients: map.get_int("channel_maxfamilyclients"),
        }
    }
}

/// Live occupancy counters, present on both the list and info shapes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChannelState {
    pub total_clients: i64,
    pub total_clients_family: i64,
}

impl WireDecode for ChannelState {
    fn decode(map: &ArgMap) -> Self {
        Self {
            total_clients: map.get_int("total_clients"),
            total_clients_family: map.get_int("total_clients_family"),
        }
    }
}

/// One record from `channellist -topic -flags -limits`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelListEntry {
    pub basic: ChannelBasicInfo,
    pub state: ChannelState,
}

impl WireDecode for ChannelListEntry {
    fn decode(map: &ArgMap) -> Self {
        Self {
            basic: ChannelBasicInfo::decode(map),
            state: ChannelState::decode(map),
        }
    }
}

/// `channellist -topic -flags -limits`: every channel, one record each.
pub struct GetChannelList;

impl Command for GetChannelList {
    type Response = Vec<ChannelListEntry>;

    fn wire_name(&self) -> String {
        "channellist -topic -flags -limits".to_string()
    }

    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        decode_list(records)
    }
}

/// The full detail record returned by `channelinfo`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelInfo {
    pub basic: ChannelBasicInfo,
    pub state: ChannelState,
    pub description: String,
}

impl WireDecode for ChannelInfo {
    fn decode(map: &ArgMap) -> Self {
        Self {
            basic: ChannelBasicInfo::decode(map),
            state: ChannelState::decode(map),
            description: map.get_string("channel_description"),
        }
    }
}

/// `channelinfo cid=<id>`: the full detail record for one channel.
pub struct GetChannelInfo {
    pub cid: i64,
}

impl Command for GetChannelInfo {
    type Response = ChannelInfo;

    fn wire_name(&self) -> String {
        "channelinfo".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = crate::codec::ArgWriter::new();
        w.push_int("cid", self.cid);
        Some(w.finish())
    }

    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        decode_single(records)
    }
}
