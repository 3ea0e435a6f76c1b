//! Static assignment of converter channels to battery modules.
//!
//! Channel `n` measures role `n % 3` of the module in bank slot `n / 3`.

use strum::EnumCount;

use crate::{battery::BATTERY_COUNT, convert::Role};

/// Number of converter channels sampled per sweep.
pub const CHANNEL_COUNT: usize = BATTERY_COUNT * Role::COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAssignment {
    /// Bank slot of the module this channel belongs to.
    pub slot: usize,
    pub role: Role,
}

impl ChannelAssignment {
    pub const fn for_channel(channel: usize) -> Self {
        Self {
            slot: channel / Role::COUNT,
            role: Role::of_channel(channel),
        }
    }
}

/// Channel assignment table, indexed by channel.
pub const CHANNEL_MAP: [ChannelAssignment; CHANNEL_COUNT] = {
    let mut map = [ChannelAssignment::for_channel(0); CHANNEL_COUNT];
    let mut channel = 0;
    while channel < CHANNEL_COUNT {
        map[channel] = ChannelAssignment::for_channel(channel);
        channel += 1;
    }
    map
};
