//! Reasons a frame is passed over instead of decoded

use thiserror::Error;

/// Why the decoder stopped before producing a [`crate::DecodedFrame`]
///
/// A skip is not a failure of the sniffer. Frames of other protocols and
/// malformed frames are both routine, and the read loop moves on to the next
/// frame either way.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Fewer than 14 bytes captured
    #[error("frame too short for an Ethernet header")]
    TooShortForEthernet,

    /// EtherType is not IPv4, or the IP version nibble is not 4
    #[error("not an IPv4 frame")]
    NotIpv4,

    /// IPv4 header or its options run past the captured bytes
    #[error("frame too short for the IPv4 header")]
    TooShortForIp,

    /// IHL field below 5 words
    #[error("invalid IPv4 header length")]
    InvalidIpHeaderLength,

    /// IP protocol is not TCP
    #[error("not a TCP segment")]
    NotTcp,

    /// TCP header or its options run past the captured bytes
    #[error("frame too short for the TCP header")]
    TooShortForTcp,

    /// Data offset field below 5 words
    #[error("invalid TCP data offset")]
    InvalidTcpHeaderLength,
}

impl SkipReason {
    /// Every reason, in pipeline order
    pub const ALL: [SkipReason; 7] = [
        SkipReason::TooShortForEthernet,
        SkipReason::NotIpv4,
        SkipReason::TooShortForIp,
        SkipReason::InvalidIpHeaderLength,
        SkipReason::NotTcp,
        SkipReason::TooShortForTcp,
        SkipReason::InvalidTcpHeaderLength,
    ];

    /// Position of this reason in [`SkipReason::ALL`]
    pub fn index(self) -> usize {
        match self {
            SkipReason::TooShortForEthernet => 0,
            SkipReason::NotIpv4 => 1,
            SkipReason::TooShortForIp => 2,
            SkipReason::InvalidIpHeaderLength => 3,
            SkipReason::NotTcp => 4,
            SkipReason::TooShortForTcp => 5,
            SkipReason::InvalidTcpHeaderLength => 6,
        }
    }

    /// Whether the frame was malformed, as opposed to merely another protocol
    pub fn is_malformed(self) -> bool {
        !matches!(self, SkipReason::NotIpv4 | SkipReason::NotTcp)
    }
}
