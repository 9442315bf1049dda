//! Reserved address space table.
//!
//! Every block a proxied request must never reach: loopback, link-local,
//! private, documentation/test, multicast, broadcast and the IPv6
//! special-purpose and transition ranges. The table is built once at startup
//! and shared read-only.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

const RESERVED_V4: &[(Ipv4Net, &str)] = &[
    (Ipv4Net::new_assert(Ipv4Addr::new(0, 0, 0, 0), 8), "current network"),
    (Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8), "private network"),
    (Ipv4Net::new_assert(Ipv4Addr::new(100, 64, 0, 0), 10), "shared address space"),
    (Ipv4Net::new_assert(Ipv4Addr::new(127, 0, 0, 0), 8), "loopback"),
    (Ipv4Net::new_assert(Ipv4Addr::new(169, 254, 0, 0), 16), "link-local"),
    (Ipv4Net::new_assert(Ipv4Addr::new(172, 16, 0, 0), 12), "private network"),
    (Ipv4Net::new_assert(Ipv4Addr::new(192, 0, 0, 0), 24), "IETF protocol assignments"),
    (Ipv4Net::new_assert(Ipv4Addr::new(192, 0, 2, 0), 24), "documentation (TEST-NET-1)"),
    (Ipv4Net::new_assert(Ipv4Addr::new(192, 88, 99, 0), 24), "6to4 relay anycast"),
    (Ipv4Net::new_assert(Ipv4Addr::new(192, 168, 0, 0), 16), "private network"),
    (Ipv4Net::new_assert(Ipv4Addr::new(198, 18, 0, 0), 15), "benchmarking"),
    (Ipv4Net::new_assert(Ipv4Addr::new(198, 51, 100, 0), 24), "documentation (TEST-NET-2)"),
    (Ipv4Net::new_assert(Ipv4Addr::new(203, 0, 113, 0), 24), "documentation (TEST-NET-3)"),
    (Ipv4Net::new_assert(Ipv4Addr::new(224, 0, 0, 0), 4), "multicast"),
    (Ipv4Net::new_assert(Ipv4Addr::new(240, 0, 0, 0), 4), "reserved"),
    (Ipv4Net::new_assert(Ipv4Addr::new(255, 255, 255, 255), 32), "limited broadcast"),
];

const RESERVED_V6: &[(Ipv6Net, &str)] = &[
    (Ipv6Net::new_assert(Ipv6Addr::UNSPECIFIED, 128), "unspecified"),
    (Ipv6Net::new_assert(Ipv6Addr::LOCALHOST, 128), "loopback"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0, 0), 96), "IPv4/IPv6 translation"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x100, 0, 0, 0, 0, 0, 0, 0), 64), "discard-only"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0, 0, 0, 0, 0, 0, 0), 32), "Teredo"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0x10, 0, 0, 0, 0, 0, 0), 28), "ORCHID"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0x20, 0, 0, 0, 0, 0, 0), 28), "ORCHIDv2"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0), 32), "documentation"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0), 16), "6to4"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7), "unique-local"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10), "link-local"),
    (Ipv6Net::new_assert(Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0), 8), "multicast"),
];

/// A labelled CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedRange {
    pub net: IpNet,
    pub label: &'static str,
}

/// Ordered, immutable set of reserved CIDR blocks for both families.
#[derive(Debug, Clone)]
pub struct ReservedRanges {
    ranges: Vec<ReservedRange>,
}

impl ReservedRanges {
    /// The standard reserved table.
    pub fn standard() -> Self {
        let v4 = RESERVED_V4.iter().map(|&(net, label)| ReservedRange {
            net: IpNet::V4(net),
            label,
        });
        let v6 = RESERVED_V6.iter().map(|&(net, label)| ReservedRange {
            net: IpNet::V6(net),
            label,
        });

        Self::new(v4.chain(v6).collect())
    }

    /// A table over an explicit list of blocks.
    pub fn new(ranges: Vec<ReservedRange>) -> Self {
        Self { ranges }
    }

    /// First block containing `ip`, if any. Plain containment only; embedded
    /// IPv4 forms are unwrapped by the classifier.
    pub fn find(&self, ip: IpAddr) -> Option<&ReservedRange> {
        self.ranges.iter().find(|range| range.net.contains(&ip))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReservedRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl Default for ReservedRanges {
    fn default() -> Self {
        Self::standard()
    }
}
