//! Header fields and the values they carry.
//!
//! Every packet header is a partial map from [`Field`] to [`Value`]. A field
//! that is absent reads as [`Value::Unset`], which is also the sentinel used
//! for "no path tag yet".

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A header field a predicate can test or a policy can modify.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Field {
    #[serde(rename = "switch")]
    Switch,
    #[serde(rename = "inport")]
    InPort,
    #[serde(rename = "outport")]
    OutPort,
    #[serde(rename = "ethtype")]
    EthType,
    #[serde(rename = "srcip")]
    SrcIp,
    #[serde(rename = "dstip")]
    DstIp,
    #[serde(rename = "protocol")]
    Protocol,
    #[serde(rename = "srcport")]
    SrcPort,
    #[serde(rename = "dstport")]
    DstPort,
    #[serde(rename = "vlan_id")]
    VlanId,
    /// Reserved for automaton state. Never set by user policies.
    #[serde(rename = "path_tag")]
    PathTag,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Switch,
        Field::InPort,
        Field::OutPort,
        Field::EthType,
        Field::SrcIp,
        Field::DstIp,
        Field::Protocol,
        Field::SrcPort,
        Field::DstPort,
        Field::VlanId,
        Field::PathTag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Switch => "switch",
            Field::InPort => "inport",
            Field::OutPort => "outport",
            Field::EthType => "ethtype",
            Field::SrcIp => "srcip",
            Field::DstIp => "dstip",
            Field::Protocol => "protocol",
            Field::SrcPort => "srcport",
            Field::DstPort => "dstport",
            Field::VlanId => "vlan_id",
            Field::PathTag => "path_tag",
        }
    }

    /// The kind of value this field holds when set.
    pub fn kind(self) -> ValueKind {
        match self {
            Field::SrcIp | Field::DstIp => ValueKind::Ip,
            _ => ValueKind::Int,
        }
    }

    /// Whether the field is part of the virtual location axis.
    pub fn is_location(self) -> bool {
        matches!(self, Field::Switch | Field::InPort)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("invalid value `{0}`")]
    InvalidValue(String),
}

impl FromStr for Field {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| ParseError::UnknownField(s.to_string()))
    }
}

/// Value domain of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Ip,
}

/// An IPv4 prefix. Host addresses are `/32` prefixes.
///
/// The stored address is always masked to the prefix length, so two prefixes
/// covering the same range compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Prefix {
    bits: u32,
    len: u8,
}

impl Ipv4Prefix {
    /// # Panics
    /// Panics if `len > 32`.
    pub fn new(addr: Ipv4Addr, len: u8) -> Self {
        assert!(len <= 32, "prefix length {len} exceeds 32");
        Self {
            bits: u32::from(addr) & Self::mask(len),
            len,
        }
    }

    pub fn host(addr: Ipv4Addr) -> Self {
        Self::new(addr, 32)
    }

    pub fn addr(self) -> Ipv4Addr {
        Ipv4Addr::from(self.bits)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> u8 {
        self.len
    }

    fn mask(len: u8) -> u32 {
        if len == 0 { 0 } else { u32::MAX << (32 - len) }
    }

    /// Whether every address of `other` is inside `self`.
    pub fn contains(self, other: Ipv4Prefix) -> bool {
        other.len >= self.len && other.bits & Self::mask(self.len) == self.bits
    }

    pub fn overlaps(self, other: Ipv4Prefix) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// The two prefixes one bit longer, or `None` for a host prefix.
    pub fn halves(self) -> Option<(Ipv4Prefix, Ipv4Prefix)> {
        if self.len == 32 {
            return None;
        }
        let len = self.len + 1;
        let high = self.bits | (1 << (32 - len));
        Some((
            Ipv4Prefix { bits: self.bits, len },
            Ipv4Prefix { bits: high, len },
        ))
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 32 {
            write!(f, "{}", self.addr())
        } else {
            write!(f, "{}/{}", self.addr(), self.len)
        }
    }
}

impl FromStr for Ipv4Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidValue(s.to_string());
        let (addr, len) = match s.split_once('/') {
            Some((addr, len)) => (addr, len.parse::<u8>().map_err(|_| invalid())?),
            None => (s, 32),
        };
        if len > 32 {
            return Err(invalid());
        }
        let addr = addr.parse::<Ipv4Addr>().map_err(|_| invalid())?;
        Ok(Ipv4Prefix::new(addr, len))
    }
}

/// A header value, or the sentinel for an absent field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Unset,
    Int(u64),
    Ip(Ipv4Prefix),
}

impl Value {
    /// `None` for the sentinel, which every field admits.
    pub fn kind(self) -> Option<ValueKind> {
        match self {
            Value::Unset => None,
            Value::Int(_) => Some(ValueKind::Int),
            Value::Ip(_) => Some(ValueKind::Ip),
        }
    }

    /// Whether a test `field = self` accepts a packet carrying `actual`.
    pub fn admits(self, actual: Value) -> bool {
        match (self, actual) {
            (Value::Ip(p), Value::Ip(q)) => p.contains(q),
            (expected, actual) => expected == actual,
        }
    }

    /// Intersection of two single-value constraints on the same field.
    pub fn meet(self, other: Value) -> Option<Value> {
        match (self, other) {
            (Value::Ip(p), Value::Ip(q)) if p.contains(q) => Some(other),
            (Value::Ip(p), Value::Ip(q)) if q.contains(p) => Some(self),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => f.write_str("unset"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Ip(p) => write!(f, "{p}"),
        }
    }
}

impl FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "unset" {
            return Ok(Value::Unset);
        }
        if let Ok(n) = s.parse::<u64>() {
            return Ok(Value::Int(n));
        }
        s.parse::<Ipv4Prefix>().map(Value::Ip)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::Ip(Ipv4Prefix::host(addr))
    }
}

impl From<Ipv4Prefix> for Value {
    fn from(prefix: Ipv4Prefix) -> Self {
        Value::Ip(prefix)
    }
}
