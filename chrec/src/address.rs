//! Network addresses.
//!
//! Two kinds of address appear in recordings. A [`SocketAddress`] is a concrete address that a
//! channel is bound or connected to. An [`EndpointAddress`] is an unresolved locator which may
//! name a host, a service, a path or a URL.

use std::{
    fmt,
    net::{self, Ipv4Addr, Ipv6Addr},
};

use serde_json::Value;

use crate::codec::{
    Decode, DecodeError, Encode, EncodeError, RecordReader, RecordWriter, serde_via_codec,
};

const TYPE: &str = "type";
const SUB_TYPE: &str = "subType";
const ADDRESS: &str = "address";
const PORT: &str = "port";
const PATH: &str = "path";

pub(crate) const PAYLOAD_1: &str = "payload1";
pub(crate) const PAYLOAD_2: &str = "payload2";
pub(crate) const PAYLOAD_3: &str = "payload3";
pub(crate) const PAYLOAD_4: &str = "payload4";

/// A concrete socket address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SocketAddress {
    /// An IPv4 address in textual form and a port.
    V4 { address: String, port: u16 },
    /// An IPv6 address in textual form and a port.
    V6 { address: String, port: u16 },
    /// A unix domain socket path.
    UnixDomain { path: String },
}

impl SocketAddress {
    /// Create a unix domain socket address from a fixed size path buffer.
    ///
    /// The buffer is truncated at the first null byte. Invalid UTF-8 is replaced.
    pub fn unix_from_path_bytes(bytes: &[u8]) -> Self {
        let len = bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(bytes.len());
        Self::UnixDomain {
            path: String::from_utf8_lossy(&bytes[..len]).into_owned(),
        }
    }

    /// The port, unix domain socket addresses have none.
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::V4 { port, .. } | Self::V6 { port, .. } => Some(*port),
            Self::UnixDomain { .. } => None,
        }
    }

    fn type_str(&self) -> &'static str {
        match self {
            Self::V4 { .. } => "v4",
            Self::V6 { .. } => "v6",
            Self::UnixDomain { .. } => "unix",
        }
    }
}

impl From<net::SocketAddr> for SocketAddress {
    fn from(value: net::SocketAddr) -> Self {
        match value {
            net::SocketAddr::V4(addr) => Self::V4 {
                address: addr.ip().to_string(),
                port: addr.port(),
            },
            net::SocketAddr::V6(addr) => Self::V6 {
                address: addr.ip().to_string(),
                port: addr.port(),
            },
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 { address, port } => write!(f, "{address}:{port}"),
            Self::V6 { address, port } => write!(f, "[{address}]:{port}"),
            Self::UnixDomain { path } => write!(f, "unix:{path}"),
        }
    }
}

impl Encode for SocketAddress {
    fn encode(&self) -> Result<Value, EncodeError> {
        let record = RecordWriter::new().field(TYPE, self.type_str());
        let record = match self {
            Self::V4 { address, port } | Self::V6 { address, port } => {
                record.field(ADDRESS, address.as_str()).field(PORT, *port)
            }
            Self::UnixDomain { path } => record.field(PATH, path.as_str()),
        };

        Ok(record.finish())
    }
}

impl Decode for SocketAddress {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        match record.str(TYPE)? {
            "v4" => Ok(Self::V4 {
                address: record.string(ADDRESS)?,
                port: record.u16(PORT)?,
            }),
            "v6" => Ok(Self::V6 {
                address: record.string(ADDRESS)?,
                port: record.u16(PORT)?,
            }),
            "unix" => Ok(Self::UnixDomain {
                path: record.string(PATH)?,
            }),
            other => Err(record.unknown(TYPE, other)),
        }
    }
}

/// The host part of a [`EndpointAddress::HostPort`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostSpec {
    /// A host name to be resolved, optionally restricted to a network interface.
    Name {
        name: String,
        interface_name: Option<String>,
    },
    /// Raw IPv4 address bytes in network order.
    Ipv4([u8; 4]),
    /// Raw IPv6 address bytes in network order.
    Ipv6([u8; 16]),
}

/// An unresolved endpoint to connect or bind to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EndpointAddress {
    HostPort {
        host: HostSpec,
        port: u16,
    },
    /// A service discovery record.
    Service {
        name: String,
        service_type: String,
        domain: String,
        interface_name: Option<String>,
    },
    UnixPath {
        path: String,
    },
    /// Any other locator, expressed as a URL.
    Locator {
        url: String,
    },
    /// No endpoint was specified.
    Unspecified,
}

impl From<net::SocketAddr> for EndpointAddress {
    fn from(value: net::SocketAddr) -> Self {
        let host = match value.ip() {
            net::IpAddr::V4(ip) => HostSpec::Ipv4(ip.octets()),
            net::IpAddr::V6(ip) => HostSpec::Ipv6(ip.octets()),
        };
        Self::HostPort {
            host,
            port: value.port(),
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostPort { host, port } => match host {
                HostSpec::Name {
                    name,
                    interface_name: Some(interface),
                } => write!(f, "{name}%{interface}:{port}"),
                HostSpec::Name { name, .. } => write!(f, "{name}:{port}"),
                HostSpec::Ipv4(octets) => write!(f, "{}:{port}", Ipv4Addr::from(*octets)),
                HostSpec::Ipv6(octets) => write!(f, "[{}]:{port}", Ipv6Addr::from(*octets)),
            },
            Self::Service {
                name,
                service_type,
                domain,
                ..
            } => write!(f, "{name}.{service_type}.{domain}"),
            Self::UnixPath { path } => write!(f, "unix:{path}"),
            Self::Locator { url } => write!(f, "{url}"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// The names of the two discriminator fields of an endpoint record.
///
/// A standalone endpoint record uses `type` and `subType`. When an endpoint is nested into an
/// outbound user event record, `type` belongs to the user event and the endpoint discriminators
/// move to `subType` and `hostType`. The payload slots are the same in both cases.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EndpointKeys {
    kind: &'static str,
    host: &'static str,
}

impl EndpointKeys {
    pub(crate) const STANDALONE: Self = Self {
        kind: TYPE,
        host: SUB_TYPE,
    };

    pub(crate) const NESTED: Self = Self {
        kind: SUB_TYPE,
        host: "hostType",
    };
}

impl EndpointAddress {
    fn kind_str(&self) -> &'static str {
        match self {
            Self::HostPort { .. } => "hostPort",
            Self::Service { .. } => "service",
            Self::UnixPath { .. } => "unixDomainSocket",
            Self::Locator { .. } => "url",
            Self::Unspecified => "unspecified",
        }
    }

    pub(crate) fn write_fields(&self, record: RecordWriter, keys: EndpointKeys) -> RecordWriter {
        let record = record.field(keys.kind, self.kind_str());
        match self {
            Self::HostPort { host, port } => {
                let record = match host {
                    HostSpec::Name {
                        name,
                        interface_name,
                    } => record
                        .field(keys.host, "name")
                        .field(PAYLOAD_1, name.as_str())
                        .optional_field(PAYLOAD_3, interface_name.as_deref()),
                    HostSpec::Ipv4(octets) => record
                        .field(keys.host, "ipv4")
                        .field(PAYLOAD_1, octets.to_vec()),
                    HostSpec::Ipv6(octets) => record
                        .field(keys.host, "ipv6")
                        .field(PAYLOAD_1, octets.to_vec()),
                };
                record.field(PAYLOAD_2, *port)
            }
            Self::Service {
                name,
                service_type,
                domain,
                interface_name,
            } => record
                .field(PAYLOAD_1, name.as_str())
                .field(PAYLOAD_2, service_type.as_str())
                .field(PAYLOAD_3, domain.as_str())
                .optional_field(PAYLOAD_4, interface_name.as_deref()),
            Self::UnixPath { path } => record.field(PAYLOAD_1, path.as_str()),
            Self::Locator { url } => record.field(PAYLOAD_1, url.as_str()),
            Self::Unspecified => record,
        }
    }

    pub(crate) fn read_fields(
        record: &RecordReader<'_>,
        keys: EndpointKeys,
    ) -> Result<Self, DecodeError> {
        match record.str(keys.kind)? {
            "hostPort" => {
                let host = match record.str(keys.host)? {
                    "name" => HostSpec::Name {
                        name: record.string(PAYLOAD_1)?,
                        interface_name: record.optional_string(PAYLOAD_3)?,
                    },
                    "ipv4" => HostSpec::Ipv4(record.bytes(PAYLOAD_1)?),
                    "ipv6" => HostSpec::Ipv6(record.bytes(PAYLOAD_1)?),
                    other => return Err(record.unknown(keys.host, other)),
                };
                Ok(Self::HostPort {
                    host,
                    port: record.u16(PAYLOAD_2)?,
                })
            }
            "service" => Ok(Self::Service {
                name: record.string(PAYLOAD_1)?,
                service_type: record.string(PAYLOAD_2)?,
                domain: record.string(PAYLOAD_3)?,
                interface_name: record.optional_string(PAYLOAD_4)?,
            }),
            "unixDomainSocket" => Ok(Self::UnixPath {
                path: record.string(PAYLOAD_1)?,
            }),
            "url" => Ok(Self::Locator {
                url: record.string(PAYLOAD_1)?,
            }),
            "unspecified" => Ok(Self::Unspecified),
            other => Err(record.unknown(keys.kind, other)),
        }
    }
}

impl Encode for EndpointAddress {
    fn encode(&self) -> Result<Value, EncodeError> {
        Ok(self
            .write_fields(RecordWriter::new(), EndpointKeys::STANDALONE)
            .finish())
    }
}

impl Decode for EndpointAddress {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        Self::read_fields(&record, EndpointKeys::STANDALONE)
    }
}

serde_via_codec!(SocketAddress, EndpointAddress);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_path_truncated_at_null() {
        let mut buffer = [0_u8; 108];
        buffer[..9].copy_from_slice(b"/tmp/sock");

        assert_eq!(
            SocketAddress::unix_from_path_bytes(&buffer),
            SocketAddress::UnixDomain {
                path: "/tmp/sock".into()
            }
        );
    }

    #[test]
    fn unix_path_without_null() {
        assert_eq!(
            SocketAddress::unix_from_path_bytes(b"/run/x"),
            SocketAddress::UnixDomain {
                path: "/run/x".into()
            }
        );
    }

    #[test]
    fn from_std_socket_addr() {
        let addr: net::SocketAddr = "[::1]:8080".parse().unwrap();

        assert_eq!(
            SocketAddress::from(addr),
            SocketAddress::V6 {
                address: "::1".into(),
                port: 8080
            }
        );

        let mut expected = [0_u8; 16];
        expected[15] = 1;
        assert_eq!(
            EndpointAddress::from(addr),
            EndpointAddress::HostPort {
                host: HostSpec::Ipv6(expected),
                port: 8080
            }
        );
    }

    #[test]
    fn display() {
        let endpoint = EndpointAddress::HostPort {
            host: HostSpec::Ipv4([10, 0, 0, 1]),
            port: 443,
        };
        assert_eq!(endpoint.to_string(), "10.0.0.1:443");

        let socket = SocketAddress::V6 {
            address: "fe80::1".into(),
            port: 22,
        };
        assert_eq!(socket.to_string(), "[fe80::1]:22");
    }
}
