use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 资产支持的连接协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolName {
    Ssh,
    Rdp,
    Telnet,
    Vnc,
}

impl ProtocolName {
    pub const ALL: [ProtocolName; 4] = [
        ProtocolName::Ssh,
        ProtocolName::Rdp,
        ProtocolName::Telnet,
        ProtocolName::Vnc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolName::Ssh => "ssh",
            ProtocolName::Rdp => "rdp",
            ProtocolName::Telnet => "telnet",
            ProtocolName::Vnc => "vnc",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ProtocolName::Ssh => 22,
            ProtocolName::Rdp => 3389,
            ProtocolName::Telnet => 23,
            ProtocolName::Vnc => 5901,
        }
    }
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtocolName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported protocol: {}", s))
    }
}

/// 协议条目，生命周期完全归属于所在资产
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub name: ProtocolName,
    pub port: u16,
}

impl Protocol {
    pub fn new(name: ProtocolName, port: u16) -> Self {
        Self { name, port }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.port)
    }
}
