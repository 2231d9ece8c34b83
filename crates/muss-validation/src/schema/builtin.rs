//! Embedded registries for the published protocol versions.

use super::SchemaRegistry;
use once_cell::sync::Lazy;
use std::fmt;

/// Protocol versions with a builtin registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Universal Seed Summary Invoker v1.3
    Uss13,
    /// Memory-Augmented Universal Seed System v1.0
    Muss10,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Uss13, Protocol::Muss10];

    /// Pick the protocol a raw artifact declares in its `protocol:`
    /// frontmatter line. Anything that does not name the memory-augmented
    /// system is treated as USS.
    pub fn detect(content: &str) -> Protocol {
        let mut lines = content.lines();
        if lines.next().map(str::trim_end) != Some("---") {
            return Protocol::Uss13;
        }
        let declared = lines
            .take_while(|line| line.trim_end() != "---")
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim() == "protocol")
            .map(|(_, value)| value.to_ascii_lowercase());

        match declared {
            Some(value) if value.contains("memory-augmented") || value.contains("muss") => Protocol::Muss10,
            _ => Protocol::Uss13,
        }
    }

    /// Stable identifier accepted on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Protocol::Uss13 => "uss-1.3",
            Protocol::Muss10 => "muss-1.0",
        }
    }

    pub fn from_id(id: &str) -> Option<Protocol> {
        Protocol::ALL.into_iter().find(|p| p.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

static USS_1_3: Lazy<SchemaRegistry> = Lazy::new(|| {
    SchemaRegistry::from_yaml_str(include_str!("../../schemas/uss-1.3.yaml"))
        .expect("Invalid builtin USS v1.3 registry - this is a bug")
});

static MUSS_1_0: Lazy<SchemaRegistry> = Lazy::new(|| {
    SchemaRegistry::from_yaml_str(include_str!("../../schemas/muss-1.0.yaml"))
        .expect("Invalid builtin MUSS v1.0 registry - this is a bug")
});

pub(crate) fn registry(protocol: Protocol) -> &'static SchemaRegistry {
    match protocol {
        Protocol::Uss13 => &USS_1_3,
        Protocol::Muss10 => &MUSS_1_0,
    }
}
