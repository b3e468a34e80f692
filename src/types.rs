use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

/// Conditions reported by the Get Errors command, one bit each.
#[derive(Debug, EnumIter, IntoStaticStr, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorFlag {
    SerialSignalError = 0,
    SerialOverrunError = 1,
    SerialRxBufferFull = 2,
    SerialCrcError = 3,
    SerialProtocolError = 4,
    SerialTimeoutError = 5,
    ScriptStackError = 6,
    ScriptCallStackError = 7,
    ScriptProgramCounterError = 8,
}

impl ErrorFlag {
    pub fn mask(self) -> u16 {
        1 << (self as u16)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for ErrorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw error register as returned by the board.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ErrorFlags(u16);

impl ErrorFlags {
    pub fn from_bits(bits: u16) -> Self {
        ErrorFlags(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, flag: ErrorFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// True when none of the named flags is set. Unassigned high bits are ignored.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = ErrorFlag> + '_ {
        ErrorFlag::iter().filter(move |flag| self.contains(*flag))
    }

    /// Every named flag with its state, keyed by its snake_case name.
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        ErrorFlag::iter()
            .map(|flag| (flag.name(), self.contains(flag)))
            .collect()
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(ErrorFlag::name).collect();
        f.write_str(&names.join(", "))
    }
}
