//! Label ↔ code tables for the switch configuration attributes.
//!
//! Every table is `static` data. Labels and codes are each unique within a
//! table, so the mapping is a bijection and decoding never has to pick
//! between candidates.

use serde_json::Value;

/// A named, ordered mapping between human-readable labels and one-byte codes.
#[derive(Debug)]
pub struct EnumTable {
    pub name: &'static str,
    entries: &'static [(&'static str, u8)],
}

pub static SWITCH_TYPES: EnumTable = EnumTable {
    name: "switch_type",
    entries: &[
        ("switch", 0x00),
        ("single click", 0x01),
        ("multi-click", 0x02),
        ("reset to defaults", 0xff),
    ],
};

pub static SWITCH_ACTIONS: EnumTable = EnumTable {
    name: "switch_actions",
    entries: &[("on", 0x00), ("off", 0x01), ("toggle", 0x02)],
};

pub static INPUT_LINK: EnumTable = EnumTable {
    name: "link_to_output",
    entries: &[("no", 0x00), ("yes", 0x01)],
};

pub static BIND_COMMANDS: EnumTable = EnumTable {
    name: "bind_command",
    entries: &[
        ("on/off", 0x00),
        ("toggle", 0x01),
        ("change level up", 0x02),
        ("change level down", 0x03),
        ("change level up with off", 0x04),
        ("change level down with off", 0x05),
        ("recall scene 0", 0x06),
        ("recall scene 1", 0x07),
        ("recall scene 2", 0x08),
        ("recall scene 3", 0x09),
        ("recall scene 4", 0x0a),
        ("recall scene 5", 0x0b),
    ],
};

impl EnumTable {
    /// Resolve a label, or a raw decimal override, to the code to write.
    ///
    /// A known label wins. Otherwise the input is read as a base-10 integer
    /// (leading whitespace, optional sign, longest digit prefix) and returned
    /// verbatim even when the table has no such code. A digit run beyond the
    /// `i64` range saturates. Returns `None` when the input is neither.
    pub fn encode(&self, input: &str) -> Option<i64> {
        match self.code_of(input) {
            Some(code) => Some(i64::from(code)),
            None => parse_leading_int(input),
        }
    }

    /// Code for an exact label.
    pub fn code_of(&self, label: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, code)| *code)
    }

    /// Label for a raw attribute value.
    ///
    /// Numbers and strings holding a decimal number both match. Anything else,
    /// and codes missing from the table, yield `None`.
    pub fn decode(&self, raw: &Value) -> Option<&'static str> {
        let code = match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        self.label_for(code)
    }

    /// Label for a code, by linear search.
    pub fn label_for(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| i64::from(*c) == code)
            .map(|(label, _)| *label)
    }

    /// Labels ordered by ascending code, for presentation.
    pub fn sorted_labels(&self) -> Vec<&'static str> {
        let mut entries = self.entries.to_vec();
        entries.sort_by_key(|(_, code)| *code);
        entries.into_iter().map(|(label, _)| label).collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }
}

fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Only overflow can fail here; it saturates.
    let value: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
