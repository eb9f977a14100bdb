//! Net table, net classes and the per-load net code remapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::units::{mm_to_biu, Biu};

/// Net code of the "no net" entry.
pub const UNCONNECTED: i32 = 0;
/// Net code of items whose net could not be resolved.
pub const ORPHANED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: i32,
    pub name: String,
}

/// Nets of a board. Codes are consecutive starting at 0, and code 0 is
/// always the unnamed "unconnected" net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NetInfo>", into = "Vec<NetInfo>")]
pub struct NetTable {
    nets: Vec<NetInfo>,
    by_name: HashMap<String, i32>,
}

impl From<Vec<NetInfo>> for NetTable {
    fn from(nets: Vec<NetInfo>) -> Self {
        let mut table = NetTable::default();
        for net in nets.iter().filter(|n| n.code != UNCONNECTED) {
            table.add(&net.name);
        }
        table
    }
}

impl From<NetTable> for Vec<NetInfo> {
    fn from(table: NetTable) -> Self {
        table.nets
    }
}

impl Default for NetTable {
    fn default() -> Self {
        let mut table = Self {
            nets: Vec::new(),
            by_name: HashMap::new(),
        };
        table.nets.push(NetInfo {
            code: UNCONNECTED,
            name: String::new(),
        });
        table.by_name.insert(String::new(), UNCONNECTED);
        table
    }
}

impl NetTable {
    /// Add a net and return its board code. A name that already exists keeps
    /// its code; a new name gets the next free code.
    pub fn add(&mut self, name: &str) -> i32 {
        if let Some(code) = self.by_name.get(name) {
            return *code;
        }
        let code = self.nets.len() as i32;
        self.nets.push(NetInfo {
            code,
            name: name.to_string(),
        });
        self.by_name.insert(name.to_string(), code);
        code
    }

    pub fn get(&self, code: i32) -> Option<&NetInfo> {
        usize::try_from(code).ok().and_then(|i| self.nets.get(i))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&NetInfo> {
        self.by_name.get(name).and_then(|code| self.get(*code))
    }

    pub fn name(&self, code: i32) -> &str {
        self.get(code).map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn contains(&self, code: i32) -> bool {
        self.get(code).is_some()
    }

    /// Number of nets including net 0.
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets.iter()
    }
}

/// Maps net codes as written in a file to the codes assigned on the board.
#[derive(Debug, Clone, Default)]
pub struct NetCodeMap {
    codes: HashMap<i64, i32>,
}

impl NetCodeMap {
    pub fn insert(&mut self, file_code: i64, board_code: i32) {
        self.codes.insert(file_code, board_code);
    }

    /// Codes that were never declared pass through unchanged.
    pub fn map(&self, file_code: i64) -> i32 {
        match self.codes.get(&file_code) {
            Some(code) => *code,
            None => i32::try_from(file_code).unwrap_or(ORPHANED),
        }
    }
}

/// A named group of nets sharing routing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetClass {
    pub name: String,
    pub description: String,
    pub clearance: Biu,
    pub track_width: Biu,
    pub via_diameter: Biu,
    pub via_drill: Biu,
    pub micro_via_diameter: Biu,
    pub micro_via_drill: Biu,
    pub diff_pair_width: Option<Biu>,
    pub diff_pair_gap: Option<Biu>,
    pub nets: Vec<String>, // member net names, in file order
}

impl NetClass {
    pub const DEFAULT_NAME: &'static str = "Default";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            clearance: mm_to_biu(0.2),
            track_width: mm_to_biu(0.25),
            via_diameter: mm_to_biu(0.8),
            via_drill: mm_to_biu(0.4),
            micro_via_diameter: mm_to_biu(0.3),
            micro_via_drill: mm_to_biu(0.1),
            diff_pair_width: None,
            diff_pair_gap: None,
            nets: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == Self::DEFAULT_NAME
    }
}

impl Default for NetClass {
    fn default() -> Self {
        NetClass::new(NetClass::DEFAULT_NAME)
    }
}

/// The default class plus the named classes in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetClasses {
    pub default: NetClass,
    classes: Vec<NetClass>,
}

impl NetClasses {
    /// Add a class. A class named "Default" replaces the default class; any
    /// other name that is already present is handed back as the error.
    pub fn add(&mut self, class: NetClass) -> Result<(), NetClass> {
        if class.is_default() {
            self.default = class;
            return Ok(());
        }
        if self.find(&class.name).is_some() {
            return Err(class);
        }
        self.classes.push(class);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&NetClass> {
        if name == NetClass::DEFAULT_NAME {
            return Some(&self.default);
        }
        self.classes.iter().find(|c| c.name == name)
    }

    /// Named classes, excluding the default one.
    pub fn iter(&self) -> impl Iterator<Item = &NetClass> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
