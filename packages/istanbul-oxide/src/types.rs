use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{coverage::Coverage, Range};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionMapping {
    pub name: String,
    pub decl: Range,
    pub loc: Range,
    pub line: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchMapping {
    pub loc: Range,
    #[serde(rename = "type")]
    pub branch_type: String,
    pub locations: Vec<Range>,
    pub line: u32,
}

impl BranchMapping {
    /// Source line the branch point is reported on. Older coverage output
    /// carries an explicit `line`, newer output only the `loc`.
    pub fn source_line(&self) -> u32 {
        if self.line > 0 {
            self.line
        } else {
            self.loc.start.line
        }
    }
}

/// Map to line number to hit count.
pub type LineHitMap = BTreeMap<u32, u32>;
pub type StatementMap = BTreeMap<u32, Range>;
pub type StatementHitMap = BTreeMap<u32, u32>;
pub type FunctionMap = BTreeMap<u32, FunctionMapping>;
pub type FunctionHitMap = BTreeMap<u32, u32>;
pub type BranchMap = BTreeMap<u32, BranchMapping>;
pub type BranchHitMap = BTreeMap<u32, Vec<u32>>;
/// Branch outcome coverage keyed by source line.
pub type BranchCoverageMap = BTreeMap<u32, Coverage>;
