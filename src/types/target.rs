use crate::ClassifiedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a forecast or suggestion is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    NodeCpu,
    NodeMem,
    PodCpu,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::NodeCpu, Target::NodeMem, Target::PodCpu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::NodeCpu => "node_cpu",
            Target::NodeMem => "node_mem",
            Target::PodCpu => "pod_cpu",
        }
    }

    pub fn is_node_scoped(&self) -> bool {
        matches!(self, Target::NodeCpu | Target::NodeMem)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ClassifiedError::param("target required"));
        }
        Self::parse(s).ok_or_else(|| ClassifiedError::param("invalid target"))
    }
}

/// Replica scaling policy for pod targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePolicy {
    #[default]
    Stair,
    Linear,
}

impl ScalePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalePolicy::Stair => "stair",
            ScalePolicy::Linear => "linear",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stair" => Some(ScalePolicy::Stair),
            "linear" => Some(ScalePolicy::Linear),
            _ => None,
        }
    }
}
