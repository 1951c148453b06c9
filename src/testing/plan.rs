//! Run-group normalization and dependency setup resolution

use std::collections::BTreeMap;

use crate::common::config::{Project, RunGroup, SetupOverride};

/// Per-dependency overrides of one run group
pub type Overrides = BTreeMap<String, SetupOverride>;

/// A run group reduced to its target list and (possibly absent) overrides
#[derive(Debug, Clone, Copy)]
pub struct NormalizedGroup<'a> {
    pub targets: &'a [String],
    pub overrides: Option<&'a Overrides>,
}

impl RunGroup {
    /// Normalize any accepted run-group form
    pub fn normalize(&self) -> NormalizedGroup<'_> {
        match self {
            RunGroup::Single(target) => NormalizedGroup {
                targets: std::slice::from_ref(target),
                overrides: None,
            },
            RunGroup::Targets(targets) => NormalizedGroup {
                targets,
                overrides: None,
            },
            RunGroup::Detailed(group) => NormalizedGroup {
                targets: &group.tests,
                overrides: Some(&group.overrides),
            },
        }
    }
}

/// Effective reset and fixture lists for one dependency in one run group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSetup {
    pub reset: Vec<String>,
    pub fixtures: Vec<String>,
}

/// Resolve the setup of `dependency` under a run group's overrides
///
/// Each attribute is resolved on its own: the override list when present and
/// non-empty, otherwise the dependency's project default. An empty override
/// list falls back to the default; it does not mean "nothing".
pub fn resolve_setup(dependency: &Project, overrides: Option<&Overrides>) -> ResolvedSetup {
    let over = overrides.and_then(|map| map.get(&dependency.name));

    ResolvedSetup {
        reset: pick(over.and_then(|o| o.reset.as_ref()), &dependency.reset),
        fixtures: pick(over.and_then(|o| o.fixtures.as_ref()), &dependency.fixtures),
    }
}

fn pick(over: Option<&Vec<String>>, default: &[String]) -> Vec<String> {
    match over {
        Some(list) if !list.is_empty() => list.clone(),
        _ => default.to_vec(),
    }
}
