/// A label the bot wants to exist, with the color and description it
/// should carry when first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

/// The label set every managed repository converges to.
pub const ISSUE_LABELS: &[LabelSpec] = &[
    LabelSpec {
        name: "type: bug",
        color: "d73a4a",
        description: "Something isn't working",
    },
    LabelSpec {
        name: "type: feature",
        color: "a2eeef",
        description: "New feature or request",
    },
    LabelSpec {
        name: "type: docs",
        color: "0075ca",
        description: "Improvements or additions to documentation",
    },
    LabelSpec {
        name: "type: question",
        color: "d876e3",
        description: "Further information is requested",
    },
    LabelSpec {
        name: "priority: p0",
        color: "b60205",
        description: "Needs an immediate fix",
    },
    LabelSpec {
        name: "priority: p1",
        color: "d93f0b",
        description: "Fix in the next release",
    },
    LabelSpec {
        name: "priority: p2",
        color: "fbca04",
        description: "Fix when convenient",
    },
    LabelSpec {
        name: "automerge",
        color: "0000ff",
        description: "Merge once the checks pass",
    },
    LabelSpec {
        name: "autorelease: pending",
        color: "ededed",
        description: "Release pull request is open",
    },
    LabelSpec {
        name: "autorelease: tagged",
        color: "ededed",
        description: "Release has been tagged",
    },
];

/// GitHub's stock labels we retire in favor of the `type:` set. Matched
/// case-sensitively so user-renamed variants survive.
pub const LEGACY_LABELS: &[&str] = &["bug", "enhancement", "question"];

/// A label as it currently exists on the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLabel {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

/// One pending mutation of the repository's label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOp {
    Create(LabelSpec),
    Update(LabelUpdate),
    Delete(String),
}

impl LabelOp {
    pub fn label_name(&self) -> &str {
        match self {
            Self::Create(spec) => spec.name,
            Self::Update(update) => &update.existing_name,
            Self::Delete(name) => name,
        }
    }
}

impl std::fmt::Display for LabelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create(spec) => write!(f, "create '{}'", spec.name),
            Self::Update(update) => {
                write!(f, "update '{}' -> '{}'", update.existing_name, update.spec.name)
            }
            Self::Delete(name) => write!(f, "delete '{}'", name),
        }
    }
}

/// An existing label whose color (and possibly name casing) is wrong.
/// The update is addressed by the name GitHub currently knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUpdate {
    pub existing_name: String,
    pub spec: LabelSpec,
}

/// Everything `diff` decided to change. Empty means converged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelDelta {
    pub to_create: Vec<LabelSpec>,
    pub to_update: Vec<LabelUpdate>,
    pub to_delete: Vec<String>,
}

impl LabelDelta {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn into_ops(self) -> Vec<LabelOp> {
        let mut ops = Vec::with_capacity(
            self.to_create.len() + self.to_update.len() + self.to_delete.len(),
        );
        ops.extend(self.to_create.into_iter().map(LabelOp::Create));
        ops.extend(self.to_update.into_iter().map(LabelOp::Update));
        ops.extend(self.to_delete.into_iter().map(LabelOp::Delete));
        ops
    }
}

/// Compares the desired set against what the repository has. Pure: the
/// caller applies the returned delta.
///
/// Names match case-insensitively. A matched label is updated only when
/// its color differs; descriptions are the repository owner's business
/// once the label exists. Labels on the denylist are deleted no matter
/// what the desired set says.
pub fn diff(desired: &[LabelSpec], existing: &[RemoteLabel], denylist: &[&str]) -> LabelDelta {
    let mut delta = LabelDelta::default();

    for spec in desired {
        match existing
            .iter()
            .find(|label| label.name.eq_ignore_ascii_case(spec.name))
        {
            None => delta.to_create.push(*spec),
            Some(label) if !label.color.eq_ignore_ascii_case(spec.color) => {
                delta.to_update.push(LabelUpdate {
                    existing_name: label.name.clone(),
                    spec: *spec,
                });
            }
            Some(_) => {}
        }
    }

    for label in existing {
        if denylist.contains(&label.name.as_str()) {
            delta.to_delete.push(label.name.clone());
        }
    }

    delta
}
