//! Lifecycle operations requested by the hosting agent.

use std::fmt;
use std::str::FromStr;

/// A lifecycle operation, one per process invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Enable,
    Disable,
    Uninstall,
    Update,
}

impl Operation {
    /// Name used in status reports and log lines.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Enable => "Enable",
            Self::Disable => "Disable",
            Self::Uninstall => "Uninstall",
            Self::Update => "Update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    /// Accepts the spellings the hosting agent uses: any run of leading `-` or
    /// `/` followed by the operation name, e.g. `-install`, `/enable`, `disable`.
    ///
    /// `uninstall` is checked before `install` so that the longer name wins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_start_matches(['-', '/']);
        // Order matters: "uninstall" must not be read as "install".
        let candidates = [
            ("disable", Self::Disable),
            ("uninstall", Self::Uninstall),
            ("install", Self::Install),
            ("enable", Self::Enable),
            ("update", Self::Update),
        ];
        candidates
            .into_iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, op)| op)
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}
