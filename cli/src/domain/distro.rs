//! Supported host distributions.
//!
//! Pure functions only. The host's distro name and version are read by the
//! infra layer (`/etc/os-release`) and passed in here.

/// Distro name prefixes (lower-case) and the versions supported for each.
const SUPPORTED: &[(&str, &[&str])] = &[
    ("redhat", &["5", "6", "7"]),
    ("centos", &["5", "6", "7"]),
    ("red hat", &["5", "6", "7"]),
    ("oracle", &["5", "6", "7"]),
    ("debian", &["6", "7", "8"]),
    ("ubuntu", &["12.04", "14.04", "15.04", "15.10", "16.04", "16.10"]),
    ("suse", &["11", "12"]),
    ("sles", &["11", "12"]),
];

/// Host distribution as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDistro {
    pub name: String,
    pub version: String,
}

impl HostDistro {
    /// Parse `/etc/os-release` content. `NAME` is preferred over `ID`.
    ///
    /// Returns `None` when neither name field is present.
    #[must_use]
    pub fn from_os_release(text: &str) -> Option<Self> {
        let field = |key: &str| {
            text.lines().find_map(|line| {
                let (k, v) = line.split_once('=')?;
                (k.trim() == key).then(|| v.trim().trim_matches(['"', '\'']).to_string())
            })
        };
        let name = field("NAME").or_else(|| field("ID"))?;
        Some(Self {
            name,
            version: field("VERSION_ID").unwrap_or_default(),
        })
    }

    /// Whether the agent supports this distribution and version.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        let name = self.name.to_lowercase();
        SUPPORTED
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix))
            .any(|(_, versions)| versions.iter().any(|v| version_matches(&self.version, v)))
    }
}

/// `host` matches `supported` when it has at least as many dot-separated
/// components and each supported component equals the host's numerically,
/// e.g. host `7.3.1611` matches supported `7`, host `16` does not match `16.04`.
fn version_matches(host: &str, supported: &str) -> bool {
    let host_parts: Vec<&str> = host.split('.').collect();
    supported.split('.').enumerate().all(|(idx, want)| {
        let (Ok(want), Some(Ok(have))) = (
            want.parse::<u32>(),
            host_parts.get(idx).map(|p| p.parse::<u32>()),
        ) else {
            return false;
        };
        want == have
    })
}
