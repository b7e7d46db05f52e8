use serde::Deserialize;

/// How a candidate file is keyed in the persisted sets.
///
/// - `Path`: the full path string of the recording (default). Two recordings
///   with the same name in different roots are tracked separately.
/// - `FileName`: only the bare file name. Suits a single flat recordings tree
///   where names are unique; a `Done` entry survives as long as a file of that
///   name exists anywhere under the watched roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    Path,
    FileName,
}

impl Default for IdentityMode {
    fn default() -> Self {
        IdentityMode::Path
    }
}
