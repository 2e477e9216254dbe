use rand::Rng;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::capture::selector::structural_path;
use crate::dom::dom_model::{Document, NodeId};
use crate::snapshot::snapshot_model::FieldData;

/// Range of the numeric suffix in synthetic fallback keys.
const FALLBACK_KEY_SPACE: u32 = 1000;

/// How keys are minted for forms with no identifiable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackKeys {
    /// Suffix derived from the element's structural position. Stable across
    /// captures of the same page; collisions probe to the next free suffix.
    #[default]
    Hashed,
    /// Uniformly random suffix, as older captures did. Not reproducible and
    /// may collide.
    Random,
}

impl std::str::FromStr for FallbackKeys {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hashed" => Ok(FallbackKeys::Hashed),
            "random" => Ok(FallbackKeys::Random),
            other => Err(format!("unknown fallback key policy '{}' (expected hashed or random)", other)),
        }
    }
}

/// Logical field name from the element's own attributes:
/// `name` > `id` > `aria-label` > `placeholder`.
pub fn derive_key(doc: &Document, id: NodeId) -> Option<String> {
    ["name", "id", "aria-label", "placeholder"]
        .iter()
        .find_map(|attr| doc.non_empty_attr(id, attr))
        .map(str::to_string)
}

/// `<tag>_<type>_<ordinal>` for unidentifiable elements in whole-document capture.
pub fn ordinal_key(doc: &Document, id: NodeId, ordinal: usize) -> String {
    let tag = doc.tag(id).unwrap_or("field");
    let ty = doc.input_type(id);
    let ty = if ty.is_empty() { "field" } else { ty.as_str() };
    format!("{}_{}_{}", tag, ty, ordinal)
}

/// `<type>_<n>` with `n` in `0..1000`, for the degenerate-form fallback pass.
pub fn fallback_key(
    policy: FallbackKeys,
    doc: &Document,
    id: NodeId,
    ordinal: usize,
    taken: &FieldData,
) -> String {
    let ty = doc.input_type(id);

    match policy {
        FallbackKeys::Random => {
            let n = rand::thread_rng().gen_range(0..FALLBACK_KEY_SPACE);
            format!("{}_{}", ty, n)
        }
        FallbackKeys::Hashed => {
            let seed = format!("{}|{}|{}", ty, structural_path(doc, id), ordinal);
            let start = position_hash(&seed) % FALLBACK_KEY_SPACE;

            (0..FALLBACK_KEY_SPACE)
                .map(|offset| format!("{}_{}", ty, (start + offset) % FALLBACK_KEY_SPACE))
                .find(|key| !taken.contains_key(key))
                .unwrap_or_else(|| format!("{}_{}", ty, start))
        }
    }
}

fn position_hash(seed: &str) -> u32 {
    let mut hasher = Sha1::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
