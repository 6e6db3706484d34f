use rand::prelude::*;

use ws_core::PodData;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string, safe for use in platform object names.
pub fn random_suffix(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect()
}

/// Returns `base` if the pod has no volume of that name, otherwise
/// `{base}-{suffix}` with a fresh suffix not used by any volume of the pod.
pub fn unique_volume_name(pod: &PodData, base: &str, suffix_length: usize) -> String {
    if !pod.has_volume(base) {
        return base.to_string();
    }
    loop {
        let candidate = format!("{}-{}", base, random_suffix(suffix_length));
        if !pod.has_volume(&candidate) {
            return candidate;
        }
    }
}
