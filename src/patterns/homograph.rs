//! Homograph (look-alike character) detection.

use super::tables::HOMOGRAPHS;

/// A non-Latin character found in a domain and the letter it imitates.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomographMatch {
    pub character: char,
    pub looks_like: char,
    pub position: usize,
}

fn latin_lookalike(c: char) -> Option<char> {
    HOMOGRAPHS
        .iter()
        .find(|(homograph, _)| *homograph == c)
        .map(|(_, latin)| *latin)
}

/// Finds every table homograph in `domain` (which must be in Unicode form).
pub(crate) fn find_homographs(domain: &str) -> Vec<HomographMatch> {
    domain
        .chars()
        .enumerate()
        .filter(|(_, c)| !c.is_ascii())
        .filter_map(|(position, character)| {
            latin_lookalike(character).map(|looks_like| HomographMatch {
                character,
                looks_like,
                position,
            })
        })
        .collect()
}

/// Replaces every known homograph with the Latin letter it imitates.
pub(crate) fn skeleton(text: &str) -> String {
    text.chars()
        .map(|c| latin_lookalike(c).unwrap_or(c))
        .collect()
}

/// Positional character similarity after mapping homographs to Latin.
///
/// Returns the share of positions (over the longer string) whose characters
/// agree once look-alikes are folded.
pub(crate) fn homograph_similarity(candidate: &str, brand: &str) -> f64 {
    let folded: Vec<char> = skeleton(candidate).chars().collect();
    let brand: Vec<char> = brand.chars().collect();
    let longest = folded.len().max(brand.len());
    if longest == 0 {
        return 0.0;
    }
    let same = folded
        .iter()
        .zip(brand.iter())
        .filter(|(a, b)| a == b)
        .count();
    same as f64 / longest as f64
}
