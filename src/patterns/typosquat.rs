//! Typosquatting and brand impersonation heuristics.

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use super::homograph::homograph_similarity;
use super::tables::{BRANDS, CHAR_SUBSTITUTIONS};

/// Lower bound (exclusive) of edit similarity treated as a typosquat.
const TYPOSQUAT_MIN_SIMILARITY: f64 = 0.7;
/// Shortest brand matched as a token prefix; shorter ones collide with ordinary words.
const MIN_PREFIX_BRAND_LEN: usize = 5;
/// Shortest brand matched as a token suffix ("purchase" must not match "chase").
const MIN_SUFFIX_BRAND_LEN: usize = 6;

const EXACT_SUBSTRING_CONFIDENCE: f64 = 0.95;
const NON_EXACT_CONFIDENCE_CAP: f64 = 0.85;
const LEVENSHTEIN_WEIGHT: f64 = 0.7;
const HOMOGRAPH_WEIGHT: f64 = 0.3;
/// Impersonation is only reported above this confidence.
pub(crate) const IMPERSONATION_REPORT_THRESHOLD: f64 = 0.6;

/// How a typosquat differs from its target brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TyposquatTechnique {
    Substitution,
    Insertion,
    Deletion,
    CharacterSubstitution,
    Hyphenation,
    Concatenation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TyposquatMatch {
    pub target: String,
    pub technique: TyposquatTechnique,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandImpersonation {
    pub brand: String,
    pub confidence: f64,
    pub exact_substring: bool,
}

pub(crate) fn is_exact_brand(label: &str) -> bool {
    BRANDS.contains(&label)
}

/// Checks a second-level label against the brand list.
///
/// An exact brand label is legitimate and never a typosquat.
pub(crate) fn detect_typosquat(label: &str) -> Option<TyposquatMatch> {
    if label.is_empty() || is_exact_brand(label) {
        return None;
    }

    let best_edit = BRANDS
        .iter()
        .map(|brand| (*brand, normalized_levenshtein(label, brand)))
        .filter(|(_, sim)| *sim > TYPOSQUAT_MIN_SIMILARITY && *sim < 1.0)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((brand, similarity)) = best_edit {
        let label_len = label.chars().count();
        let technique = match label_len.cmp(&brand.len()) {
            std::cmp::Ordering::Equal => TyposquatTechnique::Substitution,
            std::cmp::Ordering::Greater => TyposquatTechnique::Insertion,
            std::cmp::Ordering::Less => TyposquatTechnique::Deletion,
        };
        return Some(TyposquatMatch {
            target: brand.to_string(),
            technique,
            similarity,
        });
    }

    for brand in BRANDS {
        if undo_substitutions(label).iter().any(|c| c == brand) {
            return Some(TyposquatMatch {
                target: brand.to_string(),
                technique: TyposquatTechnique::CharacterSubstitution,
                similarity: normalized_levenshtein(label, brand),
            });
        }
        if label.contains('-') && label.replace('-', "") == *brand {
            return Some(TyposquatMatch {
                target: brand.to_string(),
                technique: TyposquatTechnique::Hyphenation,
                similarity: normalized_levenshtein(label, brand),
            });
        }
    }

    BRANDS
        .iter()
        .filter(|brand| contains_brand_token(label, brand))
        .max_by_key(|brand| brand.len())
        .map(|brand| TyposquatMatch {
            target: brand.to_string(),
            technique: TyposquatTechnique::Concatenation,
            similarity: normalized_levenshtein(label, brand),
        })
}

/// Whether `text` carries `brand` as a token, or glued to the start or end of
/// one, where tokens are separated by dots, hyphens and underscores.
pub(crate) fn contains_brand_token(text: &str, brand: &str) -> bool {
    text.split(['.', '-', '_']).any(|token| {
        token == brand
            || (brand.len() >= MIN_PREFIX_BRAND_LEN && token.starts_with(brand))
            || (brand.len() >= MIN_SUFFIX_BRAND_LEN && token.ends_with(brand))
    })
}

/// Candidate spellings with look-alike ASCII sequences reverted, one rule at a
/// time and all rules together.
fn undo_substitutions(label: &str) -> Vec<String> {
    let mut candidates: Vec<String> = CHAR_SUBSTITUTIONS
        .iter()
        .filter(|(fake, _)| label.contains(fake))
        .map(|(fake, real)| label.replace(fake, real))
        .collect();
    let all = CHAR_SUBSTITUTIONS
        .iter()
        .fold(label.to_string(), |acc, (fake, real)| acc.replace(fake, real));
    candidates.push(all);
    candidates
}

/// Scores how strongly a host impersonates a brand.
///
/// `host` is the full (Unicode) hostname and `label` its second-level label.
/// A host whose label is exactly a brand is that brand and is never reported.
pub(crate) fn detect_brand_impersonation(host: &str, label: &str) -> Option<BrandImpersonation> {
    if label.is_empty() || is_exact_brand(label) {
        return None;
    }

    BRANDS
        .iter()
        .map(|brand| {
            if contains_brand_token(host, brand) {
                BrandImpersonation {
                    brand: brand.to_string(),
                    confidence: EXACT_SUBSTRING_CONFIDENCE,
                    exact_substring: true,
                }
            } else {
                let blended = LEVENSHTEIN_WEIGHT * normalized_levenshtein(label, brand)
                    + HOMOGRAPH_WEIGHT * homograph_similarity(label, brand);
                BrandImpersonation {
                    brand: brand.to_string(),
                    confidence: blended.min(NON_EXACT_CONFIDENCE_CAP),
                    exact_substring: false,
                }
            }
        })
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .filter(|best| best.confidence > IMPERSONATION_REPORT_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_brand_is_not_typosquat() {
        assert_eq!(detect_typosquat("paypal"), None);
        assert_eq!(detect_typosquat("google"), None);
    }

    #[test]
    fn test_edit_distance_typosquats() {
        let m = detect_typosquat("paypa1").unwrap();
        assert_eq!(m.target, "paypal");
        assert_eq!(m.technique, TyposquatTechnique::Substitution);

        let m = detect_typosquat("gooogle").unwrap();
        assert_eq!(m.target, "google");
        assert_eq!(m.technique, TyposquatTechnique::Insertion);

        let m = detect_typosquat("amazn").unwrap();
        assert_eq!(m.target, "amazon");
        assert_eq!(m.technique, TyposquatTechnique::Deletion);
    }

    #[test]
    fn test_character_substitution() {
        // Two substitutions put edit similarity below the threshold
        let m = detect_typosquat("rnicr0soft").unwrap();
        assert_eq!(m.target, "microsoft");
    }

    #[test]
    fn test_concatenation() {
        let m = detect_typosquat("paypal-secure-login").unwrap();
        assert_eq!(m.target, "paypal");
        assert_eq!(m.technique, TyposquatTechnique::Concatenation);
    }

    #[test]
    fn test_brand_tokens() {
        assert!(contains_brand_token("secure-paypal", "paypal"));
        assert!(contains_brand_token("paypallogin", "paypal"));
        assert!(contains_brand_token("mysecurepaypal", "paypal"));
        assert!(!contains_brand_token("purchase", "chase"));
        assert!(!contains_brand_token("pineapple", "apple"));
        assert!(contains_brand_token("dhl.delivery-status", "dhl"));
        assert!(!contains_brand_token("adhlabs", "dhl"));
    }

    #[test]
    fn test_unrelated_label() {
        assert_eq!(detect_typosquat("purchase"), None);
        assert_eq!(detect_typosquat("rust-lang"), None);
        assert_eq!(detect_typosquat("wikipedia"), None);
    }

    #[test]
    fn test_brand_impersonation_exact_substring() {
        let b = detect_brand_impersonation("paypal.account-verify.com", "account-verify").unwrap();
        assert_eq!(b.brand, "paypal");
        assert_eq!(b.confidence, 0.95);
        assert!(b.exact_substring);
    }

    #[test]
    fn test_brand_impersonation_homograph_capped() {
        let b = detect_brand_impersonation("p\u{0430}ypal.com", "p\u{0430}ypal").unwrap();
        assert_eq!(b.brand, "paypal");
        assert_eq!(b.confidence, 0.85);
        assert!(!b.exact_substring);
    }

    #[test]
    fn test_brand_impersonation_exempts_exact_brand() {
        assert_eq!(detect_brand_impersonation("paypal.com", "paypal"), None);
        assert_eq!(detect_brand_impersonation("www.apple.com", "apple"), None);
    }

    #[test]
    fn test_brand_impersonation_unrelated() {
        assert_eq!(detect_brand_impersonation("example.org", "example"), None);
    }
}
