//! Lexical URL pattern analysis.
//!
//! A pure, I/O-free pass over the URL string that flags homograph characters,
//! typosquats of well-known brands, suspicious TLDs, phishing-style paths and
//! query parameters, and obfuscation tricks. The result feeds the AI prompt
//! and the informational `technical_indicators` risk factor.

mod homograph;
mod tables;
mod typosquat;

use std::net::IpAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::ParsedUrl;

pub use homograph::HomographMatch;
pub use typosquat::{BrandImpersonation, TyposquatMatch, TyposquatTechnique};

use tables::{EXCESSIVE_PERCENT_ENCODING, EXCESSIVE_URL_LENGTH, SUSPICIOUS_TLDS, URL_SHORTENERS};
use typosquat::IMPERSONATION_REPORT_THRESHOLD;

const HOMOGRAPH_POINTS: u32 = 40;
const TYPOSQUAT_POINTS: u32 = 35;
const SUSPICIOUS_TLD_POINTS: u32 = 20;
const PHISHING_POINTS: u32 = 25;
const OBFUSCATION_POINTS: u32 = 15;
const BRAND_IMPERSONATION_POINTS: u32 = 30;
/// Impersonation confidence that counts toward the suspicious score
const HIGH_CONFIDENCE_IMPERSONATION: f64 = 0.8;

/// Tag set on a result produced after an internal failure.
pub const ANALYSIS_FAILED: &str = "analysis_failed";

static PHISHING_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(login|log-in|signin|sign-in|logon|verify|verification|account|update|secure|suspend|confirm|banking|webscr|unlock|validate|billing|password|wallet|recover)[^/?#]*\.(php|html?|aspx?|jsp|cgi|exe)\b",
    )
    .unwrap()
});

static PHISHING_KEYWORD_COMBO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(suspend|locked|verify|confirm|unusual|restore|reactivate)[^?#]{0,40}?(account|identity|payment|activity|access|card)",
    )
    .unwrap()
});

static REDIRECT_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^|&)(redirect|redirect_uri|redirect_url|return|returnurl|return_url|next|url|goto|continue|dest|destination|target|rurl)=(https?(:|%3a)|//|%2f%2f)",
    )
    .unwrap()
});

static OPAQUE_TOKEN_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|&)[^=&]+=[A-Za-z0-9_\-+/%=.]{64,}").unwrap());

static PERCENT_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").unwrap());

/// Result of the lexical analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlPatternAnalysis {
    pub has_homograph: bool,
    pub homograph_chars: Vec<HomographMatch>,
    pub is_typosquat: bool,
    pub typosquat: Option<TyposquatMatch>,
    pub has_suspicious_tld: bool,
    pub suspicious_tld: Option<String>,
    pub has_phishing_patterns: bool,
    pub phishing_patterns: Vec<String>,
    pub has_obfuscation: bool,
    pub obfuscation_techniques: Vec<String>,
    pub brand_impersonation: Option<BrandImpersonation>,
    /// Weighted sum of the flags above, 0-100
    pub suspicious_score: u32,
    /// `Some("analysis_failed")` when the analysis itself failed
    pub error: Option<String>,
}

impl UrlPatternAnalysis {
    /// All-false result tagged as failed.
    pub fn failed() -> Self {
        Self {
            error: Some(ANALYSIS_FAILED.to_string()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Short human-readable findings, used in prompts and descriptions.
    pub fn indicators(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.has_homograph {
            let chars: String = self
                .homograph_chars
                .iter()
                .map(|m| format!("'{}'~'{}'", m.character, m.looks_like))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(format!("homograph characters ({chars})"));
        }
        if let Some(t) = &self.typosquat {
            out.push(format!("possible typosquat of {}", t.target));
        }
        if let Some(tld) = &self.suspicious_tld {
            out.push(format!("suspicious TLD .{tld}"));
        }
        out.extend(self.phishing_patterns.iter().map(|p| format!("phishing pattern: {p}")));
        out.extend(
            self.obfuscation_techniques
                .iter()
                .map(|o| format!("obfuscation: {o}")),
        );
        if let Some(b) = &self.brand_impersonation {
            out.push(format!(
                "brand impersonation of {} ({:.0}% confidence)",
                b.brand,
                b.confidence * 100.0
            ));
        }
        out
    }
}

/// Analyzes a parsed URL, using its Unicode hostname so homographs are visible.
pub fn analyze_parsed(url: &ParsedUrl) -> UrlPatternAnalysis {
    analyze(&url.normalized, &url.display_hostname, &url.path)
}

/// Analyzes `url`, whose host is `domain` and path is `pathname`.
///
/// Never panics outward: an internal failure yields [`UrlPatternAnalysis::failed`].
pub fn analyze(url: &str, domain: &str, pathname: &str) -> UrlPatternAnalysis {
    match catch_unwind(AssertUnwindSafe(|| analyze_inner(url, domain, pathname))) {
        Ok(analysis) => analysis,
        Err(_) => {
            log::warn!("Pattern analysis failed for {url}");
            UrlPatternAnalysis::failed()
        }
    }
}

fn analyze_inner(url: &str, domain: &str, pathname: &str) -> UrlPatternAnalysis {
    let host = domain
        .trim()
        .trim_end_matches('.')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    let is_ip = host.parse::<IpAddr>().is_ok();
    let label = if is_ip {
        String::new()
    } else {
        second_level_label(&host)
    };

    let mut analysis = UrlPatternAnalysis::default();

    analysis.homograph_chars = homograph::find_homographs(&host);
    analysis.has_homograph = !analysis.homograph_chars.is_empty();

    analysis.typosquat = typosquat::detect_typosquat(&label);
    analysis.is_typosquat = analysis.typosquat.is_some();

    if !is_ip {
        check_suspicious_tld(&host, &mut analysis);
    }
    check_phishing_patterns(url, pathname, &mut analysis);
    check_obfuscation(url, &host, is_ip, &mut analysis);

    analysis.brand_impersonation = typosquat::detect_brand_impersonation(&host, &label)
        .filter(|b| b.confidence > IMPERSONATION_REPORT_THRESHOLD);

    analysis.suspicious_score = suspicious_score(&analysis);
    analysis
}

/// The label just left of the public suffix (`paypal` in `login.paypal.co.uk`).
fn second_level_label(host: &str) -> String {
    let suffix = psl::suffix_str(host)
        .map(str::to_string)
        .unwrap_or_else(|| host.rsplit('.').next().unwrap_or_default().to_string());
    host.strip_suffix(&suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .and_then(|rest| rest.rsplit('.').next())
        .unwrap_or(host)
        .to_string()
}

fn check_suspicious_tld(host: &str, analysis: &mut UrlPatternAnalysis) {
    let Some(tld) = host.rsplit('.').next() else {
        return;
    };
    if SUSPICIOUS_TLDS.contains(&tld) {
        analysis.has_suspicious_tld = true;
        analysis.suspicious_tld = Some(tld.to_string());
    }
}

fn check_phishing_patterns(url: &str, pathname: &str, analysis: &mut UrlPatternAnalysis) {
    if PHISHING_PATH.is_match(pathname) {
        analysis
            .phishing_patterns
            .push("credential keyword with script extension in path".to_string());
    }
    if PHISHING_KEYWORD_COMBO.is_match(pathname) {
        analysis
            .phishing_patterns
            .push("account-alarm keywords in path".to_string());
    }

    let query = url
        .split_once('?')
        .map(|(_, q)| q.split('#').next().unwrap_or_default())
        .unwrap_or_default();
    if REDIRECT_PARAM.is_match(query) {
        analysis
            .phishing_patterns
            .push("open redirect parameter".to_string());
    }
    if OPAQUE_TOKEN_PARAM.is_match(query) {
        analysis
            .phishing_patterns
            .push("long opaque token parameter".to_string());
    }
    analysis.has_phishing_patterns = !analysis.phishing_patterns.is_empty();
}

fn check_obfuscation(url: &str, host: &str, is_ip: bool, analysis: &mut UrlPatternAnalysis) {
    let techniques = &mut analysis.obfuscation_techniques;

    let escapes = PERCENT_ESCAPE.find_iter(url).count();
    if escapes > EXCESSIVE_PERCENT_ENCODING {
        techniques.push(format!("excessive percent-encoding ({escapes} escapes)"));
    }
    if is_ip {
        techniques.push("IP address host".to_string());
    } else if host.chars().all(|c| c.is_ascii_digit()) || host.starts_with("0x") {
        techniques.push("numeric host encoding".to_string());
    }
    if url.len() > EXCESSIVE_URL_LENGTH {
        techniques.push(format!("excessive URL length ({} chars)", url.len()));
    }
    if URL_SHORTENERS.contains(&host) {
        techniques.push(format!("URL shortener ({host})"));
    }
    let authority = url
        .split_once("://")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or_default())
        .unwrap_or_default();
    if authority.contains('@') {
        techniques.push("credentials in URL authority".to_string());
    }

    analysis.has_obfuscation = !techniques.is_empty();
}

fn suspicious_score(analysis: &UrlPatternAnalysis) -> u32 {
    let high_confidence_brand = analysis
        .brand_impersonation
        .as_ref()
        .is_some_and(|b| b.confidence >= HIGH_CONFIDENCE_IMPERSONATION);
    let score = [
        (analysis.has_homograph, HOMOGRAPH_POINTS),
        (analysis.is_typosquat, TYPOSQUAT_POINTS),
        (analysis.has_suspicious_tld, SUSPICIOUS_TLD_POINTS),
        (analysis.has_phishing_patterns, PHISHING_POINTS),
        (analysis.has_obfuscation, OBFUSCATION_POINTS),
        (high_confidence_brand, BRAND_IMPERSONATION_POINTS),
    ]
    .iter()
    .filter(|(flag, _)| *flag)
    .map(|(_, points)| points)
    .sum::<u32>();
    score.min(100)
}
