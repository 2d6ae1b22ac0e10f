//! WHOIS free-text parsing.
//!
//! Registries answer port-43 queries with loosely structured `Key: Value`
//! text. The parser scans line by line, matches keys against known aliases,
//! and tolerates everything it does not recognise. Some registries (notably
//! .uk) put the value of a key on the following indented lines; those blocks
//! are handled too.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::types::WhoisRecord;

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "registered on",
    "registered",
    "registration time",
    "registration date",
    "domain registration date",
    "domain record activated",
    "domain create date",
    "record created",
    "commencement date",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires on",
    "expires",
    "expire date",
    "paid-till",
    "renewal date",
    "domain expiration date",
    "record expires on",
    "expiration time",
];

const UPDATED_KEYS: &[&str] = &[
    "updated date",
    "last updated",
    "last updated on",
    "last modified",
    "last update",
    "changed",
    "modified",
];

const REGISTRAR_KEYS: &[&str] = &["registrar", "registrar name", "sponsoring registrar"];
const REGISTRAR_SERVER_KEYS: &[&str] = &["registrar whois server", "whois server"];
const NAMESERVER_KEYS: &[&str] = &["name server", "name servers", "nameserver", "nameservers", "nserver"];
const STATUS_KEYS: &[&str] = &["domain status", "status", "state", "registration status"];

/// Substrings that indicate a privacy or proxy registration service.
const PRIVACY_INDICATORS: &[&str] = &[
    "redacted for privacy",
    "whoisguard",
    "domains by proxy",
    "contact privacy",
    "withheld for privacy",
    "privacy protect",
    "privacyprotect",
    "perfect privacy",
    "private registration",
    "whois privacy",
    "data protected",
    "gdpr masked",
    "identity protection",
    "privacy service",
    "proxy protection",
    "redacted",
];

const NOT_FOUND_INDICATORS: &[&str] = &[
    "no match for",
    "domain not found",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
    "no matching record",
    "nothing found",
    "object does not exist",
    "is available for registration",
];

const AVAILABILITY_STATUSES: &[&str] = &["free", "available"];

const RATE_LIMIT_INDICATORS: &[&str] = &[
    "rate limit",
    "limit exceeded",
    "too many requests",
    "quota exceeded",
    "exceeded the maximum",
    "query limit",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Creation,
    Expiration,
    Updated,
    Registrar,
    RegistrarServer,
    Nameservers,
    Status,
    RegistrantCountry,
    RegistrantOrg,
    AdminCountry,
    AdminOrg,
    TechCountry,
    TechOrg,
}

impl Field {
    fn from_key(key: &str) -> Option<Field> {
        let key = key.trim().to_lowercase();
        let key = key.as_str();
        let field = if CREATION_KEYS.contains(&key) {
            Field::Creation
        } else if EXPIRATION_KEYS.contains(&key) {
            Field::Expiration
        } else if UPDATED_KEYS.contains(&key) {
            Field::Updated
        } else if REGISTRAR_KEYS.contains(&key) {
            Field::Registrar
        } else if REGISTRAR_SERVER_KEYS.contains(&key) {
            Field::RegistrarServer
        } else if NAMESERVER_KEYS.contains(&key) {
            Field::Nameservers
        } else if STATUS_KEYS.contains(&key) {
            Field::Status
        } else {
            match key {
                "registrant country" | "registrant country/economy" => Field::RegistrantCountry,
                "registrant organization" | "registrant organisation" | "registrant" => {
                    Field::RegistrantOrg
                }
                "admin country" | "administrative contact country" => Field::AdminCountry,
                "admin organization" | "admin organisation" => Field::AdminOrg,
                "tech country" | "technical contact country" => Field::TechCountry,
                "tech organization" | "tech organisation" => Field::TechOrg,
                _ => return None,
            }
        };
        Some(field)
    }

    /// Fields whose value may span several indented lines.
    fn is_multi_valued(self) -> bool {
        matches!(self, Field::Nameservers | Field::Status)
    }
}

/// Parses a raw WHOIS response into a [`WhoisRecord`].
///
/// The first occurrence of a single-valued field wins, so when a registry
/// response is followed by a registrar response the registry's dates are kept.
pub fn parse_whois_text(raw: &str) -> WhoisRecord {
    let mut record = WhoisRecord::default();
    // Field whose value continues on the following indented lines
    let mut block: Option<Field> = None;

    for line in raw.lines() {
        let indented = line.starts_with(char::is_whitespace);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            block = None;
            continue;
        }
        // Legal boilerplate follows this marker in gTLD responses
        if trimmed.starts_with(">>>") {
            block = None;
            continue;
        }
        if trimmed.starts_with('%') || trimmed.starts_with('#') {
            continue;
        }

        if let Some(field) = block {
            if indented && !looks_like_key_value(trimmed) {
                apply(&mut record, field, trimmed);
                if !field.is_multi_valued() {
                    block = None;
                }
                continue;
            }
            block = None;
        }

        let Some((key, value)) = split_key_value(trimmed) else {
            continue;
        };
        let Some(field) = Field::from_key(key) else {
            continue;
        };
        if value.is_empty() {
            block = Some(field);
        } else {
            apply(&mut record, field, value);
        }
    }

    record.privacy_protected = detect_privacy(raw);
    record
}

/// Splits `Key: Value` or `[Key] Value` (JPRS style).
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line.strip_prefix('[') {
        let (key, value) = rest.split_once(']')?;
        return Some((key, value.trim()));
    }
    let (key, value) = line.split_once(':')?;
    // URLs and times are values, not keys
    if key.is_empty() || key.contains("//") {
        return None;
    }
    Some((key, value.trim()))
}

fn looks_like_key_value(line: &str) -> bool {
    split_key_value(line)
        .and_then(|(key, _)| Field::from_key(key))
        .is_some()
}

fn apply(record: &mut WhoisRecord, field: Field, value: &str) {
    let set_once = |slot: &mut Option<String>, value: &str| {
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.to_string());
        }
    };
    match field {
        Field::Creation => {
            if record.creation_date.is_none() {
                record.creation_date = parse_date_string(value);
            }
        }
        Field::Expiration => {
            if record.expiration_date.is_none() {
                record.expiration_date = parse_date_string(value);
            }
        }
        Field::Updated => {
            if record.updated_date.is_none() {
                record.updated_date = parse_date_string(value);
            }
        }
        Field::Registrar => set_once(&mut record.registrar, clean_registrar(value)),
        Field::RegistrarServer => {
            let server = value
                .trim_start_matches("whois://")
                .trim_end_matches('/')
                .to_lowercase();
            set_once(&mut record.registrar_whois_server, &server)
        }
        Field::Nameservers => {
            let Some(ns) = value.split_whitespace().next() else {
                return;
            };
            let ns = ns.trim_end_matches('.').to_lowercase();
            if !ns.is_empty() && !record.nameservers.contains(&ns) {
                record.nameservers.push(ns);
            }
        }
        Field::Status => {
            let Some(status) = value.split_whitespace().next() else {
                return;
            };
            let status = status.trim_end_matches(',').to_string();
            if !status.is_empty() && !record.status.contains(&status) {
                record.status.push(status);
            }
        }
        Field::RegistrantCountry => set_once(&mut record.registrant_country, value),
        Field::RegistrantOrg => set_once(&mut record.registrant_org, value),
        Field::AdminCountry => set_once(&mut record.admin_country, value),
        Field::AdminOrg => set_once(&mut record.admin_org, value),
        Field::TechCountry => set_once(&mut record.tech_country, value),
        Field::TechOrg => set_once(&mut record.tech_org, value),
    }
}

/// Drops a trailing registry tag such as `[Tag = AMAZON]`.
fn clean_registrar(value: &str) -> &str {
    value
        .split_once(" [")
        .map(|(name, _)| name)
        .unwrap_or(value)
        .trim()
}

fn detect_privacy(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    PRIVACY_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Whether the response says the domain is not registered.
pub fn is_not_found_response(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    NOT_FOUND_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Whether a status value is a registry's way of saying "unregistered"
/// (`Status: free` at DENIC, `Status: AVAILABLE` at EURid).
pub fn is_availability_status(status: &str) -> bool {
    status
        .split_whitespace()
        .next()
        .is_some_and(|word| AVAILABILITY_STATUSES.iter().any(|a| word.eq_ignore_ascii_case(a)))
}

/// Whether the server refused the query because of rate limiting.
pub fn is_rate_limited_response(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    RATE_LIMIT_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Attempts to parse a date string in various formats
pub(crate) fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_with_formats(date_str) {
        return Some(dt);
    }

    // Trailing timezone names and comments: "2001-01-01 00:00:00 (UTC+8)", "20010101 #..."
    let stripped = date_str
        .split(['(', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches(" UTC")
        .trim_end_matches(" GMT")
        .trim();
    if stripped != date_str {
        if let Some(dt) = parse_with_formats(stripped) {
            return Some(dt);
        }
    }

    // Last resort: the date part of "2001-01-01 00:00:00 CLST"
    let first = date_str.split_whitespace().next()?;
    if first != date_str {
        return parse_with_formats(first.trim_end_matches('T'));
    }
    None
}

fn parse_with_formats(date_str: &str) -> Option<DateTime<Utc>> {
    const OFFSET_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%z",
    ];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%Y.%m.%d",
        "%d.%m.%Y",
        "%d %b %Y",
        "%b %d %Y",
        "%d-%m-%Y",
        "%Y%m%d",
    ];

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(date_str, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive_dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(naive_date) = NaiveDate::parse_from_str(date_str, format) {
            return Some(naive_date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}
