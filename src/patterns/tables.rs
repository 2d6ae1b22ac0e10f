//! Static lookup tables for lexical URL analysis.

/// High-value brands commonly impersonated, by second-level label.
pub(crate) const BRANDS: &[&str] = &[
    "paypal",
    "apple",
    "google",
    "microsoft",
    "amazon",
    "facebook",
    "instagram",
    "netflix",
    "twitter",
    "linkedin",
    "ebay",
    "chase",
    "wellsfargo",
    "bankofamerica",
    "citibank",
    "dropbox",
    "adobe",
    "yahoo",
    "outlook",
    "office365",
    "icloud",
    "coinbase",
    "binance",
    "steam",
    "spotify",
    "whatsapp",
    "dhl",
    "fedex",
    "usps",
    "github",
];

/// Non-Latin code points that render like a Latin letter.
pub(crate) const HOMOGRAPHS: &[(char, char)] = &[
    // Cyrillic
    ('\u{0430}', 'a'),
    ('\u{0435}', 'e'),
    ('\u{043e}', 'o'),
    ('\u{0440}', 'p'),
    ('\u{0441}', 'c'),
    ('\u{0443}', 'y'),
    ('\u{0445}', 'x'),
    ('\u{0456}', 'i'),
    ('\u{0458}', 'j'),
    ('\u{0455}', 's'),
    ('\u{0501}', 'd'),
    ('\u{04bb}', 'h'),
    ('\u{04cf}', 'l'),
    ('\u{051b}', 'q'),
    ('\u{051d}', 'w'),
    ('\u{0432}', 'b'),
    ('\u{043a}', 'k'),
    ('\u{043c}', 'm'),
    ('\u{043d}', 'h'),
    ('\u{0442}', 't'),
    // Greek
    ('\u{03bf}', 'o'),
    ('\u{03b1}', 'a'),
    ('\u{03c1}', 'p'),
    ('\u{03bd}', 'v'),
    ('\u{03c4}', 't'),
    ('\u{03b9}', 'i'),
    ('\u{03ba}', 'k'),
    ('\u{03c7}', 'x'),
    ('\u{03c5}', 'u'),
    ('\u{03b5}', 'e'),
    // Latin extended look-alikes
    ('\u{0131}', 'i'),
    ('\u{0261}', 'g'),
    ('\u{0251}', 'a'),
    ('\u{1d0f}', 'o'),
    ('\u{0269}', 'i'),
];

/// ASCII substitutions used by typosquatters (digit or digraph for a letter).
pub(crate) const CHAR_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("0", "o"),
    ("1", "l"),
    ("1", "i"),
    ("3", "e"),
    ("4", "a"),
    ("5", "s"),
    ("7", "t"),
    ("8", "b"),
    ("rn", "m"),
    ("vv", "w"),
    ("cl", "d"),
];

/// TLDs with a high share of abusive registrations.
pub(crate) const SUSPICIOUS_TLDS: &[&str] = &[
    "tk", "ml", "ga", "cf", "gq", "xyz", "top", "club", "click", "link", "work", "loan", "win",
    "bid", "racing", "review", "country", "stream", "download", "kim", "men", "date", "party",
    "science", "trade", "accountant", "zip", "mov", "cam", "rest", "icu", "buzz", "su", "monster",
];

/// Link-shortener hosts that hide the real destination.
pub(crate) const URL_SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "rebrand.ly",
    "cutt.ly",
    "shorturl.at",
    "tiny.cc",
    "rb.gy",
    "s.id",
];

/// URLs longer than this are treated as obfuscated.
pub(crate) const EXCESSIVE_URL_LENGTH: usize = 200;

/// More percent-escapes than this are treated as obfuscated.
pub(crate) const EXCESSIVE_PERCENT_ENCODING: usize = 10;
