//! Object key construction and file name sanitization.

use uuid::Uuid;

/// Minimum sanitized base-name length before a random suffix is added.
const MIN_BASE_LEN: usize = 3;

/// Extensions longer than this degrade to the default.
const MAX_EXT_LEN: usize = 4;

const DEFAULT_EXT: &str = "jpg";

/// Cleans a raw file name into `{base}.{ext}` safe for an object key.
///
/// The extension is lowercased; a raw extension longer than four
/// characters (or a name without one) degrades to `jpg`. The base keeps
/// only word characters, spaces, and dashes; whitespace runs become a
/// single dash, dash runs collapse, and leading/trailing dashes or
/// underscores are stripped. Bases shorter than three characters get a
/// random suffix for collision resistance.
pub fn sanitize_file_name(name: &str) -> String {
    let mut ext = DEFAULT_EXT.to_string();
    let parts: Vec<&str> = name.split('.').collect();
    let base_raw: String = if parts.len() > 1 {
        let raw_ext = parts[parts.len() - 1];
        if raw_ext.chars().count() <= MAX_EXT_LEN {
            ext = raw_ext.to_lowercase();
        }
        parts[..parts.len() - 1].concat()
    } else {
        name.to_string()
    };

    let cleaned: String = base_raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();

    // Whitespace runs -> single dash, then collapse dash runs.
    let mut base = String::with_capacity(cleaned.len());
    let mut prev_dash = false;
    for c in cleaned.trim().chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' {
            if prev_dash {
                continue;
            }
            prev_dash = true;
        } else {
            prev_dash = false;
        }
        base.push(c);
    }

    let mut base = base.trim_matches(['-', '_']).to_string();
    if base.chars().count() < MIN_BASE_LEN {
        let suffix = Uuid::new_v4().simple().to_string();
        base.push_str("pic_");
        base.push_str(&suffix[..6]);
    }

    format!("{base}.{ext}")
}

/// Builds the remote object key: `{prefix joined by '/'}/{millis}_{name}`.
///
/// The millisecond timestamp keeps same-named files from colliding
/// within a run; parallel runs finishing in the same millisecond are not
/// protected, which is why short bases also get the random suffix.
pub fn object_key(prefix: &[String], name: &str, timestamp_millis: i64) -> String {
    let clean = sanitize_file_name(name);
    let dir = if prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", prefix.join("/"))
    };
    format!("{dir}{timestamp_millis}_{clean}")
}
