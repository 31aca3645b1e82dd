//! Utility functions

/// Return the value if it contains anything but whitespace
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a distinguished name into its RDN components.
///
/// Escaped separators (`\,`) and quoted values are kept intact.
pub fn split_dn(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;

    for (i, c) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ',' | ';' if !quoted => {
                parts.push(dn[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(dn[start..].trim());

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Split one RDN into attribute name and unescaped value.
///
/// Multi-valued RDNs (`cn=a+uid=b`) yield their first pair.
pub fn rdn_name_value(rdn: &str) -> Option<(&str, String)> {
    let (name, value) = rdn.split_once('=')?;
    let value = first_rdn_value(value);
    Some((name.trim(), unescape_dn_value(value)))
}

fn first_rdn_value(value: &str) -> &str {
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '+' => return &value[..i],
            _ => {}
        }
    }
    value
}

/// Value of the leading RDN, e.g. `developers` for
/// `cn=developers,ou=groups,dc=example,dc=org`.
pub fn rdn_value(dn: &str) -> String {
    match split_dn(dn).first() {
        Some(rdn) => rdn_name_value(rdn)
            .map(|(_, value)| value)
            .unwrap_or_else(|| rdn.to_string()),
        None => String::new(),
    }
}

/// Values of every `dc=` component, in order
pub fn domain_components(dn: &str) -> Vec<String> {
    split_dn(dn)
        .into_iter()
        .filter_map(rdn_name_value)
        .filter(|(name, _)| name.eq_ignore_ascii_case("dc"))
        .map(|(_, value)| value)
        .collect()
}

/// Whether `dn` names an entry below `base_dn`
pub fn is_descendant_of(dn: &str, base_dn: &str) -> bool {
    let entry = split_dn(dn);
    let base = split_dn(base_dn);
    if base.is_empty() || entry.len() <= base.len() {
        return false;
    }
    entry[entry.len() - base.len()..]
        .iter()
        .zip(base.iter())
        .all(|(a, b)| rdn_equals(a, b))
}

fn rdn_equals(a: &str, b: &str) -> bool {
    match (rdn_name_value(a), rdn_name_value(b)) {
        (Some((na, va)), Some((nb, vb))) => {
            na.eq_ignore_ascii_case(nb) && va.trim().eq_ignore_ascii_case(vb.trim())
        }
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Resolve `\XX` hex pairs, `\c` escapes and surrounding quotes
pub fn unescape_dn_value(value: &str) -> String {
    let value = value.trim();
    let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit()
            {
                out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
                i += 3;
            } else {
                out.push(bytes[i + 1]);
                i += 2;
            }
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> u8 {
    (b as char).to_digit(16).unwrap_or(0) as u8
}
