/*!
Conversion of keys between `camelCase` and `snake_case`.

Leading and trailing underscores are treated as decoration and preserved
verbatim in both directions, so `_privateValue` and `_private_value` map
onto each other.
*/

/// Split `key` into leading underscores, core, and trailing underscores.
fn split_decoration(key: &str) -> (&str, &str, &str) {
    let start = key.len() - key.trim_start_matches('_').len();
    if start == key.len() {
        return (key, "", "");
    }
    let end = key.trim_end_matches('_').len();
    (&key[..start], &key[start..end], &key[end..])
}

/// `myURLValue` to `my_url_value`
pub fn to_snake_case(key: &str) -> String {
    let (lead, core, trail) = split_decoration(key);
    let chars: Vec<char> = core.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    out.push_str(lead);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // Word boundary: aB, 1B, or the last capital of an acronym in ABc
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.push_str(trail);
    out
}

/// `my_url_value` to `myUrlValue`
pub fn to_camel_case(key: &str) -> String {
    let (lead, core, trail) = split_decoration(key);
    let words: Vec<&str> = core.split('_').filter(|w| !w.is_empty()).collect();
    if words.len() < 2 {
        return key.into();
    }
    let mut out = String::with_capacity(key.len());
    out.push_str(lead);
    out.push_str(&words[0].to_lowercase());
    for word in &words[1..] {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str(trail);
    out
}
