use serde_json::Value;

/// Quality assumed when a label carries no number
pub const DEFAULT_QUALITY: u32 = 1080;

/// First run of ASCII digits in `label`, e.g. `"1080p"` → 1080, `"HD"` → 1080.
pub fn parse_quality(label: &str) -> u32 {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(DEFAULT_QUALITY)
}

/// Quality from a decrypted source entry, which may carry a string or a number.
pub fn quality_from_json(value: &Value) -> u32 {
    match value {
        Value::String(label) => parse_quality(label),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_QUALITY),
        _ => DEFAULT_QUALITY,
    }
}
