//! Deterministic SKU synthesis.
//!
//! A SKU is the product root followed by one token per option value, in
//! attribute priority order: `TEE-M-NAVYBLUE`. Value tokens are purely
//! alphanumeric and the separator never is, so within one product the SKU
//! decodes back to a single option tuple.

use std::collections::HashSet;

use crate::attribute::{fold_ascii, Attribute};
use crate::config::VariantConfig;

/// Uppercase ASCII token for a value, with word breaks and punctuation dropped.
///
/// `max_len` of 0 disables truncation.
pub fn sku_token(value: &str, max_len: usize) -> String {
    let folded = fold_ascii(value);
    let token = folded
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase());
    if max_len > 0 {
        token.take(max_len).collect()
    } else {
        token.collect()
    }
}

/// Uppercase root with non-alphanumeric runs collapsed to `separator`.
fn root_segment(raw: &str, separator: &str) -> String {
    let mut root = String::with_capacity(raw.len());
    for c in fold_ascii(raw).chars() {
        if c.is_ascii_alphanumeric() {
            root.push(c.to_ascii_uppercase());
        } else if !root.is_empty() && !root.ends_with(separator) {
            root.push_str(separator);
        }
    }
    while root.ends_with(separator) {
        root.truncate(root.len() - separator.len());
    }
    root
}

/// Normalized product root, falling back to the configured root when blank.
pub fn sku_root(raw: Option<&str>, config: &VariantConfig) -> String {
    let root = raw
        .map(|r| root_segment(r, &config.sku_separator))
        .unwrap_or_default();
    if root.is_empty() {
        root_segment(&config.fallback_sku_root, &config.sku_separator)
    } else {
        root
    }
}

/// Tokens for every declared value of `attribute`, index-aligned with `values`.
///
/// Computed over all declared values rather than the selected ones, so a
/// value's token does not depend on what else is selected. Blank tokens
/// become `V<position>`; clashes get a numeric suffix.
pub fn attribute_tokens(attribute: &Attribute, config: &VariantConfig) -> Vec<String> {
    let mut used = HashSet::new();
    attribute
        .values
        .iter()
        .enumerate()
        .map(|(pos, value)| {
            let mut base = sku_token(&value.value, config.max_sku_token_len);
            if base.is_empty() {
                base = format!("V{}", pos + 1);
            }
            let mut token = base.clone();
            let mut suffix = 2;
            while !used.insert(token.clone()) {
                token = format!("{}{}", base, suffix);
                suffix += 1;
            }
            token
        })
        .collect()
}

/// Join root and value tokens.
pub fn compose_sku<'a>(root: &str, tokens: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
    let mut sku = root.to_string();
    for token in tokens {
        sku.push_str(separator);
        sku.push_str(token);
    }
    sku
}

/// Case-insensitive SKU comparison key.
pub(crate) fn sku_key(sku: &str) -> String {
    sku.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_normalization() {
        assert_eq!(sku_token("Navy Blue", 0), "NAVYBLUE");
        assert_eq!(sku_token("  Café / Crème ", 0), "CAFECREME");
        assert_eq!(sku_token("x-large!!", 0), "XLARGE");
        assert_eq!(sku_token("???", 0), "");
    }

    #[test]
    fn test_token_truncation() {
        assert_eq!(sku_token("Extra Large", 5), "EXTRA");
        assert_eq!(sku_token("Extra Large", 8), "EXTRALAR");
    }

    #[test]
    fn test_tokens_never_contain_separator() {
        let config = VariantConfig::default();
        let attribute = Attribute::new("Material").with_values(["Blue Cotton", "Cotton", "Cotton-Linen"]);
        let tokens = attribute_tokens(&attribute, &config);
        assert_eq!(tokens, vec!["BLUECOTTON", "COTTON", "COTTONLINEN"]);
        assert!(tokens.iter().all(|t| !t.contains(&config.sku_separator)));
    }

    #[test]
    fn test_root_fallback() {
        let config = VariantConfig::default();
        assert_eq!(sku_root(Some("tee shirt"), &config), "TEE-SHIRT");
        assert_eq!(sku_root(Some("-tee--"), &config), "TEE");
        assert_eq!(sku_root(Some("  "), &config), "SKU");
        assert_eq!(sku_root(None, &config), "SKU");
    }

    #[test]
    fn test_clashing_tokens_are_disambiguated() {
        let config = VariantConfig {
            max_sku_token_len: 3,
            ..VariantConfig::default()
        };
        let attribute = Attribute::new("Color").with_values(["Blue", "Blueberry", "???", "Blu"]);
        let tokens = attribute_tokens(&attribute, &config);
        assert_eq!(tokens, vec!["BLU", "BLU2", "V3", "BLU3"]);
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose_sku("TEE", ["M", "RED"], "-"), "TEE-M-RED");
        assert_eq!(compose_sku("TEE", Vec::<&str>::new(), "-"), "TEE");
    }
}
