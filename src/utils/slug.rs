use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derive a URL slug: lowercase, accents folded to ASCII, anything that is
/// not alphanumeric collapsed to single hyphens, leading/trailing hyphens
/// trimmed.
pub fn slugify(name: &str) -> String {
    let folded: String = name.chars().map(fold_accent).collect();
    let lowered = folded.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug with a deterministic disambiguation suffix derived from the record's
/// external id, so two records with the same name never share a slug.
pub fn slugify_with_key(name: &str, key: i64) -> String {
    let base = slugify(name);
    let suffix = short_hash(&key.to_string());
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// First 6 hex chars of the SHA-256 of the input.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())[..6].to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Wireless Mouse (Black)"), "wireless-mouse-black");
    }

    #[test]
    fn folds_accents() {
        assert_eq!(slugify("Calçados & Acessórios"), "calcados-acessorios");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
    }

    #[test]
    fn collapses_runs_and_trims() {
        assert_eq!(slugify("  --Hello,,,World!  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn key_suffix_is_deterministic_and_distinct() {
        let a = slugify_with_key("Camiseta Básica", 101);
        let b = slugify_with_key("Camiseta Básica", 202);
        assert_eq!(a, slugify_with_key("Camiseta Básica", 101));
        assert_ne!(a, b);
        assert!(a.starts_with("camiseta-basica-"));
    }

    #[test]
    fn empty_name_still_yields_a_slug() {
        assert_eq!(slugify_with_key("***", 7), short_hash("7"));
    }
}
