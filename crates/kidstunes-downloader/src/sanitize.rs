// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path-component sanitization for library names.

/// Characters that never appear in a library path component.
pub const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '+'];

/// Make `name` safe to use as one path component.
///
/// Each forbidden character becomes `_` and surrounding whitespace is trimmed.
/// Everything else, including inner spaces, is kept. A name made only of dots
/// would address the current or parent directory, so its dots become `_` too.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c == '.') {
        return "_".repeat(trimmed.chars().count());
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_plus_and_keeps_spaces() {
        assert_eq!(sanitize_name("for KING + COUNTRY"), "for KING _ COUNTRY");
    }

    #[test]
    fn replaces_every_forbidden_character() {
        assert_eq!(sanitize_name(r#"a<b>c:d"e/f\g|h?i*j+k"#), "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize_name("  Blank Space \t"), "Blank Space");
    }

    #[test]
    fn dot_only_names_cannot_climb() {
        assert_eq!(sanitize_name(".."), "__");
        assert_eq!(sanitize_name(" . "), "_");
        assert_eq!(sanitize_name("...And Justice"), "...And Justice");
    }

    #[test]
    fn unicode_is_preserved() {
        assert_eq!(sanitize_name("Beyoncé: Déjà Vu"), "Beyoncé_ Déjà Vu");
    }

    proptest! {
        #[test]
        fn output_has_no_forbidden_chars(name in ".*") {
            let out = sanitize_name(&name);
            prop_assert!(!out.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(out != "." && out != "..");
        }

        #[test]
        fn sanitizing_is_idempotent(name in ".*") {
            let once = sanitize_name(&name);
            prop_assert_eq!(sanitize_name(&once), once.clone());
        }

        #[test]
        fn safe_names_are_unchanged(name in "[A-Za-z0-9][A-Za-z0-9 ]{0,20}[A-Za-z0-9]") {
            prop_assert_eq!(sanitize_name(&name), name);
        }
    }
}
