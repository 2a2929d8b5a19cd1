#![forbid(unsafe_code)]

//! Text transforms applied to rendered page markup.
//!
//! Both functions are pure string rewrites; the host decides which nodes
//! they run on.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Shortest link text that gets line-break suggestions.
pub const MIN_BREAKABLE_LEN: usize = 10;

/// Highlight classes whose code blocks are re-indented with tabs.
pub const TAB_INDENTED_LANGUAGES: [&str; 2] = ["highlight-gdscript", "highlight-cpp"];

static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z0-9])").expect("case boundary regex"));

static LEADING_INDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^(<span class="w">)?( {4})"#).expect("indent regex"));

static TAB_THEN_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t {4}").expect("tab run regex"));

/// Insert `<wbr>` at camel-case and letter/digit boundaries.
///
/// Text containing a space, or shorter than [`MIN_BREAKABLE_LEN`]
/// characters, is left alone. A boundary whose second character ends the
/// text never gets a break.
#[must_use]
pub fn suggest_line_breaks(text: &str) -> Option<String> {
    if text.contains(' ') || text.chars().count() < MIN_BREAKABLE_LEN {
        return None;
    }

    let mut inserted = 0usize;
    let out = CASE_BOUNDARY.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        if whole.end == text.len() {
            return caps[0].to_owned();
        }
        inserted += 1;
        format!("{}<wbr>{}", &caps[1], &caps[2])
    });

    (inserted > 0).then(|| out.into_owned())
}

/// Whether a code block with these classes should be re-indented.
#[must_use]
pub fn wants_tab_indent<S: AsRef<str>>(classes: &[S]) -> bool {
    classes
        .iter()
        .any(|c| TAB_INDENTED_LANGUAGES.contains(&c.as_ref()))
}

/// Turn leading runs of four spaces into tabs.
///
/// The first run on each line may sit just inside a whitespace span
/// (`<span class="w">`); the span opener is kept.
#[must_use]
pub fn indent_with_tabs(html: &str) -> String {
    let mut out = LEADING_INDENT.replace_all(html, "${1}\t").into_owned();
    while TAB_THEN_SPACES.is_match(&out) {
        out = TAB_THEN_SPACES.replace_all(&out, "\t\t").into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn breaks_camel_case_class_names() {
        assert_eq!(
            suggest_line_breaks("AnimationNodeStateMachine").as_deref(),
            Some("Animation<wbr>Node<wbr>State<wbr>Machine")
        );
    }

    #[test]
    fn digits_count_as_boundaries() {
        assert_eq!(
            suggest_line_breaks("CollisionShape3D").as_deref(),
            Some("Collision<wbr>Shape<wbr>3D")
        );
    }

    #[test]
    fn never_breaks_before_last_char() {
        assert_eq!(suggest_line_breaks("MultiplayerX"), None);
        assert_eq!(
            suggest_line_breaks("VisualShaderNodeA").as_deref(),
            Some("Visual<wbr>Shader<wbr>NodeA")
        );
    }

    #[test]
    fn short_or_spaced_text_is_skipped() {
        assert_eq!(suggest_line_breaks("NodePath"), None);
        assert_eq!(suggest_line_breaks("Getting StartedNow"), None);
        assert_eq!(suggest_line_breaks("lowercaseonly"), None);
    }

    #[test]
    fn leading_spaces_become_tabs() {
        let html = "func _ready():\n        print(1)\n    pass\n";
        assert_eq!(
            indent_with_tabs(html),
            "func _ready():\n\t\tprint(1)\n\tpass\n"
        );
    }

    #[test]
    fn whitespace_span_opener_is_kept() {
        let html = "<span class=\"w\">        </span><span class=\"k\">pass</span>";
        assert_eq!(
            indent_with_tabs(html),
            "<span class=\"w\">\t\t</span><span class=\"k\">pass</span>"
        );
    }

    #[test]
    fn inner_spaces_are_untouched() {
        assert_eq!(indent_with_tabs("a    b\n  c"), "a    b\n  c");
    }

    #[test]
    fn tab_indent_languages() {
        assert!(wants_tab_indent(&["highlight-gdscript", "notranslate"]));
        assert!(wants_tab_indent(&["highlight-cpp".to_owned()]));
        assert!(!wants_tab_indent(&["highlight-python"]));
    }
}
