//! Tolerant scanner for architect replies.
//!
//! Model output is unconstrained, so parsing is a best-effort line scan with a
//! single rule: a trimmed line containing `": "` declares a module, split at the
//! first occurrence. Every other line is skipped without error.

use crate::core::types::ModuleSpec;

const SEPARATOR: &str = ": ";

/// Extract module declarations from `response`, preserving their order.
pub fn parse_modules(response: &str) -> Vec<ModuleSpec> {
    response.lines().filter_map(parse_module_line).collect()
}

/// Parse one line, returning `None` when it is not a module declaration.
pub fn parse_module_line(line: &str) -> Option<ModuleSpec> {
    let (name, description) = line.trim().split_once(SEPARATOR)?;
    Some(ModuleSpec::new(name.trim(), description.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_description_in_order() {
        let modules = parse_modules("Parser: reads input\nEvaluator: computes results\n");
        assert_eq!(
            modules,
            vec![
                ModuleSpec::new("Parser", "reads input"),
                ModuleSpec::new("Evaluator", "computes results"),
            ]
        );
    }

    #[test]
    fn skips_lines_without_separator() {
        let modules = parse_modules("foo\nbar: baz\nqux");
        assert_eq!(modules, vec![ModuleSpec::new("bar", "baz")]);
    }

    #[test]
    fn strips_surrounding_whitespace() {
        let modules = parse_modules("   Input Handler :   accepts numbers   \r\n\n\t\n");
        assert_eq!(
            modules,
            vec![ModuleSpec::new("Input Handler", "accepts numbers")]
        );
    }

    #[test]
    fn splits_on_first_separator_only() {
        let module = parse_module_line("Formatter: renders results: with units").expect("module");
        assert_eq!(module.name, "Formatter");
        assert_eq!(module.description, "renders results: with units");
    }

    #[test]
    fn colon_without_space_is_not_a_declaration() {
        assert_eq!(parse_module_line("Modules with descriptions:"), None);
        assert_eq!(parse_module_line("ratio 3:4"), None);
    }

    #[test]
    fn trailing_separator_is_dropped_by_trim() {
        // "Header: " trims to "Header:", which no longer contains the separator.
        assert_eq!(parse_module_line("Header: "), None);
    }

    #[test]
    fn empty_or_unparseable_response_yields_no_modules() {
        assert!(parse_modules("").is_empty());
        assert!(parse_modules("Sorry, I cannot help with that.\n\n").is_empty());
    }

    #[test]
    fn markdown_bullets_stay_in_the_name() {
        let modules = parse_modules("1. **Addition**: adds two numbers");
        assert_eq!(modules[0].name, "1. **Addition**");
        assert_eq!(modules[0].description, "adds two numbers");
    }
}
