//! Field status reporting.
//!
//! `#[derive(Config)]` emits calls into this module for fields or sections
//! tagged `status = experimental | deprecated | not_implemented` whenever
//! the user moved them off their default.

use super::FieldPath;
use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Experimental,
    NotImplemented,
    Deprecated,
}

/// Report a field whose status is not stable.
pub fn check_field_status(field_path: &str, status: FieldStatus, diag: &mut ConfigDiagnostics) {
    report(leak(field_path.to_string()), status, "field", diag);
}

/// Report a section whose status is not stable.
pub fn check_section_status(section: &str, status: FieldStatus, diag: &mut ConfigDiagnostics) {
    report(leak(format!("[{section}]")), status, "section", diag);
}

fn report(path: FieldPath, status: FieldStatus, what: &str, diag: &mut ConfigDiagnostics) {
    match status {
        FieldStatus::Experimental if diag.allow_experimental => {}
        FieldStatus::Experimental => diag.experimental_hint(path),
        FieldStatus::Deprecated => diag.warn(
            path,
            format!("this {what} is deprecated and will be removed in a future version"),
        ),
        FieldStatus::NotImplemented => diag.error_with_hint(
            path,
            format!("this {what} is not implemented yet"),
            format!("remove this {what}"),
        ),
    }
}

// Field paths are `'static`; status paths are few.
fn leak(path: String) -> FieldPath {
    FieldPath::new(Box::leak(path.into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experimental_is_a_hint_not_an_error() {
        let mut diag = ConfigDiagnostics::new();
        check_section_status("security.csp", FieldStatus::Experimental, &mut diag);
        assert!(diag.is_empty());
        assert_eq!(diag.hints().len(), 1);
        assert_eq!(diag.hints()[0].as_str(), "[security.csp]");
    }

    #[test]
    fn test_allow_experimental_silences_hint() {
        let mut diag = ConfigDiagnostics::new();
        diag.allow_experimental = true;
        check_field_status("i18n.domains", FieldStatus::Experimental, &mut diag);
        assert!(diag.hints().is_empty());
    }

    #[test]
    fn test_not_implemented_is_an_error() {
        let mut diag = ConfigDiagnostics::new();
        check_field_status("build.x", FieldStatus::NotImplemented, &mut diag);
        assert!(diag.has_errors());
    }
}
