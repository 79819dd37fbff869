/// Canonical header form: no BOM/zero-width marks, single spaces, lowercase.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize_header;

    #[test]
    fn strips_marks_and_collapses_whitespace() {
        assert_eq!(normalize_header("\u{feff}Created   At "), "created at");
        assert_eq!(normalize_header("ACTUAL\tCOST"), "actual cost");
    }
}
