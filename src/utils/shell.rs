//! Shell-style quoting for displaying command lines.
//!
//! Commands are always executed directly (program + argv); quoting is only
//! used when echoing or planning them.

/// Quote a single argument so the echoed command can be pasted into a shell.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Render `program` and `args` as one shell-quoted command line.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_simple() {
        assert_eq!(quote_arg("-tzip"), "-tzip");
        assert_eq!(quote_arg("-mm=LZMA"), "-mm=LZMA");
    }

    #[test]
    fn quote_arg_with_glob_chars() {
        assert_eq!(quote_arg("-ir!/srv/pkg/*"), "'-ir!/srv/pkg/*'");
    }

    #[test]
    fn quote_arg_with_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn command_line_joins_program_and_args() {
        let args = vec!["-C".to_string(), "/repos/my notes".to_string(), "pull".to_string()];
        assert_eq!(command_line("git", &args), "git -C '/repos/my notes' pull");
    }
}
