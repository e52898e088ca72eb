//! Argument construction for winget sub-commands.
//!
//! Builders return plain argument lists; [`quote`] and
//! [`render_command_line`] produce the single-string form winget sees on
//! Windows and that we print in diagnostics.

use crate::error::{Error, Result};
use crate::types::{PackageDefinition, PackageId};

/// Characters that force an argument to be quoted.
const SPECIAL_CHARS: [char; 6] = ['"', '&', '|', '<', '>', '^'];

/// Flags shared by every command that may touch a source.
const SOURCE_AGREEMENT: &str = "--accept-source-agreements";

/// Build arguments for `winget install`.
pub fn install_args(package: &PackageDefinition) -> Result<Vec<String>> {
    let id = require_id(&package.id, "install")?;

    let mut args = vec![
        "install".to_string(),
        "--id".to_string(),
        id.to_string(),
        "--exact".to_string(),
        "--silent".to_string(),
        "--accept-package-agreements".to_string(),
        SOURCE_AGREEMENT.to_string(),
        "--disable-interactivity".to_string(),
    ];

    let options = [
        ("--version", &package.version),
        ("--scope", &package.scope),
        ("--architecture", &package.architecture),
        ("--locale", &package.locale),
        ("--location", &package.location),
    ];
    for (flag, value) in options {
        if let Some(value) = value {
            args.push(flag.to_string());
            args.push(value.clone());
        }
    }

    if package.force {
        args.push("--force".to_string());
    }
    if package.skip_dependencies {
        args.push("--skip-dependencies".to_string());
    }
    if package.allow_hash_mismatch {
        args.push("--ignore-security-hash".to_string());
    }

    Ok(args)
}

/// Build arguments for `winget uninstall`.
pub fn uninstall_args(id: &PackageId) -> Result<Vec<String>> {
    let id = require_id(id, "uninstall")?;
    Ok(vec![
        "uninstall".to_string(),
        "--id".to_string(),
        id.to_string(),
        "--exact".to_string(),
        "--silent".to_string(),
        SOURCE_AGREEMENT.to_string(),
        "--disable-interactivity".to_string(),
    ])
}

/// Build arguments for `winget upgrade`.
pub fn upgrade_args(id: &PackageId) -> Result<Vec<String>> {
    let id = require_id(id, "upgrade")?;
    Ok(vec![
        "upgrade".to_string(),
        "--id".to_string(),
        id.to_string(),
        "--exact".to_string(),
        "--silent".to_string(),
        "--accept-package-agreements".to_string(),
        SOURCE_AGREEMENT.to_string(),
        "--disable-interactivity".to_string(),
    ])
}

/// Build arguments for a catalog lookup (`winget show`).
pub fn show_args(id: &PackageId) -> Result<Vec<String>> {
    let id = require_id(id, "look up")?;
    Ok(vec![
        "show".to_string(),
        "--id".to_string(),
        id.to_string(),
        "--exact".to_string(),
        SOURCE_AGREEMENT.to_string(),
        "--disable-interactivity".to_string(),
    ])
}

/// Build arguments for listing installed packages.
pub fn list_args() -> Vec<String> {
    vec![
        "list".to_string(),
        SOURCE_AGREEMENT.to_string(),
        "--disable-interactivity".to_string(),
    ]
}

pub(crate) fn require_id<'a>(id: &'a PackageId, operation: &'static str) -> Result<&'a str> {
    if id.is_blank() {
        return Err(Error::EmptyIdentifier { operation });
    }
    Ok(id.as_str())
}

/// Quote a single argument for a Windows-style command line.
///
/// Arguments containing whitespace or shell-significant characters are
/// wrapped in double quotes with embedded quotes doubled. A run of
/// backslashes is doubled when it ends at a quote (embedded or closing), so
/// the MSVCRT parser reads it back literally. An empty argument becomes `""`
/// so it is never silently dropped.
pub fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }

    let needs_quotes = arg
        .chars()
        .any(|c| c.is_whitespace() || SPECIAL_CHARS.contains(&c));
    if !needs_quotes {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => {
                backslashes += 1;
                continue;
            }
            '"' => {
                push_backslashes(&mut quoted, backslashes * 2);
                quoted.push_str("\"\"");
            }
            _ => {
                push_backslashes(&mut quoted, backslashes);
                quoted.push(c);
            }
        }
        backslashes = 0;
    }
    push_backslashes(&mut quoted, backslashes * 2);
    quoted.push('"');
    quoted
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\\', count));
}

/// Render a program and its arguments as one command line.
pub fn render_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(quote(program))
        .chain(args.iter().map(|a| quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_args_minimal() {
        let args = install_args(&PackageDefinition::new("Git.Git")).unwrap();
        assert_eq!(&args[..4], ["install", "--id", "Git.Git", "--exact"]);
        assert!(args.contains(&"--accept-package-agreements".to_string()));
        assert!(!args.contains(&"--version".to_string()));
        assert!(!args.contains(&"--force".to_string()));
    }

    #[test]
    fn test_install_args_all_options() {
        let mut package = PackageDefinition::new("Python.Python.3.12")
            .with_version("3.12.1")
            .with_scope("user");
        package.architecture = Some("x64".to_string());
        package.locale = Some("en-US".to_string());
        package.location = Some(r"D:\Tools\Python".to_string());
        package.force = true;
        package.skip_dependencies = true;
        package.allow_hash_mismatch = true;

        let args = install_args(&package).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("--version 3.12.1"));
        assert!(joined.contains("--scope user"));
        assert!(joined.contains("--architecture x64"));
        assert!(joined.contains("--locale en-US"));
        assert!(joined.contains(r"--location D:\Tools\Python"));
        assert!(joined.ends_with("--force --skip-dependencies --ignore-security-hash"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = install_args(&PackageDefinition::new("")).unwrap_err();
        assert!(matches!(err, Error::EmptyIdentifier { operation: "install" }));

        assert!(uninstall_args(&PackageId::new("  ")).is_err());
        assert!(upgrade_args(&PackageId::new("")).is_err());
        assert!(show_args(&PackageId::new("")).is_err());
    }

    #[test]
    fn test_uninstall_and_upgrade_args() {
        let id = PackageId::new("Mozilla.Firefox");
        assert_eq!(&uninstall_args(&id).unwrap()[..3], ["uninstall", "--id", "Mozilla.Firefox"]);
        assert_eq!(&upgrade_args(&id).unwrap()[..3], ["upgrade", "--id", "Mozilla.Firefox"]);
        assert_eq!(list_args()[0], "list");
    }

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("Git.Git"), "Git.Git");
        assert_eq!(quote("--exact"), "--exact");
    }

    #[test]
    fn test_quote_special() {
        assert_eq!(quote("My Package"), "\"My Package\"");
        assert_eq!(quote("a&b"), "\"a&b\"");
        assert_eq!(quote("x|y"), "\"x|y\"");
        assert_eq!(quote("<in>"), "\"<in>\"");
        assert_eq!(quote("a^b"), "\"a^b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("tab\there"), "\"tab\there\"");
    }

    #[test]
    fn test_quote_backslashes_before_quotes() {
        assert_eq!(quote(r"D:\My Apps\"), r#""D:\My Apps\\""#);
        assert_eq!(quote(r#"a\"b c"#), r#""a\\""b c""#);
        // Backslashes not followed by a quote stay as they are
        assert_eq!(quote(r"C:\Program Files\App"), r#""C:\Program Files\App""#);
        assert_eq!(quote(r"D:\Apps\"), r"D:\Apps\");
    }

    #[test]
    fn test_quote_empty() {
        assert_eq!(quote(""), "\"\"");
        let line = render_command_line("winget", &["show".to_string(), String::new()]);
        assert_eq!(line, "winget show \"\"");
    }

    #[test]
    fn test_identifier_with_space_round_trips_through_shell_splitter() {
        let package = PackageDefinition::new("Contoso Suite.Tools");
        let args = install_args(&package).unwrap();
        let line = render_command_line("winget", &args);

        let tokens = shlex::split(&line).unwrap();
        let id_pos = tokens.iter().position(|t| t == "--id").unwrap();
        assert_eq!(tokens[id_pos + 1], "Contoso Suite.Tools");
        assert_eq!(tokens.len(), args.len() + 1);
    }
}
