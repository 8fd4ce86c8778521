//! Template discovery and placeholder expansion.
//!
//! A template lives next to its output and is named by inserting an infix
//! before the output's extension: `sonar-project.properties` is generated
//! from `sonar-project_template.properties`.
//!
//! Expansion is line-oriented. Each `\n`-terminated line (terminator kept)
//! is scanned once, left to right, and every non-overlapping occurrence of
//! the placeholder is replaced. Replaced text is never rescanned. A
//! placeholder whose bytes straddle a line terminator is therefore not
//! recognized and passes through untouched.

use std::fs::File;
use std::io::{BufRead as _, BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoOp, Result};
use crate::manifest::Version;

/// Literal marker replaced with the version.
pub const PLACEHOLDER: &str = "%__version__%";

/// Inserted before the extension to form a template name.
pub const TEMPLATE_INFIX: &str = "_template";

/// Derives the template path for `output` by inserting `infix` before its extension.
///
/// Only the final path component is split, at its last `.`. Leading dots
/// do not start an extension, so `.env` has none. Names without an
/// extension get the infix appended:
///
/// - `a.b` -> `a_template.b`
/// - `archive.tar.gz` -> `archive.tar_template.gz`
/// - `Makefile` -> `Makefile_template`
/// - `conf.d/app` -> `conf.d/app_template`
pub fn template_path(output: &str, infix: &str) -> String {
    // Path separators are ASCII, so `i + 1` is a char boundary.
    let name_start = output.rfind(std::path::is_separator).map_or(0, |i| i + 1);
    let name = &output[name_start..];
    let leading_dots = name.len() - name.trim_start_matches('.').len();

    match name[leading_dots..].rfind('.') {
        Some(i) => {
            let dot = name_start + leading_dots + i;
            format!("{}{infix}{}", &output[..dot], &output[dot..])
        }
        None => format!("{output}{infix}"),
    }
}

/// Appends `line` to `out` with every occurrence of `token` replaced by `replacement`.
///
/// Returns the number of replacements made. An empty token never matches.
pub fn replace_token(line: &[u8], token: &[u8], replacement: &[u8], out: &mut Vec<u8>) -> usize {
    if token.is_empty() {
        out.extend_from_slice(line);
        return 0;
    }

    let mut count = 0;
    let mut last = 0;
    for start in memchr::memmem::find_iter(line, token) {
        out.extend_from_slice(&line[last..start]);
        out.extend_from_slice(replacement);
        last = start + token.len();
        count += 1;
    }
    out.extend_from_slice(&line[last..]);
    count
}

/// Summary of one expanded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub template: PathBuf,
    pub output: PathBuf,

    /// Lines read from the template, counting a final unterminated line.
    pub lines: usize,

    /// Placeholder occurrences replaced.
    pub replacements: usize,

    pub bytes_written: u64,

    /// Hex SHA-256 of the output contents.
    pub sha256: String,
}

/// Streams `template` into `output`, replacing `token` with `version` on every line.
///
/// The output is truncated before writing. On failure it is left as far as
/// it got; nothing is rolled back.
pub fn expand_file(
    template: &Path,
    output: &Path,
    token: &[u8],
    version: &Version,
) -> Result<Expansion> {
    use sha2::Digest as _;

    let input = File::open(template).map_err(|e| Error::io(IoOp::Open, template, e))?;
    let mut reader = BufReader::new(input);

    let out_file = File::create(output).map_err(|e| Error::io(IoOp::Create, output, e))?;
    let mut writer = BufWriter::new(out_file);

    let mut hasher = sha2::Sha256::new();
    let mut line = Vec::new();
    let mut expanded = Vec::new();
    let mut lines = 0;
    let mut replacements = 0;
    let mut bytes_written = 0u64;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(IoOp::Read, template, e))?;
        if n == 0 {
            break;
        }
        lines += 1;

        expanded.clear();
        replacements += replace_token(&line, token, version.as_bytes(), &mut expanded);

        writer
            .write_all(&expanded)
            .map_err(|e| Error::io(IoOp::Write, output, e))?;
        hasher.update(&expanded);
        bytes_written += expanded.len() as u64;
    }

    writer
        .flush()
        .map_err(|e| Error::io(IoOp::Flush, output, e))?;

    tracing::debug!(
        template = %template.display(),
        output = %output.display(),
        lines,
        bytes_written,
        "expanded template"
    );

    Ok(Expansion {
        template: template.to_path_buf(),
        output: output.to_path_buf(),
        lines,
        replacements,
        bytes_written,
        sha256: hex::encode(hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn replace(line: &str, version: &str) -> (String, usize) {
        let mut out = Vec::new();
        let n = replace_token(
            line.as_bytes(),
            PLACEHOLDER.as_bytes(),
            version.as_bytes(),
            &mut out,
        );
        (String::from_utf8(out).unwrap(), n)
    }

    fn expand(dir: &Path, template_contents: &[u8], version: &str) -> (Vec<u8>, Expansion) {
        let template = dir.join("t_template.txt");
        let output = dir.join("t.txt");
        std::fs::write(&template, template_contents).unwrap();
        let exp = expand_file(
            &template,
            &output,
            PLACEHOLDER.as_bytes(),
            &Version::new(version),
        )
        .expect("expansion failed");
        (std::fs::read(&output).unwrap(), exp)
    }

    #[test]
    fn test_template_path_with_extension() {
        assert_eq!(
            template_path("sonar-project.properties", TEMPLATE_INFIX),
            "sonar-project_template.properties"
        );
        assert_eq!(template_path("a.b", TEMPLATE_INFIX), "a_template.b");
    }

    #[test]
    fn test_template_path_splits_at_last_dot() {
        assert_eq!(
            template_path("archive.tar.gz", TEMPLATE_INFIX),
            "archive.tar_template.gz"
        );
    }

    #[test]
    fn test_template_path_without_extension() {
        assert_eq!(template_path("Makefile", TEMPLATE_INFIX), "Makefile_template");
    }

    #[test]
    fn test_template_path_dotfiles() {
        assert_eq!(template_path(".env", TEMPLATE_INFIX), ".env_template");
        assert_eq!(template_path("..", TEMPLATE_INFIX), ".._template");
        assert_eq!(template_path(".env.local", TEMPLATE_INFIX), ".env_template.local");
    }

    #[test]
    fn test_template_path_trailing_dot() {
        assert_eq!(template_path("foo.", TEMPLATE_INFIX), "foo_template.");
    }

    #[test]
    fn test_template_path_keeps_directories() {
        assert_eq!(template_path("conf.d/app", TEMPLATE_INFIX), "conf.d/app_template");
        assert_eq!(
            template_path("build/cfg/app.ini", TEMPLATE_INFIX),
            "build/cfg/app_template.ini"
        );
        assert_eq!(template_path("dir/.rc", TEMPLATE_INFIX), "dir/.rc_template");
    }

    #[test]
    fn test_replace_single() {
        assert_eq!(
            replace("Version=%__version__%\n", "1.2.3"),
            ("Version=1.2.3\n".to_string(), 1)
        );
    }

    #[test]
    fn test_replace_multiple_and_adjacent() {
        assert_eq!(
            replace("%__version__%%__version__% v%__version__%", "2"),
            ("22 v2".to_string(), 3)
        );
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        // The inserted text contains the token; it must survive verbatim.
        assert_eq!(
            replace("[%__version__%]", "%__version__%"),
            ("[%__version__%]".to_string(), 1)
        );
    }

    #[test]
    fn test_overlapping_candidates_left_to_right() {
        // "%__version__%__version__%" has one match at the start; the
        // remainder "__version__%" no longer starts with '%'.
        assert_eq!(
            replace("%__version__%__version__%", "X"),
            ("X__version__%".to_string(), 1)
        );
    }

    #[test]
    fn test_empty_token_never_matches() {
        let mut out = Vec::new();
        assert_eq!(replace_token(b"abc", b"", b"X", &mut out), 0);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_expand_file_basic() {
        let dir = tempfile::tempdir().unwrap();
        let (out, exp) = expand(
            dir.path(),
            b"sonar.projectKey=client\nsonar.projectVersion=%__version__%\n",
            "1.2.3",
        );
        assert_eq!(out, b"sonar.projectKey=client\nsonar.projectVersion=1.2.3\n");
        assert_eq!(exp.lines, 2);
        assert_eq!(exp.replacements, 1);
        assert_eq!(exp.bytes_written, out.len() as u64);
    }

    #[test]
    fn test_expand_without_placeholder_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let contents = b"a=1\r\n\xff\xfe binary \x00 bytes\n\nlast line without newline";
        let (out, exp) = expand(dir.path(), contents, "9.9.9");
        assert_eq!(out, contents);
        assert_eq!(exp.replacements, 0);
        assert_eq!(exp.lines, 4);
    }

    #[test]
    fn test_expand_preserves_crlf_and_unterminated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let (out, _) = expand(dir.path(), b"v=%__version__%\r\ntail %__version__%", "3.0");
        assert_eq!(out, b"v=3.0\r\ntail 3.0");
    }

    #[test]
    fn test_token_split_across_lines_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let contents = b"x=%__vers\nion__%\n";
        let (out, exp) = expand(dir.path(), contents, "1.0.0");
        assert_eq!(out, contents);
        assert_eq!(exp.replacements, 0);
    }

    #[test]
    fn test_expand_empty_template() {
        let dir = tempfile::tempdir().unwrap();
        let (out, exp) = expand(dir.path(), b"", "1.0.0");
        assert!(out.is_empty());
        assert_eq!(exp.lines, 0);
    }

    #[test]
    fn test_expand_truncates_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.txt"), "stale contents that are much longer\n").unwrap();
        let (out, _) = expand(dir.path(), b"%__version__%\n", "1");
        assert_eq!(out, b"1\n");
    }

    #[test]
    fn test_expand_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let (first, a) = expand(dir.path(), b"v=%__version__%\n", "1.2.3");
        let (second, b) = expand(dir.path(), b"v=%__version__%\n", "1.2.3");
        assert_eq!(first, second);
        assert_eq!(a.sha256, b.sha256);
        assert_eq!(a.sha256.len(), 64);
    }

    #[test]
    fn test_missing_template_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("keep.txt");
        std::fs::write(&output, "previous").unwrap();
        let err = expand_file(
            &dir.path().join("keep_template.txt"),
            &output,
            PLACEHOLDER.as_bytes(),
            &Version::new("1.0"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { op: IoOp::Open, .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t_template.txt");
        std::fs::write(&template, "x").unwrap();
        let err = expand_file(
            &template,
            &dir.path().join("no-such-dir").join("t.txt"),
            PLACEHOLDER.as_bytes(),
            &Version::new("1.0"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { op: IoOp::Create, .. }));
    }
}
