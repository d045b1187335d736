use crate::error::UploadError;
use crate::models::ParsedFilename;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Upload naming convention: `<app token>_<timestamp>_<content hash>.csv[.gz]`.
///
/// Token and hash are ASCII word characters (12 and 32 of them). The timestamp
/// is captured as-is; no calendar check is made.
pub const FILENAME_PATTERN: &str =
    r"^([0-9A-Za-z_]{12})_([0-9T:-]+)_([0-9A-Za-z_]{32})\.csv(\.gz)?$";

static FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FILENAME_PATTERN).expect("valid filename regex"));

/// Validates a bare file name and splits it into its components.
pub fn parse_filename(name: &str) -> Result<ParsedFilename, UploadError> {
    let caps = FILENAME_REGEX
        .captures(name)
        .ok_or_else(|| UploadError::InvalidFilename(name.to_string()))?;

    Ok(ParsedFilename {
        app_token: caps[1].to_string(),
        timestamp: caps[2].to_string(),
        content_hash: caps[3].to_string(),
        compressed: caps.get(4).is_some(),
    })
}

/// Returns the base name of `path`, which is also the remote object name.
pub fn object_name(path: &Path) -> Result<String, UploadError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| UploadError::InvalidFilename(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID: &str = "abcdefghijkl_2024-01-01T00:00:00_0123456789abcdef0123456789abcdef.csv.gz";

    #[test]
    fn test_parse_compressed_name() {
        let parsed = parse_filename(VALID).unwrap();
        assert_eq!(parsed.app_token, "abcdefghijkl");
        assert_eq!(parsed.timestamp, "2024-01-01T00:00:00");
        assert_eq!(parsed.content_hash, "0123456789abcdef0123456789abcdef");
        assert!(parsed.compressed);
        assert_eq!(parsed.file_name(), VALID);
    }

    #[test]
    fn test_parse_uncompressed_name() {
        let name = VALID.trim_end_matches(".gz");
        let parsed = parse_filename(name).unwrap();
        assert!(!parsed.compressed);
        assert_eq!(parsed.file_name(), name);
    }

    #[test]
    fn test_timestamp_is_not_calendar_checked() {
        let name = "abcdefghijkl_9999-99-99T99:99_0123456789abcdef0123456789abcdef.csv";
        assert_eq!(parse_filename(name).unwrap().timestamp, "9999-99-99T99:99");

        let name = "ABC_def_1234_T_0123456789ABCDEF0123456789abcde_.csv.gz";
        assert_eq!(parse_filename(name).unwrap().app_token, "ABC_def_1234");
    }

    #[test]
    fn test_rejects_malformed_names() {
        let bad = [
            "",
            // token too short / too long
            "abcdefghijk_2024-01-01_0123456789abcdef0123456789abcdef.csv.gz",
            "abcdefghijklm_2024-01-01_0123456789abcdef0123456789abcdef.csv.gz",
            // hash too short / too long
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcde.csv.gz",
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef0.csv.gz",
            // empty or illegal timestamp
            "abcdefghijkl__0123456789abcdef0123456789abcdef.csv.gz",
            "abcdefghijkl_2024/01/01_0123456789abcdef0123456789abcdef.csv.gz",
            "abcdefghijkl_2024 01 01_0123456789abcdef0123456789abcdef.csv.gz",
            // missing separators
            "abcdefghijkl2024-01-01_0123456789abcdef0123456789abcdef.csv.gz",
            "abcdefghijkl_2024-01-010123456789abcdef0123456789abcdef.csv.gz",
            // wrong or extra suffix
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef.csv.gz.bak",
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef.csv.bz2",
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef.tsv.gz",
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef.csv.",
            "abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdefxcsv",
            // non-word characters in the token
            "abcdefghij-l_2024-01-01_0123456789abcdef0123456789abcdef.csv.gz",
            // prefix / path components are not stripped by the parser
            "/tmp/abcdefghijkl_2024-01-01_0123456789abcdef0123456789abcdef.csv.gz",
        ];

        for name in bad {
            match parse_filename(name) {
                Err(UploadError::InvalidFilename(n)) => assert_eq!(n, name),
                other => panic!("expected InvalidFilename for {:?}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_object_name_is_base_name() {
        let path = PathBuf::from("/data/outbox").join(VALID);
        assert_eq!(object_name(&path).unwrap(), VALID);
        assert_eq!(object_name(Path::new(VALID)).unwrap(), VALID);
        assert!(matches!(
            object_name(Path::new("/")),
            Err(UploadError::InvalidFilename(_))
        ));
    }
}
