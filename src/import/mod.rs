//! Row acquisition from measurement files
//!
//! Metrology exports come as a `.DAT` scan and a `.STA` summary whose file
//! names encode the component serial and the variant:
//! `<serial>_vc3_<kind>_metrology.(dat|sta)`, matched case-insensitively.

pub mod metrology;
pub mod pull;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::variant::ComponentVariant;

pub use metrology::{parse_scan, parse_summary, read_scan, read_summary};
pub use pull::{parse_pull_log, read_pull_log, PULL_LOG_HEADER_ROWS};

/// Characters of the file name that carry the serial number
pub const SERIAL_PREFIX_LEN: usize = 14;

const VARIANT_MARKER: &str = "_vc3_";

/// Errors raised while reading measurement files
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unrecognised metrology file name: {0}")]
    UnrecognisedName(String),

    #[error("Expected a .{expected} file, got {name}")]
    WrongKind { name: String, expected: &'static str },

    #[error("Data file {dat} is a {dat_variant} scan but summary {sta} is {sta_variant}")]
    VariantMismatch {
        dat: String,
        sta: String,
        dat_variant: ComponentVariant,
        sta_variant: ComponentVariant,
    },

    #[error("Data file {dat} and summary {sta} belong to different components")]
    SerialMismatch { dat: String, sta: String },

    #[error("Invalid {field} on line {line}: '{value}'")]
    InvalidValue {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// File kind of a metrology export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raw scan rows
    Dat,
    /// Summary rows
    Sta,
}

impl FileKind {
    fn extension(&self) -> &'static str {
        match self {
            FileKind::Dat => "dat",
            FileKind::Sta => "sta",
        }
    }
}

/// What a metrology file name says about its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetrologyFileName {
    pub serial: String,
    pub variant: ComponentVariant,
    pub kind: FileKind,
}

impl MetrologyFileName {
    /// Parse a bare file name (no directories)
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let (serial, rest) = lower.split_once(VARIANT_MARKER)?;
        if serial.is_empty() || !serial.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let (stem, extension) = rest.rsplit_once('.')?;
        let variant = ComponentVariant::ALL
            .into_iter()
            .find(|v| v.file_stem() == stem)?;
        let kind = match extension {
            "dat" => FileKind::Dat,
            "sta" => FileKind::Sta,
            _ => return None,
        };
        // Keep the serial as written
        Some(Self {
            serial: name[..serial.len()].to_string(),
            variant,
            kind,
        })
    }
}

/// A matched `.DAT`/`.STA` pair of one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetrologyPair {
    pub serial: String,
    pub variant: ComponentVariant,
    pub dat: PathBuf,
    pub sta: PathBuf,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_kind(path: &Path, expected: FileKind) -> Result<MetrologyFileName, ImportError> {
    let name = file_name(path);
    let parsed =
        MetrologyFileName::parse(&name).ok_or_else(|| ImportError::UnrecognisedName(name.clone()))?;
    if parsed.kind != expected {
        return Err(ImportError::WrongKind {
            name,
            expected: expected.extension(),
        });
    }
    Ok(parsed)
}

impl MetrologyPair {
    /// Match a data file with its summary
    ///
    /// Both names must parse, agree on the variant and share their serial
    /// prefix.
    pub fn from_paths(dat: &Path, sta: &Path) -> Result<Self, ImportError> {
        let dat_name = parse_kind(dat, FileKind::Dat)?;
        let sta_name = parse_kind(sta, FileKind::Sta)?;

        let prefix = |p: &Path| file_name(p).chars().take(SERIAL_PREFIX_LEN).collect::<String>();
        if prefix(dat) != prefix(sta) {
            return Err(ImportError::SerialMismatch {
                dat: file_name(dat),
                sta: file_name(sta),
            });
        }
        if dat_name.variant != sta_name.variant {
            return Err(ImportError::VariantMismatch {
                dat: file_name(dat),
                sta: file_name(sta),
                dat_variant: dat_name.variant,
                sta_variant: sta_name.variant,
            });
        }

        Ok(Self {
            serial: dat_name.serial,
            variant: dat_name.variant,
            dat: dat.to_path_buf(),
            sta: sta.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_names() {
        let parsed = MetrologyFileName::parse("20UPGM24220370_VC3_Assembled_Module_Metrology.STA").unwrap();
        assert_eq!(parsed.serial, "20UPGM24220370");
        assert_eq!(parsed.variant, ComponentVariant::Assembled);
        assert_eq!(parsed.kind, FileKind::Sta);

        let parsed = MetrologyFileName::parse("20upgpq2110001_vc3_bare_flex_metrology.dat").unwrap();
        assert_eq!(parsed.variant, ComponentVariant::Flex);
        assert_eq!(parsed.kind, FileKind::Dat);
    }

    #[test]
    fn test_reject_unknown_names() {
        assert!(MetrologyFileName::parse("scan.dat").is_none());
        assert!(MetrologyFileName::parse("20UPG_x_vc3_bare_flex_metrology.dat").is_none());
        assert!(MetrologyFileName::parse("20UPG_vc3_pcb_metrology.dat").is_none());
        assert!(MetrologyFileName::parse("20UPG_vc3_bare_flex_metrology.csv").is_none());
    }

    #[test]
    fn test_pair_requires_matching_serial_and_variant() {
        let pair = MetrologyPair::from_paths(
            Path::new("/data/20UPGB42000001_vc3_bare_module_metrology.DAT"),
            Path::new("/data/20UPGB42000001_vc3_bare_module_metrology.STA"),
        )
        .unwrap();
        assert_eq!(pair.variant, ComponentVariant::Bare);
        assert_eq!(pair.serial, "20UPGB42000001");

        let err = MetrologyPair::from_paths(
            Path::new("20UPGB42000001_vc3_bare_module_metrology.DAT"),
            Path::new("20UPGB42000002_vc3_bare_module_metrology.STA"),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::SerialMismatch { .. }));

        let err = MetrologyPair::from_paths(
            Path::new("20UPGB42000001_vc3_bare_module_metrology.DAT"),
            Path::new("20UPGB42000001_vc3_assembled_module_metrology.STA"),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::VariantMismatch { .. }));
    }

    #[test]
    fn test_pair_rejects_swapped_kinds() {
        let err = MetrologyPair::from_paths(
            Path::new("20UPGB42000001_vc3_bare_module_metrology.STA"),
            Path::new("20UPGB42000001_vc3_bare_module_metrology.DAT"),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::WrongKind { expected: "dat", .. }));
    }
}
