//! Module variant tag

use serde::{Deserialize, Serialize};

/// Structural variant of a measured module
///
/// Selects the region set, summary trailer schema and tolerance table. It is
/// decided once at the import boundary and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentVariant {
    /// Bare flex PCB
    Flex,
    /// Bare module (sensor with front-end chips)
    Bare,
    /// Flex assembled onto a bare module
    Assembled,
}

impl ComponentVariant {
    pub const ALL: [ComponentVariant; 3] = [
        ComponentVariant::Flex,
        ComponentVariant::Bare,
        ComponentVariant::Assembled,
    ];

    /// Metrology file-name stem identifying this variant
    pub fn file_stem(&self) -> &'static str {
        match self {
            ComponentVariant::Flex => "bare_flex_metrology",
            ComponentVariant::Bare => "bare_module_metrology",
            ComponentVariant::Assembled => "assembled_module_metrology",
        }
    }

    /// Test code under which the module mass is recorded
    pub fn mass_test_code(&self) -> &'static str {
        match self {
            ComponentVariant::Flex => "MASS",
            ComponentVariant::Bare | ComponentVariant::Assembled => "MASS_MEASUREMENT",
        }
    }
}

impl std::fmt::Display for ComponentVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentVariant::Flex => write!(f, "flex"),
            ComponentVariant::Bare => write!(f, "bare"),
            ComponentVariant::Assembled => write!(f, "assembled"),
        }
    }
}

impl std::str::FromStr for ComponentVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flex" => Ok(ComponentVariant::Flex),
            "bare" => Ok(ComponentVariant::Bare),
            "assembled" | "assem" => Ok(ComponentVariant::Assembled),
            _ => Err(format!("Unknown module variant: {}", s)),
        }
    }
}
