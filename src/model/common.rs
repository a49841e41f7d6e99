use serde::{Deserialize, Serialize};

/// Kind of data-transformation pipeline attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Ingest flows
    #[serde(alias = "INPUT")]
    Input,
    /// Canonicalization flows
    #[serde(alias = "HARMONIZE")]
    Harmonize,
}

impl FlowType {
    /// Directory name used for this flow type under an entity directory
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Input => "input",
            FlowType::Harmonize => "harmonize",
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(FlowType::Input),
            "harmonize" => Ok(FlowType::Harmonize),
            _ => Err(format!("Unknown flow type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeFormat {
    #[default]
    Sjs,
    Xqy,
}

impl CodeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CodeFormat::Sjs => "sjs",
            CodeFormat::Xqy => "xqy",
        }
    }
}

impl std::str::FromStr for CodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sjs" | "javascript" => Ok(CodeFormat::Sjs),
            "xqy" | "xquery" => Ok(CodeFormat::Xqy),
            _ => Err(format!("Unknown code format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "xml" => Ok(DataFormat::Xml),
            _ => Err(format!("Unknown data format: {}", s)),
        }
    }
}
