//! Label sheet configuration.
//!
//! Field names serialize in camelCase so stored presets and export files keep
//! the `marginH` / `codeSizeMm` / `textPosition` shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{A4_MM, LETTER_MM};
use crate::error::{LabelError, LabelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Paper {
    #[default]
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "LETTER")]
    Letter,
}

impl Paper {
    /// Page (width, height) in millimeters.
    pub fn size_mm(self) -> (f32, f32) {
        match self {
            Paper::A4 => A4_MM,
            Paper::Letter => LETTER_MM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    #[default]
    Datamatrix,
    Qrcode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl FromStr for Paper {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A4" => Ok(Paper::A4),
            "LETTER" => Ok(Paper::Letter),
            other => Err(format!("unknown paper size '{}' (expected A4 or LETTER)", other)),
        }
    }
}

impl FromStr for CodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "datamatrix" => Ok(CodeType::Datamatrix),
            "qrcode" | "qr" => Ok(CodeType::Qrcode),
            other => Err(format!("unknown code type '{}' (expected datamatrix or qrcode)", other)),
        }
    }
}

impl FromStr for TextPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(TextPosition::Top),
            "bottom" => Ok(TextPosition::Bottom),
            "left" => Ok(TextPosition::Left),
            "right" => Ok(TextPosition::Right),
            other => Err(format!("unknown text position '{}'", other)),
        }
    }
}

impl fmt::Display for Paper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Paper::A4 => "A4",
            Paper::Letter => "LETTER",
        })
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodeType::Datamatrix => "datamatrix",
            CodeType::Qrcode => "qrcode",
        })
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextPosition::Top => "top",
            TextPosition::Bottom => "bottom",
            TextPosition::Left => "left",
            TextPosition::Right => "right",
        })
    }
}

fn one() -> u32 {
    1
}

/// Layout and code settings for one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    pub columns: u32,
    /// Left and right page margin, mm
    pub margin_h: f32,
    /// Top and bottom page margin, mm
    pub margin_v: f32,
    pub padding_h: f32,
    pub padding_v: f32,
    /// Points
    pub font_size: f32,
    pub code_size_mm: f32,
    pub dpi: u32,
    pub paper: Paper,
    pub code_type: CodeType,
    pub text_position: TextPosition,
    #[serde(default = "one")]
    pub replicates: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            columns: 3,
            margin_h: 10.0,
            margin_v: 10.0,
            padding_h: 3.0,
            padding_v: 3.0,
            font_size: 10.0,
            code_size_mm: 12.0,
            dpi: 200,
            paper: Paper::A4,
            code_type: CodeType::Datamatrix,
            text_position: TextPosition::Top,
            replicates: 1,
        }
    }
}

impl LabelConfig {
    /// Check field ranges. Lengths must be finite and non-negative; counts,
    /// font size, code size and dpi must be positive.
    pub fn validate(&self) -> LabelResult<()> {
        if self.columns < 1 {
            return Err(LabelError::InvalidConfig("columns must be at least 1".into()));
        }
        if self.replicates < 1 {
            return Err(LabelError::InvalidConfig("replicates must be at least 1".into()));
        }
        if self.dpi < 1 {
            return Err(LabelError::InvalidConfig("dpi must be at least 1".into()));
        }

        let lengths = [
            ("marginH", self.margin_h),
            ("marginV", self.margin_v),
            ("paddingH", self.padding_h),
            ("paddingV", self.padding_v),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(LabelError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [("fontSize", self.font_size), ("codeSizeMm", self.code_size_mm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LabelError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LabelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(LabelConfig::default()).unwrap();
        assert_eq!(json["marginH"], 10.0);
        assert_eq!(json["codeSizeMm"], 12.0);
        assert_eq!(json["paper"], "A4");
        assert_eq!(json["codeType"], "datamatrix");
        assert_eq!(json["textPosition"], "top");
    }

    #[test]
    fn test_missing_replicates_defaults_to_one() {
        let json = r#"{
            "columns": 2, "marginH": 5, "marginV": 5, "paddingH": 1, "paddingV": 1,
            "fontSize": 8, "codeSizeMm": 10, "dpi": 300, "paper": "LETTER",
            "codeType": "qrcode", "textPosition": "left"
        }"#;
        let config: LabelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.replicates, 1);
        assert_eq!(config.paper, Paper::Letter);
        assert_eq!(config.code_type, CodeType::Qrcode);
        assert_eq!(config.text_position, TextPosition::Left);
    }

    #[test]
    fn test_validate_rejects_zero_columns() {
        let config = LabelConfig { columns: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(LabelError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_negative_margin() {
        let config = LabelConfig { margin_v: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(LabelError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("letter".parse::<Paper>().unwrap(), Paper::Letter);
        assert_eq!("QR".parse::<CodeType>().unwrap(), CodeType::Qrcode);
        assert_eq!("Right".parse::<TextPosition>().unwrap(), TextPosition::Right);
        assert!("A3".parse::<Paper>().is_err());
    }
}
