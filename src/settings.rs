//! Runtime settings for the label service.
//!
//! Everything is read from the process environment; there is no
//! configuration file. `Settings::from_lookup` takes any key lookup so the
//! parsing rules can be exercised without touching the real environment.

use crate::barcode::{PrintSize, Symbology};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Vertical space reserved for one line of description or code text.
pub const TEXT_LINE_MM: f64 = 7.0;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{var}: `{value}` is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{var} must be greater than zero")]
    NotPositive { var: &'static str },
    #[error("margins of {margin_mm} mm leave no printable area on a {width_mm} x {height_mm} mm page")]
    NoPrintableArea {
        margin_mm: f64,
        width_mm: f64,
        height_mm: f64,
    },
    #[error("image width {image_mm} mm exceeds the printable width of {printable_mm} mm")]
    ImageTooWide { image_mm: f64, printable_mm: f64 },
    #[error("a card needs {card_mm} mm but the printable height is {printable_mm} mm")]
    CardTooTall { card_mm: f64, printable_mm: f64 },
}

/// Geometry and symbology of the generated cards.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSettings {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_mm: f64,
    pub image_width_mm: f64,
    /// Printed height of the bars, independent of the value length.
    pub bar_height_mm: f64,
    pub symbology: Symbology,
    /// Emit an extra left-aligned picture/description/code block before the
    /// centered one on every page.
    pub duplicate_legacy_block: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            page_width_mm: 100.0,
            page_height_mm: 150.0,
            margin_mm: 10.0,
            image_width_mm: 60.0,
            bar_height_mm: 15.0,
            symbology: Symbology::Code128,
            duplicate_legacy_block: false,
        }
    }
}

impl LayoutSettings {
    pub fn printable_width_mm(&self) -> f64 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    pub fn printable_height_mm(&self) -> f64 {
        self.page_height_mm - 2.0 * self.margin_mm
    }

    /// Height taken by one product: the picture plus the description and code
    /// lines, twice over when the legacy block is on.
    pub fn card_height_mm(&self) -> f64 {
        let blocks = if self.duplicate_legacy_block { 2.0 } else { 1.0 };
        blocks * (self.bar_height_mm + 2.0 * TEXT_LINE_MM)
    }

    pub fn print_size(&self) -> PrintSize {
        PrintSize {
            width_mm: self.image_width_mm,
            height_mm: self.bar_height_mm,
        }
    }

    /// Checks the geometry is usable: positive sizes, a printable area left
    /// after the margins, and a card that fits on one page.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let sizes = [
            ("LABEL_PAGE_WIDTH_MM", self.page_width_mm),
            ("LABEL_PAGE_HEIGHT_MM", self.page_height_mm),
            ("LABEL_IMAGE_WIDTH_MM", self.image_width_mm),
            ("LABEL_BAR_HEIGHT_MM", self.bar_height_mm),
        ];
        for (var, value) in sizes {
            if value <= 0.0 {
                return Err(SettingsError::NotPositive { var });
            }
        }
        if self.margin_mm < 0.0 {
            return Err(SettingsError::Invalid {
                var: "LABEL_MARGIN_MM",
                value: self.margin_mm.to_string(),
                expected: "non-negative length in mm",
            });
        }
        if self.printable_width_mm() <= 0.0 || self.printable_height_mm() <= 0.0 {
            return Err(SettingsError::NoPrintableArea {
                margin_mm: self.margin_mm,
                width_mm: self.page_width_mm,
                height_mm: self.page_height_mm,
            });
        }
        if self.image_width_mm > self.printable_width_mm() {
            return Err(SettingsError::ImageTooWide {
                image_mm: self.image_width_mm,
                printable_mm: self.printable_width_mm(),
            });
        }
        if self.card_height_mm() > self.printable_height_mm() {
            return Err(SettingsError::CardTooTall {
                card_mm: self.card_height_mm(),
                printable_mm: self.printable_height_mm(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub layout: LayoutSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            layout: LayoutSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(value) = lookup("HOST") {
            settings.host = value;
        }
        if let Some(value) = lookup("PORT") {
            settings.port = value.trim().parse().map_err(|_| SettingsError::Invalid {
                var: "PORT",
                value: value.clone(),
                expected: "TCP port",
            })?;
        }
        if let Some(value) = lookup("DEBUG") {
            settings.debug = parse_flag("DEBUG", &value)?;
        }

        let layout = &mut settings.layout;
        if let Some(value) = lookup("LABEL_PAGE_WIDTH_MM") {
            layout.page_width_mm = parse_mm("LABEL_PAGE_WIDTH_MM", &value)?;
        }
        if let Some(value) = lookup("LABEL_PAGE_HEIGHT_MM") {
            layout.page_height_mm = parse_mm("LABEL_PAGE_HEIGHT_MM", &value)?;
        }
        if let Some(value) = lookup("LABEL_MARGIN_MM") {
            layout.margin_mm = parse_mm("LABEL_MARGIN_MM", &value)?;
        }
        if let Some(value) = lookup("LABEL_IMAGE_WIDTH_MM") {
            layout.image_width_mm = parse_mm("LABEL_IMAGE_WIDTH_MM", &value)?;
        }
        if let Some(value) = lookup("LABEL_BAR_HEIGHT_MM") {
            layout.bar_height_mm = parse_mm("LABEL_BAR_HEIGHT_MM", &value)?;
        }
        if let Some(value) = lookup("LABEL_SYMBOLOGY") {
            layout.symbology = value.parse().map_err(|_| SettingsError::Invalid {
                var: "LABEL_SYMBOLOGY",
                value: value.clone(),
                expected: "symbology (code128, code39, ean13)",
            })?;
        }
        if let Some(value) = lookup("LABEL_DUPLICATE_BLOCK") {
            layout.duplicate_legacy_block = parse_flag("LABEL_DUPLICATE_BLOCK", &value)?;
        }

        settings.layout.validate()?;
        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_mm(var: &'static str, value: &str) -> Result<f64, SettingsError> {
    match value.trim().parse::<f64>() {
        Ok(mm) if mm.is_finite() => Ok(mm),
        _ => Err(SettingsError::Invalid {
            var,
            value: value.to_string(),
            expected: "length in mm",
        }),
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SettingsError::Invalid {
            var,
            value: value.to_string(),
            expected: "boolean flag",
        }),
    }
}
