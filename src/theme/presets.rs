use serde::{Deserialize, Serialize};

pub const DEFAULT_PRESET: &str = "default";
pub const CUSTOM_PRESET: &str = "custom";

/// One of the four themable color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    Background,
    Foreground,
    Primary,
    Ring,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 4] = [
        ColorChannel::Background,
        ColorChannel::Foreground,
        ColorChannel::Primary,
        ColorChannel::Ring,
    ];

    /// Name of the style variable this channel drives.
    pub fn variable(self) -> &'static str {
        match self {
            ColorChannel::Background => "--background",
            ColorChannel::Foreground => "--foreground",
            ColorChannel::Primary => "--primary",
            ColorChannel::Ring => "--ring",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorChannel::Background => "Background",
            ColorChannel::Foreground => "Text",
            ColorChannel::Primary => "Primary",
            ColorChannel::Ring => "Accent Ring",
        }
    }

    /// Seed value used when a custom palette lacks this channel.
    pub fn default_hex(self) -> &'static str {
        match self {
            ColorChannel::Background => "#faf7f5",
            ColorChannel::Foreground => "#09090b",
            ColorChannel::Primary => "#a7c5bd",
            ColorChannel::Ring => "#b9c8c5",
        }
    }
}

/// Fixed HSL values of a named preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetColors {
    pub background: &'static str,
    pub foreground: &'static str,
    pub primary: &'static str,
    pub ring: &'static str,
}

impl PresetColors {
    pub fn get(&self, channel: ColorChannel) -> &'static str {
        match channel {
            ColorChannel::Background => self.background,
            ColorChannel::Foreground => self.foreground,
            ColorChannel::Primary => self.primary,
            ColorChannel::Ring => self.ring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub label: &'static str,
    pub dark: bool,
    pub colors: PresetColors,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: DEFAULT_PRESET,
        label: "Default",
        dark: false,
        colors: PresetColors {
            background: "40 33% 98%",
            foreground: "224 71% 4%",
            primary: "163 25% 65%",
            ring: "163 19% 72%",
        },
    },
    Preset {
        name: "stone",
        label: "Stone",
        dark: true,
        colors: PresetColors {
            background: "240 10% 3.9%",
            foreground: "0 0% 98%",
            primary: "240 5.9% 90%",
            ring: "240 5.9% 90%",
        },
    },
    Preset {
        name: "orange",
        label: "Orange",
        dark: true,
        colors: PresetColors {
            background: "20 14.3% 4.1%",
            foreground: "60 9.1% 97.8%",
            primary: "24.6 95% 53.1%",
            ring: "24.6 95% 53.1%",
        },
    },
    Preset {
        name: "rose",
        label: "Rose",
        dark: true,
        colors: PresetColors {
            background: "346.8 77.2% 49.8%",
            foreground: "355.7 100% 97.3%",
            primary: "340.9 95.5% 91%",
            ring: "340.9 95.5% 91%",
        },
    },
    Preset {
        name: "violet",
        label: "Violet",
        dark: true,
        colors: PresetColors {
            background: "262.1 83.3% 57.8%",
            foreground: "210 40% 98%",
            primary: "263.4 92.4% 83.3%",
            ring: "263.4 92.4% 83.3%",
        },
    },
    Preset {
        name: "green",
        label: "Green",
        dark: true,
        colors: PresetColors {
            background: "142.1 76.2% 36.3%",
            foreground: "144.9 80.4% 97.3%",
            primary: "142.1 70.6% 45.3%",
            ring: "142.1 70.6% 45.3%",
        },
    },
];

pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

pub fn default_preset() -> &'static Preset {
    &PRESETS[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::color::Hsl;

    #[test]
    fn every_preset_value_parses() {
        for preset in PRESETS {
            for channel in ColorChannel::ALL {
                let value = preset.colors.get(channel);
                assert!(Hsl::parse(value).is_ok(), "{} {value}", preset.name);
            }
        }
    }

    #[test]
    fn only_default_is_light() {
        let light: Vec<_> = PRESETS.iter().filter(|p| !p.dark).map(|p| p.name).collect();
        assert_eq!(light, vec![DEFAULT_PRESET]);
        assert!(find(CUSTOM_PRESET).is_none());
    }
}
