//! Theme state, persistence and change notification.

pub mod color;
pub mod presets;

use crate::store::Store;
use color::{hex_to_hsl, hsl_to_hex, normalize_hex, ColorError};
use presets::{ColorChannel, Preset, PresetColors, CUSTOM_PRESET, DEFAULT_PRESET};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Durable key holding [`ThemeState`].
pub const THEME_KEY: &str = "dashboard-theme";

/// Per-channel hex overrides used by the `custom` preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring: Option<String>,
}

impl CustomColors {
    pub fn seed() -> Self {
        let mut colors = Self::default();
        for channel in ColorChannel::ALL {
            colors.set(channel, channel.default_hex().to_string());
        }
        colors
    }

    fn slot(&mut self, channel: ColorChannel) -> &mut Option<String> {
        match channel {
            ColorChannel::Background => &mut self.background,
            ColorChannel::Foreground => &mut self.foreground,
            ColorChannel::Primary => &mut self.primary,
            ColorChannel::Ring => &mut self.ring,
        }
    }

    pub fn get(&self, channel: ColorChannel) -> Option<&str> {
        match channel {
            ColorChannel::Background => self.background.as_deref(),
            ColorChannel::Foreground => self.foreground.as_deref(),
            ColorChannel::Primary => self.primary.as_deref(),
            ColorChannel::Ring => self.ring.as_deref(),
        }
    }

    pub fn set(&mut self, channel: ColorChannel, hex: String) {
        *self.slot(channel) = Some(hex);
    }

    /// Channel value, or the seed default when absent.
    pub fn resolved(&self, channel: ColorChannel) -> String {
        self.get(channel)
            .unwrap_or_else(|| channel.default_hex())
            .to_string()
    }
}

fn default_preset_name() -> String {
    DEFAULT_PRESET.to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Persisted theme record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeState {
    #[serde(rename = "name", default = "default_preset_name")]
    pub preset_name: String,
    #[serde(
        rename = "customColors",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_colors: Option<CustomColors>,
    #[serde(
        rename = "backgroundUrl",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_image: Option<String>,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            preset_name: default_preset_name(),
            custom_colors: Some(CustomColors::seed()),
            background_image: None,
        }
    }
}

impl ThemeState {
    pub fn load(store: &Store) -> Self {
        store.get(THEME_KEY, ThemeState::default())
    }

    pub fn is_custom(&self) -> bool {
        self.preset_name == CUSTOM_PRESET
    }

    /// Preset row backing this state. Unknown names resolve to the default row.
    pub fn preset(&self) -> &'static Preset {
        presets::find(&self.preset_name).unwrap_or_else(presets::default_preset)
    }

    pub fn effective_colors(&self) -> EffectiveColors {
        if self.is_custom() {
            let custom = self.custom_colors.clone().unwrap_or_default();
            EffectiveColors::Custom(Palette::from_fn(|ch| custom.resolved(ch)))
        } else {
            EffectiveColors::Preset(self.preset().colors)
        }
    }

    pub fn is_dark(&self) -> bool {
        !self.is_custom() && presets::find(&self.preset_name).is_some_and(|p| p.dark)
    }

    pub fn applied(&self) -> AppliedTheme {
        AppliedTheme {
            variables: self.effective_colors().style_variables(),
            dark: self.is_dark(),
            background_image: self.background_image.clone(),
        }
    }
}

/// Four channel values in a single encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: String,
    pub foreground: String,
    pub primary: String,
    pub ring: String,
}

impl Palette {
    fn from_fn(mut f: impl FnMut(ColorChannel) -> String) -> Self {
        Self {
            background: f(ColorChannel::Background),
            foreground: f(ColorChannel::Foreground),
            primary: f(ColorChannel::Primary),
            ring: f(ColorChannel::Ring),
        }
    }

    pub fn get(&self, channel: ColorChannel) -> &str {
        match channel {
            ColorChannel::Background => &self.background,
            ColorChannel::Foreground => &self.foreground,
            ColorChannel::Primary => &self.primary,
            ColorChannel::Ring => &self.ring,
        }
    }

    /// `(variable, value)` pairs in channel order.
    pub fn variables(&self) -> impl Iterator<Item = (&'static str, &str)> {
        ColorChannel::ALL
            .into_iter()
            .map(move |ch| (ch.variable(), self.get(ch)))
    }
}

/// Colors currently in force: hex for a custom palette, HSL for a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveColors {
    Custom(Palette),
    Preset(PresetColors),
}

impl EffectiveColors {
    pub fn get(&self, channel: ColorChannel) -> String {
        match self {
            EffectiveColors::Custom(palette) => palette.get(channel).to_string(),
            EffectiveColors::Preset(colors) => colors.get(channel).to_string(),
        }
    }

    /// Values in HSL form, ready to be exposed as style variables.
    pub fn style_variables(&self) -> Palette {
        match self {
            EffectiveColors::Preset(colors) => Palette::from_fn(|ch| colors.get(ch).to_string()),
            EffectiveColors::Custom(palette) => Palette::from_fn(|ch| {
                hex_to_hsl(palette.get(ch)).unwrap_or_else(|err| {
                    tracing::warn!(channel = ?ch, error = %err, "invalid custom color; using default");
                    hex_to_hsl(ch.default_hex()).unwrap_or_default()
                })
            }),
        }
    }
}

/// Snapshot handed to observers whenever the theme changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTheme {
    pub variables: Palette,
    pub dark: bool,
    pub background_image: Option<String>,
}

struct ThemeHub {
    version: AtomicU64,
    current: RwLock<AppliedTheme>,
}

impl ThemeHub {
    fn publish(&self, theme: AppliedTheme) {
        match self.current.write() {
            Ok(mut guard) => *guard = theme,
            Err(poisoned) => *poisoned.into_inner() = theme,
        }
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> AppliedTheme {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Change feed for a [`ThemeEngine`]. The first poll always yields the
/// current theme.
pub struct ThemeSubscription {
    hub: Arc<ThemeHub>,
    seen: u64,
}

impl ThemeSubscription {
    pub fn poll(&mut self) -> Option<AppliedTheme> {
        let version = self.hub.version.load(Ordering::SeqCst);
        if version == self.seen {
            return None;
        }
        self.seen = version;
        Some(self.hub.snapshot())
    }

    pub fn current(&self) -> AppliedTheme {
        self.hub.snapshot()
    }
}

/// Owns the theme record, persists every change and notifies subscribers.
pub struct ThemeEngine {
    store: Store,
    state: ThemeState,
    hub: Arc<ThemeHub>,
}

impl ThemeEngine {
    pub fn load(store: Store) -> Self {
        let state = ThemeState::load(&store);
        let hub = Arc::new(ThemeHub {
            version: AtomicU64::new(1),
            current: RwLock::new(state.applied()),
        });
        Self { store, state, hub }
    }

    pub fn state(&self) -> &ThemeState {
        &self.state
    }

    pub fn subscribe(&self) -> ThemeSubscription {
        ThemeSubscription {
            hub: Arc::clone(&self.hub),
            seen: 0,
        }
    }

    fn commit(&mut self) {
        self.store.set(THEME_KEY, &self.state);
        self.hub.publish(self.state.applied());
    }

    /// Switch to a named preset and seed the custom palette from its colors.
    /// Returns `false` for names that are not presets.
    pub fn select_preset(&mut self, name: &str) -> bool {
        if name == CUSTOM_PRESET {
            if self.state.custom_colors.is_none() {
                self.state.custom_colors = Some(CustomColors::seed());
            }
            self.state.preset_name = name.to_string();
            self.commit();
            return true;
        }
        let Some(preset) = presets::find(name) else {
            tracing::warn!(preset = %name, "ignoring unknown theme preset");
            return false;
        };
        let mut seeded = self.state.custom_colors.clone().unwrap_or_else(CustomColors::seed);
        for channel in ColorChannel::ALL {
            match hsl_to_hex(preset.colors.get(channel)) {
                Ok(hex) => seeded.set(channel, hex),
                Err(err) => tracing::warn!(preset = %name, error = %err, "preset color did not convert"),
            }
        }
        self.state.custom_colors = Some(seeded);
        self.state.preset_name = preset.name.to_string();
        self.commit();
        true
    }

    /// Override one channel and switch to the custom preset.
    pub fn set_custom_color(&mut self, channel: ColorChannel, hex: &str) -> Result<(), ColorError> {
        let hex = normalize_hex(hex)?;
        self.state
            .custom_colors
            .get_or_insert_with(CustomColors::default)
            .set(channel, hex);
        self.state.preset_name = CUSTOM_PRESET.to_string();
        self.commit();
        Ok(())
    }

    /// Set the backdrop. An empty source clears it.
    pub fn set_background_image(&mut self, source: &str) {
        let source = source.trim();
        self.state.background_image = (!source.is_empty()).then(|| source.to_string());
        self.commit();
    }

    pub fn clear_background_image(&mut self) {
        self.state.background_image = None;
        self.commit();
    }

    pub fn effective_colors(&self) -> EffectiveColors {
        self.state.effective_colors()
    }

    pub fn is_dark(&self) -> bool {
        self.state.is_dark()
    }

    pub fn style_variables(&self) -> Palette {
        self.state.effective_colors().style_variables()
    }

    pub fn applied(&self) -> AppliedTheme {
        self.state.applied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_uses_default_preset() {
        let engine = ThemeEngine::load(Store::in_memory());
        assert_eq!(engine.state().preset_name, DEFAULT_PRESET);
        assert!(!engine.is_dark());
        let vars = engine.style_variables();
        assert_eq!(vars.background, "40 33% 98%");
        assert_eq!(vars.foreground, "224 71% 4%");
        assert_eq!(vars.primary, "163 25% 65%");
        assert_eq!(vars.ring, "163 19% 72%");
    }

    #[test]
    fn stone_is_dark_with_table_values() {
        let store = Store::in_memory();
        let mut engine = ThemeEngine::load(store.clone());
        assert!(engine.select_preset("stone"));
        assert!(engine.is_dark());
        let vars = engine.style_variables();
        assert_eq!(vars.background, "240 10% 3.9%");
        assert_eq!(vars.foreground, "0 0% 98%");
        assert_eq!(vars.primary, "240 5.9% 90%");
        assert_eq!(vars.ring, "240 5.9% 90%");

        let saved: ThemeState = store.get(THEME_KEY, ThemeState::default());
        assert_eq!(saved.preset_name, "stone");
    }

    #[test]
    fn custom_color_switches_to_custom_and_keeps_other_channels() {
        let mut engine = ThemeEngine::load(Store::in_memory());
        engine.set_custom_color(ColorChannel::Primary, "#FF0000").unwrap();
        assert_eq!(engine.state().preset_name, CUSTOM_PRESET);
        assert!(!engine.is_dark());
        let colors = engine.effective_colors();
        assert_eq!(colors.get(ColorChannel::Primary), "#ff0000");
        assert_eq!(colors.get(ColorChannel::Background), "#faf7f5");
        assert_eq!(engine.style_variables().primary, "0 100% 50%");
    }

    #[test]
    fn invalid_custom_color_is_rejected() {
        let store = Store::in_memory();
        let mut engine = ThemeEngine::load(store.clone());
        assert!(engine.set_custom_color(ColorChannel::Ring, "blue").is_err());
        assert_eq!(engine.state().preset_name, DEFAULT_PRESET);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn selecting_preset_seeds_custom_palette() {
        let mut engine = ThemeEngine::load(Store::in_memory());
        engine.select_preset("green");
        let custom = engine.state().custom_colors.clone().unwrap();
        assert_eq!(
            custom.background.as_deref(),
            hsl_to_hex("142.1 76.2% 36.3%").ok().as_deref()
        );
    }

    #[test]
    fn unknown_preset_name_renders_as_default() {
        let store = Store::in_memory();
        store.set_raw(THEME_KEY, r#"{"name":"neon","backgroundUrl":""}"#);
        let engine = ThemeEngine::load(store);
        assert_eq!(engine.state().preset_name, "neon");
        assert!(engine.state().background_image.is_none());
        assert!(!engine.is_dark());
        assert_eq!(engine.style_variables().background, "40 33% 98%");
    }

    #[test]
    fn custom_without_palette_falls_back_per_channel() {
        let store = Store::in_memory();
        store.set_raw(
            THEME_KEY,
            r##"{"name":"custom","customColors":{"primary":"#ff0000"}}"##,
        );
        let engine = ThemeEngine::load(store);
        let colors = engine.effective_colors();
        assert_eq!(colors.get(ColorChannel::Primary), "#ff0000");
        assert_eq!(colors.get(ColorChannel::Foreground), "#09090b");
    }

    #[test]
    fn subscribers_see_initial_and_changed_theme() {
        let mut engine = ThemeEngine::load(Store::in_memory());
        let mut sub = engine.subscribe();
        assert!(sub.poll().is_some());
        assert!(sub.poll().is_none());

        engine.set_background_image("https://example.com/bg.png");
        let applied = sub.poll().unwrap();
        assert_eq!(
            applied.background_image.as_deref(),
            Some("https://example.com/bg.png")
        );

        engine.clear_background_image();
        assert!(sub.poll().unwrap().background_image.is_none());
    }

    #[test]
    fn persisted_shape_uses_wire_names() {
        let store = Store::in_memory();
        let mut engine = ThemeEngine::load(store.clone());
        engine.set_background_image("data:image/png;base64,AAAA");
        let raw: serde_json::Value =
            serde_json::from_str(&store.get_raw(THEME_KEY).unwrap()).unwrap();
        assert_eq!(raw["name"], "default");
        assert_eq!(raw["backgroundUrl"], "data:image/png;base64,AAAA");
        assert_eq!(raw["customColors"]["background"], "#faf7f5");
    }
}
