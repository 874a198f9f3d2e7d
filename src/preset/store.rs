//! Rule-set backends: compiled-in defaults and loaded tables
//!
//! Table format: semicolon-delimited text, one header row naming the
//! columns, then one rule per row. The `keywords` field is itself a
//! comma-separated list. Blank lines and `#` comments are skipped.

use std::fs;
use std::path::Path;

use log::info;

use super::{match_rule, BandDynamics, PresetRule, DEFAULT_BAND_DYNAMICS};
use crate::error::{Result, SoundFixError};

const REQUIRED_COLUMNS: [&str; 9] = [
    "priority",
    "category_name",
    "keywords",
    "lowcut",
    "highcut",
    "volume",
    "attenuation_db",
    "gate_threshold_db",
    "expansion_ratio",
];

/// An immutable, priority-sorted set of classification rules.
///
/// Loaded once per batch run; matching never mutates the set.
#[derive(Debug, Clone)]
pub struct PresetStore {
    rules: Vec<PresetRule>,
}

impl PresetStore {
    /// The compiled-in default rule set.
    ///
    /// Category parameters and keyword precedence follow the shipped game
    /// presets: named categories first, then the material/element fallbacks
    /// at lower precedence.
    pub fn builtin() -> Self {
        let gate = (-60.0, 0.1);
        let rules = vec![
            builtin_rule(10, "Footstep", &["footstep", "step"], 100.0, 5000.0, -2.0, -60.0, gate),
            builtin_rule(20, "Attack/Impact", &["impact", "attack", "hit"], 150.0, 7000.0, -2.0, -60.0, gate),
            builtin_rule(30, "UI SFX", &["ui_click", "ui_sfx", "ui", "click"], 200.0, 6000.0, 0.0, -60.0, gate),
            builtin_rule(40, "Voice/Dialog", &["voice", "dialog", "speech"], 150.0, 8000.0, 0.0, -60.0, gate),
            builtin_rule(50, "Ambient", &["ambient"], 80.0, 8000.0, -8.0, -50.0, gate),
            builtin_rule(60, "Environment Tone", &["env", "environment"], 60.0, 6000.0, -14.0, -50.0, gate),
            builtin_rule(70, "Music Background", &["music"], 100.0, 12000.0, -8.0, -60.0, gate),
            builtin_rule(80, "Environment Tone", &["rattle", "window", "door", "creak"], 60.0, 6000.0, -14.0, -50.0, gate),
            builtin_rule(90, "Ambient", &["rain", "water", "drip"], 80.0, 8000.0, -8.0, -50.0, gate),
            builtin_rule(100, "Ambient", &["wind", "air"], 80.0, 8000.0, -8.0, -50.0, gate),
            builtin_rule(110, "Attack/Impact", &["metal", "wood", "glass"], 150.0, 7000.0, -2.0, -60.0, gate),
        ];
        Self { rules }
    }

    /// Load and parse a rule table from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let store = Self::parse(&text)?;
        info!(
            "loaded {} preset rules from {}",
            store.rules.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse a rule table from text.
    ///
    /// Fails with a `Config` error naming the offending row/field on any
    /// missing column, missing field, or type failure. Returned rules are
    /// sorted ascending by priority.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let header = lines.next().ok_or_else(|| SoundFixError::Config {
            detail: "empty rule table".to_string(),
        })?;
        let columns: Vec<String> = header
            .split(';')
            .map(|c| c.trim().to_lowercase())
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(SoundFixError::Config {
                    detail: format!("missing column `{required}`"),
                });
            }
        }
        let index_of = |name: &str| columns.iter().position(|c| c == name);

        let mut rules = Vec::new();
        for (row, line) in lines.enumerate() {
            let row = row + 1;
            let fields: Vec<&str> = line.split(';').map(str::trim).collect();

            let raw = |name: &str| -> Result<String> {
                let idx = index_of(name).expect("required columns verified above");
                match fields.get(idx) {
                    Some(v) if !v.is_empty() => Ok((*v).to_string()),
                    _ => Err(SoundFixError::config_row(
                        row,
                        format!("missing field `{name}`"),
                    )),
                }
            };
            let float = |name: &str| -> Result<f32> {
                let v = raw(name)?;
                v.parse::<f32>().map_err(|_| {
                    SoundFixError::config_row(row, format!("invalid value `{v}` for field `{name}`"))
                })
            };
            let opt_float = |name: &str, default: f32| -> Result<f32> {
                match index_of(name).and_then(|idx| fields.get(idx)) {
                    Some(v) if !v.is_empty() => v.parse::<f32>().map_err(|_| {
                        SoundFixError::config_row(
                            row,
                            format!("invalid value `{v}` for field `{name}`"),
                        )
                    }),
                    _ => Ok(default),
                }
            };

            let priority_raw = raw("priority")?;
            let priority = priority_raw.parse::<u32>().map_err(|_| {
                SoundFixError::config_row(
                    row,
                    format!("invalid value `{priority_raw}` for field `priority`"),
                )
            })?;

            let keywords: Vec<String> = raw("keywords")?
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return Err(SoundFixError::config_row(row, "empty `keywords` field"));
            }

            rules.push(PresetRule {
                priority,
                category: raw("category_name")?,
                keywords,
                lowcut_hz: float("lowcut")?,
                highcut_hz: float("highcut")?,
                volume_db: float("volume")?,
                attenuation_db: float("attenuation_db")?,
                gate_threshold_db: float("gate_threshold_db")?,
                expansion_ratio: float("expansion_ratio")?,
                mb_low: BandDynamics {
                    threshold_db: opt_float("mb_low_thresh", DEFAULT_BAND_DYNAMICS.threshold_db)?,
                    ratio: opt_float("mb_low_ratio", DEFAULT_BAND_DYNAMICS.ratio)?,
                },
                mb_mid: BandDynamics {
                    threshold_db: opt_float("mb_mid_thresh", DEFAULT_BAND_DYNAMICS.threshold_db)?,
                    ratio: opt_float("mb_mid_ratio", DEFAULT_BAND_DYNAMICS.ratio)?,
                },
                mb_high: BandDynamics {
                    threshold_db: opt_float("mb_high_thresh", DEFAULT_BAND_DYNAMICS.threshold_db)?,
                    ratio: opt_float("mb_high_ratio", DEFAULT_BAND_DYNAMICS.ratio)?,
                },
            });
        }

        rules.sort_by_key(|r| r.priority);
        Ok(Self { rules })
    }

    /// The rules, sorted ascending by priority.
    pub fn rules(&self) -> &[PresetRule] {
        &self.rules
    }

    /// Resolve the rule for a filename (first keyword hit in priority order).
    pub fn match_rule(&self, filename: &str) -> Option<&PresetRule> {
        match_rule(filename, &self.rules)
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin_rule(
    priority: u32,
    category: &str,
    keywords: &[&str],
    lowcut_hz: f32,
    highcut_hz: f32,
    volume_db: f32,
    attenuation_db: f32,
    (gate_threshold_db, expansion_ratio): (f32, f32),
) -> PresetRule {
    PresetRule {
        priority,
        category: category.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        lowcut_hz,
        highcut_hz,
        volume_db,
        attenuation_db,
        gate_threshold_db,
        expansion_ratio,
        mb_low: DEFAULT_BAND_DYNAMICS,
        mb_mid: DEFAULT_BAND_DYNAMICS,
        mb_high: DEFAULT_BAND_DYNAMICS,
    }
}
