//! Rule-based prompt enrichment.
//!
//! The devotional enhancer appends descriptive clauses chosen from the
//! selected tradition, category, theme and style, skipping clauses the
//! prompt already covers. Keyword checks are case-insensitive substring
//! matches.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SYMBOL_WORDS: &[&str] = &[
    "cross",
    "crucifix",
    "menorah",
    "om",
    "buddha",
    "lotus",
    "star of david",
    "crescent",
    "prayer beads",
    "shrine",
    "altar",
];
const LIGHT_WORDS: &[&str] = &[
    "light",
    "ray",
    "beam",
    "glow",
    "shine",
    "illumination",
    "divine light",
    "radiance",
    "aura",
];
const CAMERA_WORDS: &[&str] = &["camera", "angle", "zoom", "pan", "aerial", "tracking"];

const QUALITY_CLAUSE: &str = "high quality, detailed, spiritually evocative";
const TOPIC_SUFFIX: &str = "exploring historical context, current developments, \
                            ethical implications, and future possibilities";
const TOPIC_ASPECTS: [&str; 4] = [
    "exploring historical context",
    "current developments",
    "ethical implications",
    "future possibilities",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} option: {value}")]
pub struct UnknownOption {
    pub field: &'static str,
    pub value: String,
}

macro_rules! option_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownOption {
                        field: $field,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum!(Tradition, "tradition", {
    Christian => "christian",
    Hindu => "hindu",
    Buddhist => "buddhist",
    Islamic => "islamic",
    Jewish => "jewish",
    Interfaith => "interfaith",
});

option_enum!(Category, "category", {
    Scripture => "scripture",
    Worship => "worship",
    Nature => "nature",
    Prayer => "prayer",
    Symbol => "symbol",
    Event => "event",
});

option_enum!(Theme, "theme", {
    Peace => "peace",
    Hope => "hope",
    Love => "love",
    Wisdom => "wisdom",
    Gratitude => "gratitude",
    Community => "community",
});

option_enum!(VisualStyle, "style", {
    Cinematic => "cinematic",
    Artistic => "artistic",
    Realistic => "realistic",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhanceOptions {
    pub tradition: Tradition,
    pub category: Category,
    pub theme: Theme,
    pub style: VisualStyle,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            tradition: Tradition::Christian,
            category: Category::Scripture,
            theme: Theme::Peace,
            style: VisualStyle::Cinematic,
        }
    }
}

/// An enriched prompt plus human-readable notes on what was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    pub prompt: String,
    pub notes: Vec<String>,
}

pub fn enhance_prompt(prompt: &str, options: &EnhanceOptions) -> Enhancement {
    let lower = prompt.to_lowercase();
    let has_symbols = contains_any(&lower, SYMBOL_WORDS);
    let has_light = contains_any(&lower, LIGHT_WORDS);
    let has_camera = contains_any(&lower, CAMERA_WORDS);
    let symbolic = options.category == Category::Symbol;

    let mut notes = vec![format!("Original prompt: \"{prompt}\"")];
    let mut additions: Vec<&str> = Vec::new();

    let tradition = match options.tradition {
        Tradition::Christian => Some((
            "christian",
            "Christian-inspired",
            "cross",
            if symbolic {
                "with prominent cross symbol"
            } else {
                "with subtle cross imagery"
            },
            "Added Christian symbolism",
        )),
        Tradition::Hindu => Some((
            "hindu",
            "Hindu-inspired",
            "om",
            if symbolic {
                "with prominent Om symbol"
            } else {
                "with subtle Hindu iconography"
            },
            "Added Hindu symbolism",
        )),
        Tradition::Buddhist => Some((
            "buddhist",
            "Buddhist-inspired",
            "buddha",
            if symbolic {
                "with lotus flower symbolism"
            } else {
                "with peaceful Buddhist elements"
            },
            "Added Buddhist symbolism",
        )),
        Tradition::Islamic => Some((
            "islamic",
            "Islamic-inspired",
            "crescent",
            if symbolic {
                "with geometric Islamic patterns"
            } else {
                "with subtle Islamic architectural elements"
            },
            "Added Islamic symbolism",
        )),
        Tradition::Jewish => Some((
            "jewish",
            "Jewish-inspired",
            "star",
            if symbolic {
                "with Star of David symbol"
            } else {
                "with subtle Jewish symbolism"
            },
            "Added Jewish symbolism",
        )),
        Tradition::Interfaith => {
            additions.push("universal spiritual symbols");
            notes.push("Added interfaith/universal symbolism".to_string());
            None
        }
    };
    if let Some((name, inspired, symbol_word, symbol_clause, note)) = tradition {
        if !lower.contains(name) {
            additions.push(inspired);
        }
        if !has_symbols && !lower.contains(symbol_word) {
            additions.push(symbol_clause);
            notes.push(note.to_string());
        }
    }

    let category = match options.category {
        Category::Scripture if !lower.contains("scripture") && !lower.contains("text") => {
            Some(("with sacred text or scripture", "Added scripture elements"))
        }
        Category::Worship if !lower.contains("worship") => {
            Some(("devotional worship scene", "Added worship elements"))
        }
        Category::Nature if !lower.contains("nature") => {
            Some(("divine beauty of nature", "Added divine nature elements"))
        }
        Category::Prayer if !lower.contains("prayer") => {
            Some(("peaceful prayer environment", "Added prayer space elements"))
        }
        _ => None,
    };
    push_clause(&mut additions, &mut notes, category);

    let theme = match options.theme {
        Theme::Peace => Some(("serene and peaceful atmosphere", "Added peace theme")),
        Theme::Hope => Some(("uplifting and hopeful mood", "Added hope theme")),
        Theme::Love => Some(("divine love radiating", "Added divine love theme")),
        Theme::Wisdom => Some(("profound spiritual wisdom", "Added wisdom theme")),
        Theme::Gratitude => Some(("grateful and blessed feeling", "Added gratitude theme")),
        Theme::Community => None,
    };
    push_clause(&mut additions, &mut notes, theme);

    if !has_light {
        push_clause(
            &mut additions,
            &mut notes,
            Some(("with divine light rays", "Added divine light elements")),
        );
    }

    if !has_camera {
        let camera = if options.style == VisualStyle::Cinematic {
            "with slow reverent camera movement"
        } else {
            "with steady contemplative camera"
        };
        push_clause(
            &mut additions,
            &mut notes,
            Some((camera, "Added appropriate camera movement")),
        );
    }

    let style = match options.style {
        VisualStyle::Cinematic if !lower.contains("cinematic") => Some((
            "cinematic quality",
            "Added cinematic quality specification",
        )),
        VisualStyle::Artistic if !lower.contains("artistic") => {
            Some(("artistic style", "Added artistic style specification"))
        }
        _ => None,
    };
    push_clause(&mut additions, &mut notes, style);

    additions.push(QUALITY_CLAUSE);

    let enhanced = join_clauses(prompt, &additions);
    notes.push(format!("Enhanced devotional prompt: \"{enhanced}\""));
    Enhancement {
        prompt: enhanced,
        notes,
    }
}

/// Broadens a conversation topic with standard discussion angles.
pub fn enhance_topic(topic: &str) -> Enhancement {
    let base = topic.trim();
    Enhancement {
        prompt: format!("{base}; {TOPIC_SUFFIX}"),
        notes: TOPIC_ASPECTS.iter().map(|aspect| aspect.to_string()).collect(),
    }
}

fn push_clause(
    additions: &mut Vec<&'static str>,
    notes: &mut Vec<String>,
    clause: Option<(&'static str, &'static str)>,
) {
    if let Some((text, note)) = clause {
        additions.push(text);
        notes.push(note.to_string());
    }
}

fn join_clauses(prompt: &str, additions: &[&str]) -> String {
    let mut enhanced = prompt
        .strip_suffix(|c| matches!(c, ',' | '.' | '!' | '?'))
        .unwrap_or(prompt)
        .to_string();
    enhanced.push_str(", ");
    enhanced.push_str(&additions.join(", "));
    if !enhanced.ends_with('.') {
        enhanced.push('.');
    }
    enhanced
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
