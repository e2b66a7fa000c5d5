use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{ReelError, ReelResult};

/// Scene length used when a script omits `durationSeconds` or gives a non-positive one.
pub const DEFAULT_SCENE_SECONDS: f64 = 5.0;

/// Fields the model does not interpret; kept so they survive a parse/serialize cycle.
pub type Extra = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub id: String,
    pub scenes: Vec<Scene>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub id: String,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub title: String,
    #[serde(default, alias = "duration", deserialize_with = "de_duration")]
    pub duration_seconds: f64,
    #[serde(
        default,
        alias = "narration",
        skip_serializing_if = "Option::is_none"
    )]
    pub voiceover: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleElement {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_rect_width")]
    pub width: f64,
    #[serde(default = "default_rect_height")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleElement {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Geometry shared by `line` and `arrow` elements.
///
/// Endpoints fall back to `(x, y)` and `(x + 100, y + 100)` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LineRepr")]
pub struct LineElement {
    pub x: f64,
    pub y: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineRepr {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    x1: Option<f64>,
    y1: Option<f64>,
    x2: Option<f64>,
    y2: Option<f64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    stroke_width: Option<f64>,
    #[serde(flatten)]
    extra: Extra,
}

impl From<LineRepr> for LineElement {
    fn from(r: LineRepr) -> Self {
        Self {
            x1: r.x1.unwrap_or(r.x),
            y1: r.y1.unwrap_or(r.y),
            x2: r.x2.unwrap_or(r.x + DEFAULT_LINE_SPAN),
            y2: r.y2.unwrap_or(r.y + DEFAULT_LINE_SPAN),
            x: r.x,
            y: r.y,
            color: r.color,
            stroke_width: r.stroke_width,
            extra: r.extra,
        }
    }
}

const DEFAULT_LINE_SPAN: f64 = 100.0;

fn default_font_size() -> f64 {
    24.0
}

fn default_rect_width() -> f64 {
    150.0
}

fn default_rect_height() -> f64 {
    100.0
}

fn default_radius() -> f64 {
    50.0
}

/// One drawable primitive. Elements have no identity beyond their index within a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextElement),
    Rectangle(RectangleElement),
    Circle(CircleElement),
    Line(LineElement),
    Arrow(LineElement),
    /// A variant this crate does not know; kept verbatim and drawn as nothing.
    Unknown(Value),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedElement {
    Text(TextElement),
    Rectangle(RectangleElement),
    Circle(CircleElement),
    Line(LineElement),
    Arrow(LineElement),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedElementRef<'a> {
    Text(&'a TextElement),
    Rectangle(&'a RectangleElement),
    Circle(&'a CircleElement),
    Line(&'a LineElement),
    Arrow(&'a LineElement),
}

const KNOWN_ELEMENT_KINDS: [&str; 5] = ["text", "rectangle", "circle", "line", "arrow"];

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let known = raw
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|k| KNOWN_ELEMENT_KINDS.contains(&k));
        if !known {
            return Ok(Self::Unknown(raw));
        }

        let tagged = TaggedElement::deserialize(raw).map_err(serde::de::Error::custom)?;
        Ok(match tagged {
            TaggedElement::Text(e) => Self::Text(e),
            TaggedElement::Rectangle(e) => Self::Rectangle(e),
            TaggedElement::Circle(e) => Self::Circle(e),
            TaggedElement::Line(e) => Self::Line(e),
            TaggedElement::Arrow(e) => Self::Arrow(e),
        })
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Text(e) => TaggedElementRef::Text(e).serialize(serializer),
            Self::Rectangle(e) => TaggedElementRef::Rectangle(e).serialize(serializer),
            Self::Circle(e) => TaggedElementRef::Circle(e).serialize(serializer),
            Self::Line(e) => TaggedElementRef::Line(e).serialize(serializer),
            Self::Arrow(e) => TaggedElementRef::Arrow(e).serialize(serializer),
            Self::Unknown(raw) => raw.serialize(serializer),
        }
    }
}

impl Element {
    /// The `type` discriminant as written in the script.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Rectangle(_) => "rectangle",
            Self::Circle(_) => "circle",
            Self::Line(_) => "line",
            Self::Arrow(_) => "arrow",
            Self::Unknown(raw) => raw.get("type").and_then(Value::as_str).unwrap_or(""),
        }
    }

    /// Axis-aligned bounds in canvas pixels; `None` for elements that draw nothing.
    ///
    /// Text bounds are estimated from the glyph count at a 0.6 em average advance.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Text(t) => {
                let w = t.content.chars().count() as f64 * t.font_size * 0.6;
                Some(Rect::new(t.x, t.y, t.x + w, t.y + t.font_size))
            }
            Self::Rectangle(r) => Some(Rect::new(r.x, r.y, r.x + r.width, r.y + r.height)),
            Self::Circle(c) => Some(Rect::new(
                c.x,
                c.y,
                c.x + 2.0 * c.radius,
                c.y + 2.0 * c.radius,
            )),
            Self::Line(l) | Self::Arrow(l) => Some(Rect::from_points(
                Point::new(l.x1, l.y1),
                Point::new(l.x2, l.y2),
            )),
            Self::Unknown(_) => None,
        }
    }
}

impl Scene {
    pub fn narration(&self) -> Option<&str> {
        self.voiceover
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Script {
    /// Parse and normalize a script JSON document.
    pub fn parse(raw: &str) -> ReelResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ReelError::validation(format!("script is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Read a script file; its stem becomes the id when the document has none.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("open script '{}'", path.display()))?;
        let mut script = Self::parse(&raw)?;
        if script.id == DEFAULT_SCRIPT_ID
            && let Some(stem) = path.file_stem()
        {
            script.id = stem.to_string_lossy().into_owned();
        }
        Ok(script)
    }

    pub fn from_value(value: Value) -> ReelResult<Self> {
        let Some(obj) = value.as_object() else {
            return Err(ReelError::validation("script must be a JSON object"));
        };
        match obj.get("scenes") {
            Some(Value::Array(scenes)) if scenes.is_empty() => {
                return Err(ReelError::validation("script has no scenes"));
            }
            Some(Value::Array(_)) => {}
            Some(_) => return Err(ReelError::validation("'scenes' must be an array")),
            None => return Err(ReelError::validation("script is missing 'scenes'")),
        }

        let mut script: Script = serde_json::from_value(value)
            .map_err(|e| ReelError::validation(format!("invalid script: {e}")))?;
        script.normalize()?;
        Ok(script)
    }

    fn normalize(&mut self) -> ReelResult<()> {
        if self.id.trim().is_empty() {
            self.id = DEFAULT_SCRIPT_ID.to_string();
        }

        let mut seen = BTreeSet::new();
        for (index, scene) in self.scenes.iter_mut().enumerate() {
            let n = index + 1;
            if scene.id.trim().is_empty() {
                scene.id = format!("scene{n}");
            }
            if scene.title.trim().is_empty() {
                scene.title = format!("Scene {n}");
            }
            if !(scene.duration_seconds.is_finite() && scene.duration_seconds > 0.0) {
                scene.duration_seconds = DEFAULT_SCENE_SECONDS;
            }
            if !seen.insert(scene.id.clone()) {
                return Err(ReelError::validation(format!(
                    "duplicate scene id '{}'",
                    scene.id
                )));
            }
        }
        Ok(())
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_seconds).sum()
    }

    /// All scene narration joined in script order, for single-track synthesis.
    pub fn narration_text(&self) -> Option<String> {
        let parts: Vec<&str> = self.scenes.iter().filter_map(Scene::narration).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn to_json_pretty(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::serde(e.to_string()))
    }
}

const DEFAULT_SCRIPT_ID: &str = "script";

fn de_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    // Absent, null and non-positive durations are all replaced during normalization.
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn de_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "../../tests/unit/script/model.rs"]
mod tests;
