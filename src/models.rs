use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} option '{value}'")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

/// Fixed option set with a wire label and accepted aliases per variant.
macro_rules! option_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name { $($variant),+ }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self { $($name::$variant => $label),+ }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($label) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownOption { kind: stringify!($name), value: s.to_string() })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

option_set!(Length {
    Short => "Short",
    Medium => "Medium",
    Long => "Long",
});

option_set!(Shape {
    Square => "Square",
    Round => "Round",
    Almond => "Almond",
    Squoval => "Squoval",
    Pointed => "Pointed",
    Ballerina => "Ballerina",
});

option_set!(Style {
    ClassicFrench => "Classic French" | "French",
    Floral => "Floral",
    LineArt => "Line Art",
    Geometric => "Geometric",
    Ombre => "Ombre",
    Abstract => "Abstract",
    DotNails => "Dot Nails",
    Glitter => "Glitter",
});

option_set!(
    /// Palette strategy. `Select` means "derive from a custom base color" instead of a named strategy.
    ColorConfiguration {
        Select => "Select" | "Base Color Picker" | "Pick a Base Color",
        Monochromatic => "Monochromatic" | "Mono",
        Analogous => "Analogous",
        Complementary => "Complementary" | "Complimentary",
        Triad => "Triad",
        Tetradic => "Tetradic",
    }
);

/// Six hex digits, normalised to `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BaseColor(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid base color '{0}', expected #RRGGBB")]
pub struct InvalidBaseColor(pub String);

impl BaseColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BaseColor {
    type Err = InvalidBaseColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(BaseColor(format!("#{}", hex.to_ascii_uppercase())))
        } else {
            Err(InvalidBaseColor(s.to_string()))
        }
    }
}

impl fmt::Display for BaseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Generation wire types ---

/// What the model is asked to draw: structured attributes or a free-text prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DesignDescriptor {
    Attributes {
        length: Length,
        shape: Shape,
        style: Style,
        color: ColorConfiguration,
        #[serde(rename = "baseColor", skip_serializing_if = "Option::is_none")]
        base_color: Option<BaseColor>,
    },
    Prompt {
        prompt: String,
    },
}

/// Body of `POST /api/generate`. One per (selection, model) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    #[serde(flatten)]
    pub design: DesignDescriptor,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_images: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub limit_reached: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// --- Session / library types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Generated,
    SavePending,
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    pub model: String,
    pub state: SaveState,
}

impl GeneratedImage {
    pub fn new(model: &str, position: usize, url: String) -> Self {
        Self { id: format!("{model}-{position}"), url, model: model.to_string(), state: SaveState::Generated }
    }

    /// True from the moment a save is requested, matching what the save button shows.
    pub fn saved(&self) -> bool {
        !matches!(self.state, SaveState::Generated)
    }
}

impl Serialize for GeneratedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut image = serializer.serialize_struct("GeneratedImage", 5)?;
        image.serialize_field("id", &self.id)?;
        image.serialize_field("url", &self.url)?;
        image.serialize_field("model", &self.model)?;
        image.serialize_field("state", &self.state)?;
        image.serialize_field("saved", &self.saved())?;
        image.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDesignRequest {
    pub prompt: String,
    pub temporary_image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDesign {
    #[serde(rename = "_id")]
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    #[serde(default)]
    pub is_favorite: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn option_sets_accept_aliases() {
        assert_eq!("Mono".parse::<ColorConfiguration>().unwrap(), ColorConfiguration::Monochromatic);
        assert_eq!("Base Color Picker".parse::<ColorConfiguration>().unwrap(), ColorConfiguration::Select);
        assert_eq!("complimentary".parse::<ColorConfiguration>().unwrap(), ColorConfiguration::Complementary);
        assert_eq!("line art".parse::<Style>().unwrap(), Style::LineArt);
        let err = "Stiletto".parse::<Shape>().unwrap_err();
        assert_eq!(err.to_string(), "unknown Shape option 'Stiletto'");
    }

    #[test]
    fn base_color_normalises() {
        assert_eq!("ff00aa".parse::<BaseColor>().unwrap().as_str(), "#FF00AA");
        assert_eq!("#a1b2c3".parse::<BaseColor>().unwrap().as_str(), "#A1B2C3");
        assert!("#fff".parse::<BaseColor>().is_err());
        assert!("#gg0000".parse::<BaseColor>().is_err());
    }

    #[test]
    fn attribute_request_serialises_in_wire_order() {
        let request = GenerationRequest {
            design: DesignDescriptor::Attributes {
                length: Length::Short,
                shape: Shape::Square,
                style: Style::ClassicFrench,
                color: ColorConfiguration::Select,
                base_color: Some("#ffffff".parse().unwrap()),
            },
            model: "test-model".into(),
            width: Some(1024),
            height: Some(1024),
            num_images: Some(1),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r##"{"length":"Short","shape":"Square","style":"Classic French","color":"Select","baseColor":"#FFFFFF","model":"test-model","width":1024,"height":1024,"num_images":1}"##
        );
    }

    #[test]
    fn prompt_request_omits_unset_sizes() {
        let request = GenerationRequest {
            design: DesignDescriptor::Prompt { prompt: "Short Round nails with Floral style.".into() },
            model: "m".into(),
            width: None,
            height: None,
            num_images: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "prompt": "Short Round nails with Floral style.", "model": "m" })
        );
    }

    #[test]
    fn parses_rate_limited_response() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "limitReached": true,
            "message": "Daily limit reached",
            "imageUrls": ["https://cdn.example.com/placeholder.png"]
        }))
        .unwrap();
        assert!(parsed.limit_reached);
        assert_eq!(parsed.message.as_deref(), Some("Daily limit reached"));
        assert_eq!(parsed.image_urls.len(), 1);
    }

    #[test]
    fn parses_saved_design_record() {
        let design: SavedDesign = serde_json::from_value(json!({
            "_id": "abc123",
            "imageUrl": "https://cdn.example.com/a.png",
            "isFavorite": true,
            "createdAt": "2024-05-01T10:00:00.000Z",
            "userId": "ignored"
        }))
        .unwrap();
        assert_eq!(design.id, "abc123");
        assert!(design.is_favorite);
        assert_eq!(design.prompt, None);
    }

    #[test]
    fn generated_image_ids_combine_model_and_position() {
        let image = GeneratedImage::new("model-a", 0, "u".into());
        assert_eq!(image.id, "model-a-0");
        assert!(!image.saved());
    }

    #[test]
    fn generated_image_json_carries_saved_flag() {
        let mut image = GeneratedImage::new("model-a", 0, "https://img/a.png".into());
        assert_eq!(
            serde_json::to_value(&image).unwrap(),
            json!({ "id": "model-a-0", "url": "https://img/a.png", "model": "model-a", "state": "generated", "saved": false })
        );

        image.state = SaveState::SavePending;
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["state"], "save_pending");
        assert_eq!(value["saved"], true);
    }
}
