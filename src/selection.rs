//! Attribute selection state and the request builder that reads it.

use serde::Serialize;

use crate::{
    config::{ImageDefaults, RequestSchema},
    models::{BaseColor, ColorConfiguration, DesignDescriptor, GenerationRequest, Length, Shape, Style},
};

/// Which selector row is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Length,
    Shape,
    Style,
    Color,
}

/// The user's in-progress choices. Pure state, no I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    length: Option<Length>,
    shape: Option<Shape>,
    style: Option<Style>,
    color: Option<ColorConfiguration>,
    base_color: Option<BaseColor>,
    active: Section,
}

impl AttributeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_section(&self) -> Section {
        self.active
    }

    pub fn length(&self) -> Option<Length> {
        self.length
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    pub fn style(&self) -> Option<Style> {
        self.style
    }

    pub fn color(&self) -> Option<ColorConfiguration> {
        self.color
    }

    pub fn base_color(&self) -> Option<&BaseColor> {
        self.base_color.as_ref()
    }

    pub fn select_length(&mut self, length: Length) {
        self.length = Some(length);
        self.active = Section::Shape;
    }

    pub fn select_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
        self.active = Section::Style;
    }

    pub fn select_style(&mut self, style: Style) {
        self.style = Some(style);
        self.active = Section::Color;
    }

    /// Last section; the cursor stays on Color.
    pub fn select_color(&mut self, color: ColorConfiguration) {
        self.color = Some(color);
        self.active = Section::Color;
    }

    pub fn set_base_color(&mut self, base_color: Option<BaseColor>) {
        self.base_color = base_color;
    }

    /// "Start over": clears every field and the cursor.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the generate action is enabled.
    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }

    pub fn complete(&self) -> Option<CompleteSelection> {
        let color = self.color?;
        let base_color = match color {
            ColorConfiguration::Select => Some(self.base_color.clone()?),
            _ => self.base_color.clone(),
        };
        Some(CompleteSelection {
            length: self.length?,
            shape: self.shape?,
            style: self.style?,
            color,
            base_color,
        })
    }
}

/// A selection that satisfies the generate precondition. Only obtainable via
/// [`AttributeSelection::complete`], so the builder never sees partial input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteSelection {
    pub length: Length,
    pub shape: Shape,
    pub style: Style,
    pub color: ColorConfiguration,
    pub base_color: Option<BaseColor>,
}

impl CompleteSelection {
    /// Human-readable summary stored with a saved design (and sent as the legacy prompt).
    pub fn describe(&self) -> String {
        let mut text = format!("{} {} nails with {} style", self.length, self.shape, self.style);
        if self.color != ColorConfiguration::Select {
            text.push_str(&format!(" in {} colors", self.color));
        }
        if let Some(base) = &self.base_color {
            text.push_str(&format!(" using {base} as base color"));
        }
        text.push('.');
        text
    }
}

/// Turns a complete selection into per-model generation bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder {
    schema: RequestSchema,
    image: ImageDefaults,
}

impl RequestBuilder {
    pub fn new(schema: RequestSchema, image: ImageDefaults) -> Self {
        Self { schema, image }
    }

    pub fn build(&self, selection: &CompleteSelection, model: &str) -> GenerationRequest {
        let design = match self.schema {
            RequestSchema::Attributes => DesignDescriptor::Attributes {
                length: selection.length,
                shape: selection.shape,
                style: selection.style,
                color: selection.color,
                base_color: selection.base_color.clone(),
            },
            RequestSchema::Prompt => DesignDescriptor::Prompt { prompt: selection.describe() },
        };
        GenerationRequest {
            design,
            model: model.to_string(),
            width: Some(self.image.width),
            height: Some(self.image.height),
            num_images: Some(self.image.num_images),
        }
    }
}
