//! Solver deck documents and their shared text conventions

use minijinja::Environment;
use serde::Serialize;

use crate::allocate::NamePattern;
use crate::error::Result;

/// Which solver a deck is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFormat {
    /// FastHenry inductance deck: nodes and elements
    FastHenry,
    /// FasterCap 3-D deck: triangle patches
    FasterCap3d,
    /// FasterCap 2-D deck: segments grouped in file blocks
    FasterCap2d,
}

impl DeckFormat {
    pub fn name_pattern(&self) -> NamePattern {
        match self {
            DeckFormat::FastHenry => NamePattern::Numbered,
            DeckFormat::FasterCap3d | DeckFormat::FasterCap2d => NamePattern::FasterCap,
        }
    }

    fn template_name(&self) -> &'static str {
        match self {
            DeckFormat::FastHenry => "fasthenry",
            DeckFormat::FasterCap3d => "fastercap3d",
            DeckFormat::FasterCap2d => "fastercap2d",
        }
    }
}

/// A rendered deck: header block followed by one line per primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    format: DeckFormat,
    text: String,
}

impl Deck {
    pub fn format(&self) -> DeckFormat {
        self.format
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Render `source` with `ctx`; numbers in `ctx` must already be formatted
    pub(crate) fn render<S: Serialize>(format: DeckFormat, source: &'static str, ctx: S) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template(format.template_name(), source)?;

        let template = env.get_template(format.template_name())?;
        let text = template.render(ctx)?;
        Ok(Self { format, text })
    }
}

/// Shortest decimal that reads back to the same value (`2.0`, `0.1`)
pub fn natural(value: f64) -> String {
    format!("{:?}", value)
}

/// Four fixed decimal places (`1.0000`)
pub fn fixed4(value: f64) -> String {
    format!("{:.4}", value)
}

/// Rounded to four decimals, then printed in natural form (`1.0`, `0.1235`)
pub fn rounded4(value: f64) -> String {
    natural(fixed4(value).parse().unwrap_or(value))
}
