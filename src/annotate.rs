//! Page annotation: underline and highlight a word, attach its definition

use crate::error::Result;

/// Axis-aligned rectangle in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Bounds {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }
}

/// A rendered character and where it sits on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bounds: Bounds,
}

/// Find the first occurrence of `needle` in a glyph run, ignoring ASCII case.
///
/// Returns the union of the matched glyph boxes.
pub fn locate_in_glyphs(glyphs: &[Glyph], needle: &str) -> Option<Bounds> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || needle.len() > glyphs.len() {
        return None;
    }

    glyphs
        .windows(needle.len())
        .find(|window| {
            window
                .iter()
                .zip(&needle)
                .all(|(glyph, c)| glyph.ch.eq_ignore_ascii_case(c))
        })
        .and_then(|window| {
            let (first, rest) = window.split_first()?;
            Some(rest.iter().fold(first.bounds, |acc, g| acc.union(&g.bounds)))
        })
}

/// RGBA colour, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Color = Color::opaque(0, 0, 0);

    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }
}

/// Popup note attached to a highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub body: String,
}

/// Page that can be searched visually and marked up
pub trait AnnotatablePage {
    /// Bounding box of the first visual occurrence of `needle`
    fn locate(&self, needle: &str) -> Option<Bounds>;

    fn add_underline(&mut self, bounds: Bounds, stroke: Color) -> Result<()>;

    fn add_highlight(&mut self, bounds: Bounds, color: Color, note: &Note) -> Result<()>;
}

impl<P: AnnotatablePage + ?Sized> AnnotatablePage for &mut P {
    fn locate(&self, needle: &str) -> Option<Bounds> {
        (**self).locate(needle)
    }

    fn add_underline(&mut self, bounds: Bounds, stroke: Color) -> Result<()> {
        (**self).add_underline(bounds, stroke)
    }

    fn add_highlight(&mut self, bounds: Bounds, color: Color, note: &Note) -> Result<()> {
        (**self).add_highlight(bounds, color, note)
    }
}

/// What happened to one word on one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationOutcome {
    /// Underline and highlight were added over these bounds
    Applied(Bounds),
    /// Word is in the text layer but could not be found visually
    NotLocated,
    /// Nothing to attach
    EmptyDefinition,
}

/// Colours and note title used for every annotation
#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    pub underline: Color,
    pub highlight: Color,
    pub note_title: String,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            underline: Color::BLACK,
            highlight: Color::opaque(255, 242, 153),
            note_title: "Meaning".to_string(),
        }
    }
}

/// Marks a word and attaches its definition
#[derive(Debug, Clone, Default)]
pub struct PageAnnotator {
    style: AnnotationStyle,
}

impl PageAnnotator {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    /// Annotate the first visual occurrence of `word` on `page`.
    ///
    /// Later occurrences are left alone. The page is untouched unless the
    /// outcome is `Applied`.
    pub fn annotate<P>(&self, page: &mut P, word: &str, definition: &str) -> Result<AnnotationOutcome>
    where
        P: AnnotatablePage + ?Sized,
    {
        if definition.trim().is_empty() {
            return Ok(AnnotationOutcome::EmptyDefinition);
        }

        let Some(bounds) = page.locate(word) else {
            return Ok(AnnotationOutcome::NotLocated);
        };

        page.add_underline(bounds, self.style.underline)?;
        page.add_highlight(
            bounds,
            self.style.highlight,
            &Note {
                title: self.style.note_title.clone(),
                body: definition.to_string(),
            },
        )?;

        Ok(AnnotationOutcome::Applied(bounds))
    }
}
