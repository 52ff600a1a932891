//! Encounter room templates
//!
//! Pre-authored room layouts stamped over encounter leaves. A template is a
//! text file of whitespace-separated tile codes, one grid row per line.
//! Code `0` becomes room floor, `3` becomes floor with a destructible box,
//! anything else is written as-is.

use std::fs;
use std::path::Path;

use rand::Rng;

use super::GenerationError;

/// Floor cell in a template
pub const FLOOR_MARKER: i32 = 0;
/// Floor cell that also spawns a destructible box
pub const BOX_MARKER: i32 = 3;

/// Number of templates in the built-in catalog
pub const TEMPLATE_COUNT: usize = 8;

const BUILTIN_TEMPLATES: [&str; TEMPLATE_COUNT] = [
    include_str!("../../../assets/rooms/room_0.txt"),
    include_str!("../../../assets/rooms/room_1.txt"),
    include_str!("../../../assets/rooms/room_2.txt"),
    include_str!("../../../assets/rooms/room_3.txt"),
    include_str!("../../../assets/rooms/room_4.txt"),
    include_str!("../../../assets/rooms/room_5.txt"),
    include_str!("../../../assets/rooms/room_6.txt"),
    include_str!("../../../assets/rooms/room_7.txt"),
];

/// A parsed room layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTemplate {
    pub width: i32,
    pub height: i32,
    rows: Vec<Vec<i32>>,
}

impl RoomTemplate {
    /// Parse a whitespace-delimited integer grid.
    ///
    /// Blank lines are skipped. Every row must have the same length.
    pub fn parse(text: &str) -> Result<Self, GenerationError> {
        let mut rows: Vec<Vec<i32>> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<i32>().map_err(|_| GenerationError::TemplateParse {
                        line: line_no + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(GenerationError::TemplateShape {
                        line: line_no + 1,
                        expected: first.len(),
                        found: row.len(),
                    });
                }
            }
            rows.push(row);
        }

        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.len() as i32);
        if width == 0 || height == 0 {
            return Err(GenerationError::TemplateShape { line: 0, expected: 1, found: 0 });
        }

        Ok(Self { width, height, rows })
    }

    /// Code at column `x`, row `y`
    pub fn cell(&self, x: i32, y: i32) -> i32 {
        self.rows[y as usize][x as usize]
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Positions of every cell carrying `code`
    pub fn find(&self, code: i32) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, &c) in row.iter().enumerate() {
                if c == code {
                    out.push((x as i32, y as i32));
                }
            }
        }
        out
    }
}

/// Indexed set of encounter room templates
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<RoomTemplate>,
}

impl TemplateCatalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, GenerationError> {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|text| RoomTemplate::parse(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    /// Built-in catalog with `room_N.txt` files from `dir` replacing entries by index
    pub fn load_dir(dir: &Path) -> Result<Self, GenerationError> {
        let mut catalog = Self::builtin()?;
        for index in 0..catalog.templates.len() {
            let path = dir.join(format!("room_{}.txt", index));
            if !path.exists() {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            catalog.templates[index] = RoomTemplate::parse(&text)?;
            log::debug!("Loaded room template override {}", path.display());
        }
        Ok(catalog)
    }

    pub fn from_templates(templates: Vec<RoomTemplate>) -> Self {
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&RoomTemplate, GenerationError> {
        self.templates
            .get(index)
            .ok_or(GenerationError::TemplateNotFound { index })
    }

    /// Uniformly pick a template index
    pub fn pick_index(&self, rng: &mut impl Rng) -> usize {
        (rng.gen::<f32>() * self.templates.len() as f32) as usize
    }
}
