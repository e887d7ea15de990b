use crate::domain::material::MaterialEntry;

/// Colour, thickness and treatment menus over a read-only snapshot of the material table.
#[derive(Clone, Debug, Default)]
pub struct MaterialFilter {
    materials: Vec<MaterialEntry>,
}

impl MaterialFilter {
    pub fn new(materials: Vec<MaterialEntry>) -> Self {
        Self { materials }
    }

    pub fn colors(&self) -> Vec<String> {
        distinct(self.materials.iter().map(|material| material.color.as_str()))
    }

    pub fn thicknesses(&self, color: &str) -> Vec<String> {
        distinct(
            self.materials
                .iter()
                .filter(|material| material.color.trim() == color)
                .map(|material| material.thickness.as_str()),
        )
    }

    pub fn treatments(&self, color: &str, thickness: &str) -> Vec<String> {
        distinct(
            self.materials
                .iter()
                .filter(|material| {
                    material.color.trim() == color && material.thickness.trim() == thickness
                })
                .map(|material| material.treatment.as_str()),
        )
    }

    /// First material row matching all three choices.
    pub fn resolve(&self, color: &str, thickness: &str, treatment: &str) -> Option<MaterialEntry> {
        self.materials
            .iter()
            .find(|material| {
                material.color.trim() == color
                    && material.thickness.trim() == thickness
                    && material.treatment.trim() == treatment
            })
            .cloned()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values.map(str::trim).filter(|value| !value.is_empty()) {
        if !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
