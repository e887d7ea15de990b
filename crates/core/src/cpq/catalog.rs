use std::collections::BTreeMap;

use crate::domain::catalog::{CatalogAttribute, CatalogEntry, MeasurementMode};

/// Result of narrowing the catalog with the answers collected so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Narrowing {
    Resolved(CatalogEntry),
    NextAttribute { attribute: CatalogAttribute, options: Vec<String> },
    /// More than one candidate remains and no unanswered attribute distinguishes them.
    Ambiguous(Vec<CatalogEntry>),
    Empty,
}

/// Progressive menu generator over a read-only snapshot of the catalog table.
#[derive(Clone, Debug, Default)]
pub struct CatalogFilter {
    entries: Vec<CatalogEntry>,
}

impl CatalogFilter {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Distinct first-level values for the measurement mode, in table order.
    pub fn initial_options(&self, mode: MeasurementMode) -> Vec<String> {
        let candidates: Vec<&CatalogEntry> =
            self.entries.iter().filter(|entry| entry.measurement_mode == mode).collect();
        distinct_values(&candidates, CatalogAttribute::Category)
    }

    pub fn narrow(
        &self,
        mode: MeasurementMode,
        answers: &BTreeMap<CatalogAttribute, String>,
    ) -> Narrowing {
        let candidates: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.measurement_mode == mode)
            .filter(|entry| {
                answers
                    .iter()
                    .all(|(attribute, value)| entry.attribute(*attribute) == Some(value.as_str()))
            })
            .collect();

        match candidates.as_slice() {
            [] => return Narrowing::Empty,
            [single] => return Narrowing::Resolved((*single).clone()),
            _ => {}
        }

        let next = CatalogAttribute::ORDER
            .iter()
            .filter(|attribute| !answers.contains_key(*attribute))
            .find_map(|attribute| {
                let options = distinct_values(&candidates, *attribute);
                (!options.is_empty()).then_some((*attribute, options))
            });

        match next {
            Some((attribute, options)) => Narrowing::NextAttribute { attribute, options },
            None => Narrowing::Ambiguous(candidates.into_iter().cloned().collect()),
        }
    }

    /// Same as [`CatalogFilter::narrow`] but resolves ties to the first remaining candidate.
    pub fn narrow_auto(
        &self,
        mode: MeasurementMode,
        answers: &BTreeMap<CatalogAttribute, String>,
    ) -> Narrowing {
        match self.narrow(mode, answers) {
            Narrowing::Ambiguous(candidates) => candidates
                .into_iter()
                .next()
                .map(Narrowing::Resolved)
                .unwrap_or(Narrowing::Empty),
            other => other,
        }
    }
}

fn distinct_values(candidates: &[&CatalogEntry], attribute: CatalogAttribute) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for value in candidates.iter().filter_map(|entry| entry.attribute(attribute)) {
        if !values.iter().any(|seen| seen == value) {
            values.push(value.to_string());
        }
    }
    values
}
