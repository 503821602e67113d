use std::collections::HashMap;

/// Entity to preferred-label mapping supplied by the projection builder
///
/// Entities iterate in first-insertion order and each entity's labels in
/// first-insertion order, so the `uri_labels.txt` written from a projection
/// is reproducible. A label repeated for the same entity is kept once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelProjection {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl LabelProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label for an entity. Returns `false` if it was already present.
    pub fn insert(&mut self, entity: impl Into<String>, label: impl Into<String>) -> bool {
        let entity = entity.into();
        let label = label.into();
        let slot = match self.index.get(&entity) {
            Some(&slot) => slot,
            None => {
                self.entries.push((entity.clone(), Vec::new()));
                self.index.insert(entity, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let labels = &mut self.entries[slot].1;
        if labels.contains(&label) {
            return false;
        }
        labels.push(label);
        true
    }

    pub fn labels(&self, entity: &str) -> Option<&[String]> {
        self.index
            .get(entity)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(entity, _)| entity.as_str())
    }

    /// Every (entity, label) pair, entities first then labels, in order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(entity, labels)| {
            labels
                .iter()
                .map(move |label| (entity.as_str(), label.as_str()))
        })
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E, L> FromIterator<(E, L)> for LabelProjection
where
    E: Into<String>,
    L: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (E, L)>>(iter: I) -> Self {
        let mut projection = Self::new();
        for (entity, label) in iter {
            projection.insert(entity, label);
        }
        projection
    }
}
