//! Greedy linear grouping of faces into people.
//!
//! Every incoming face is compared against the representative of each known
//! person, in creation order. A face that matches nobody starts a new person
//! and becomes its representative for the rest of the run.

use crate::compare::FaceComparator;
use crate::types::Embedding;
use std::path::{Path, PathBuf};

/// One discovered person and the photos they appear in.
#[derive(Debug, Clone)]
pub struct PersonGroup {
    /// Embedding of the face that created this group. Never updated.
    pub representative: Embedding,
    /// Photos in insertion order, without duplicates.
    pub photos: Vec<PathBuf>,
}

impl PersonGroup {
    fn add_photo(&mut self, photo: &Path) {
        if !self.photos.iter().any(|p| p == photo) {
            self.photos.push(photo.to_path_buf());
        }
    }
}

/// Outcome of assigning one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// The face matched these existing groups (ascending indices).
    Matched(Vec<usize>),
    /// The face matched nobody; a new group was created at this index.
    Created(usize),
}

/// Ordered collection of person groups, in creation order.
#[derive(Debug, Default)]
pub struct PersonGroups {
    groups: Vec<PersonGroup>,
}

impl PersonGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a face found in `photo`.
    ///
    /// The photo is added to every group whose representative the comparator
    /// accepts. If none does, a new group is created with this face as its
    /// representative.
    pub fn assign(
        &mut self,
        photo: &Path,
        face: &Embedding,
        comparator: &dyn FaceComparator,
    ) -> Assignment {
        let matches: Vec<usize> = self
            .groups
            .iter()
            .enumerate()
            .filter(|(_, g)| comparator.same_person(&g.representative, face))
            .map(|(i, _)| i)
            .collect();

        if matches.is_empty() {
            self.groups.push(PersonGroup {
                representative: face.clone(),
                photos: vec![photo.to_path_buf()],
            });
            let index = self.groups.len() - 1;
            tracing::debug!(photo = %photo.display(), person = index + 1, "new person");
            return Assignment::Created(index);
        }

        for &i in &matches {
            self.groups[i].add_photo(photo);
        }
        tracing::debug!(
            photo = %photo.display(),
            people = ?matches.iter().map(|i| i + 1).collect::<Vec<_>>(),
            "face matched"
        );
        Assignment::Matched(matches)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonGroup> {
        self.groups.iter()
    }

    pub fn into_groups(self) -> Vec<PersonGroup> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::CosineComparator;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::from_values(values.to_vec())
    }

    const CMP: CosineComparator = CosineComparator { threshold: 0.9 };

    #[test]
    fn test_first_face_creates_group() {
        let mut groups = PersonGroups::new();
        let a = groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0, 0.0]), &CMP);
        assert_eq!(a, Assignment::Created(0));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.iter().next().unwrap().photos, vec![PathBuf::from("a.jpg")]);
    }

    #[test]
    fn test_matching_face_joins_group() {
        let mut groups = PersonGroups::new();
        groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0, 0.0]), &CMP);
        let b = groups.assign(Path::new("b.jpg"), &emb(&[0.99, 0.05, 0.0]), &CMP);
        assert_eq!(b, Assignment::Matched(vec![0]));
        assert_eq!(groups.len(), 1);
        let photos = &groups.iter().next().unwrap().photos;
        assert_eq!(photos, &vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
    }

    #[test]
    fn test_distinct_faces_create_groups_in_order() {
        let mut groups = PersonGroups::new();
        groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0, 0.0]), &CMP);
        let b = groups.assign(Path::new("b.jpg"), &emb(&[0.0, 1.0, 0.0]), &CMP);
        let c = groups.assign(Path::new("c.jpg"), &emb(&[0.0, 0.0, 1.0]), &CMP);
        assert_eq!(b, Assignment::Created(1));
        assert_eq!(c, Assignment::Created(2));
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_face_matching_several_groups_joins_all() {
        // Two representatives 60 degrees apart, probe halfway between them.
        let cmp = CosineComparator { threshold: 0.8 };
        let mut groups = PersonGroups::new();
        groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0]), &cmp);
        groups.assign(Path::new("b.jpg"), &emb(&[0.5, 3.0f32.sqrt() / 2.0]), &cmp);
        assert_eq!(groups.len(), 2);

        let probe = emb(&[3.0f32.sqrt() / 2.0, 0.5]);
        let r = groups.assign(Path::new("c.jpg"), &probe, &cmp);
        assert_eq!(r, Assignment::Matched(vec![0, 1]));
        for g in groups.iter() {
            assert!(g.photos.contains(&PathBuf::from("c.jpg")));
        }
    }

    #[test]
    fn test_same_photo_listed_once_per_group() {
        let mut groups = PersonGroups::new();
        groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0]), &CMP);
        groups.assign(Path::new("b.jpg"), &emb(&[1.0, 0.01]), &CMP);
        groups.assign(Path::new("b.jpg"), &emb(&[1.0, 0.02]), &CMP);
        let photos = &groups.iter().next().unwrap().photos;
        assert_eq!(photos.len(), 2);
    }

    #[test]
    fn test_representative_is_not_updated() {
        // Chain a -> b -> c where each neighbour is close but a and c are not.
        let cmp = CosineComparator { threshold: 0.9 };
        let mut groups = PersonGroups::new();
        groups.assign(Path::new("a.jpg"), &emb(&[1.0, 0.0]), &cmp);
        // ~20 degrees from a: cos ≈ 0.94
        groups.assign(Path::new("b.jpg"), &emb(&[0.94, 0.342]), &cmp);
        // ~40 degrees from a: cos ≈ 0.77, but ~20 degrees from b
        let r = groups.assign(Path::new("c.jpg"), &emb(&[0.766, 0.643]), &cmp);
        assert_eq!(r, Assignment::Created(1));
        let first = groups.into_groups().remove(0);
        assert_eq!(first.representative.values, vec![1.0, 0.0]);
    }

    #[test]
    fn test_empty_groups() {
        let groups = PersonGroups::new();
        assert!(groups.is_empty());
        assert_eq!(groups.iter().count(), 0);
    }
}
