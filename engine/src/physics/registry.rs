//! Body registry
//!
//! Exclusive owner of every [`Body`] record. Bodies are kept in a contiguous
//! vector so the integrator can run over a plain slice; an id→index map gives
//! constant-time lookups. Ids are handed out from a monotonically increasing
//! counter and never reused, so a stale id held elsewhere can only ever miss,
//! never alias a different body.

use std::collections::HashMap;

use super::body::{Body, BodyId, BodySpec};
use crate::error::SimError;

#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: Vec<Body>,
    index: HashMap<BodyId, usize>,
    next_id: u32,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body. Fails with `InvalidSpec` on missing/negative mass or
    /// non-positive radius.
    pub fn add_body(&mut self, spec: BodySpec) -> Result<BodyId, SimError> {
        let mass = spec.validate()?;
        let id = BodyId(self.next_id);
        self.next_id += 1;

        self.index.insert(id, self.bodies.len());
        self.bodies.push(spec.into_body(id, mass));
        Ok(id)
    }

    /// Remove a body immediately. Callers holding the id must drop it.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, SimError> {
        let slot = self.index.remove(&id).ok_or(SimError::NotFound(id))?;
        let removed = self.bodies.remove(slot);
        for body in &self.bodies[slot..] {
            if let Some(i) = self.index.get_mut(&body.id) {
                *i -= 1;
            }
        }
        Ok(removed)
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.index.get(&id).map(|&i| &self.bodies[i])
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index.get(&id).map(|&i| &mut self.bodies[i])
    }

    /// Like [`get_body`](Self::get_body) but reports `NotFound`.
    pub fn body(&self, id: BodyId) -> Result<&Body, SimError> {
        self.get_body(id).ok_or(SimError::NotFound(id))
    }

    /// Like [`get_body_mut`](Self::get_body_mut) but reports `NotFound`.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, SimError> {
        self.get_body_mut(id).ok_or(SimError::NotFound(id))
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index.contains_key(&id)
    }

    /// Visit every body in registration order.
    pub fn for_each<F: FnMut(&Body)>(&self, f: F) {
        self.bodies.iter().for_each(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    /// All bodies as a slice, in registration order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Mutable slice for the integrator and contact resolver.
    ///
    /// Ids must not be edited through this slice.
    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_add_and_get() {
        let mut reg = BodyRegistry::new();
        let id = reg
            .add_body(BodySpec::massive("Terra", 1000.0, 50.0).at(DVec3::X))
            .unwrap();
        let body = reg.get_body(id).unwrap();
        assert_eq!(body.name, "Terra");
        assert_eq!(body.position, DVec3::X);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_spec() {
        let mut reg = BodyRegistry::new();
        assert!(matches!(
            reg.add_body(BodySpec::prop("bad", -1.0, 1.0)),
            Err(SimError::InvalidSpec(_))
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut reg = BodyRegistry::new();
        let a = reg.add_body(BodySpec::prop("a", 1.0, 1.0)).unwrap();
        reg.remove_body(a).unwrap();
        let b = reg.add_body(BodySpec::prop("b", 1.0, 1.0)).unwrap();
        assert_ne!(a, b);
        assert!(reg.get_body(a).is_none());
    }

    #[test]
    fn test_remove_keeps_lookup_consistent() {
        let mut reg = BodyRegistry::new();
        let a = reg.add_body(BodySpec::prop("a", 1.0, 1.0)).unwrap();
        let b = reg.add_body(BodySpec::prop("b", 2.0, 1.0)).unwrap();
        let c = reg.add_body(BodySpec::prop("c", 3.0, 1.0)).unwrap();

        let removed = reg.remove_body(a).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(reg.get_body(b).unwrap().name, "b");
        assert_eq!(reg.get_body(c).unwrap().name, "c");
        assert_eq!(reg.bodies()[0].id, b);
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let mut reg = BodyRegistry::new();
        let err = reg.remove_body(BodyId(42)).unwrap_err();
        assert!(matches!(err, SimError::NotFound(BodyId(42))));
    }

    #[test]
    fn test_for_each_visits_in_order() {
        let mut reg = BodyRegistry::new();
        for name in ["x", "y", "z"] {
            reg.add_body(BodySpec::prop(name, 1.0, 1.0)).unwrap();
        }
        let mut names = Vec::new();
        reg.for_each(|b| names.push(b.name.clone()));
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(reg.total_mass(), 3.0);
    }
}
