//! Parameter space: resolves a parsed model definition into a flat
//! optimisation vector, the section list it drives, and the alias/bounds
//! bookkeeping needed to report per-slot uncertainties afterward.
//!
//! Every parameter slot is given a synthetic, globally unique identifier —
//! `<section>.R` for a section's resolving power, `<section>.<line>.<k>`
//! for the k-th parameter of a line — and an alias record's `=<id>` names
//! exactly one of these. This is the concrete addressing scheme implied
//! by, but not spelled out in, the model format's alias syntax.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::model_io::{self, ModelDefinition, SlotRecord};
use crate::section::{LineSpec, ProfileKind, Section};

#[derive(Debug, Clone)]
pub struct Slot {
    pub id: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub free: bool,
    pub optimization_index: Option<usize>,
    pub uncertainty: f64,
}

pub struct ParameterSpace {
    slots: Vec<Slot>,
    sections: Vec<Section>,
    parameter_count: usize,
}

struct RawSlot {
    id: String,
    record: SlotRecord,
}

impl ParameterSpace {
    /// Build a parameter space from a parsed model definition, loading
    /// each section's data file relative to `base_dir` (the directory the
    /// model file itself lives in, or `None` for the current directory).
    pub fn build(definition: ModelDefinition, profile_kind: ProfileKind, base_dir: Option<&Path>) -> ModelResult<ParameterSpace> {
        let mut raw: Vec<RawSlot> = Vec::new();
        let mut id_index: HashMap<String, usize> = HashMap::new();

        struct PendingSection {
            id: String,
            data_file: String,
            lambda_min: f64,
            lambda_max: f64,
            continuum_order: usize,
            exclusions: Vec<(f64, f64)>,
            resolution_slot: usize,
            lines: Vec<(String, Vec<usize>)>,
        }

        fn register(id: String, record: SlotRecord, raw: &mut Vec<RawSlot>, id_index: &mut HashMap<String, usize>) -> ModelResult<usize> {
            if id_index.contains_key(&id) {
                return Err(ModelError::InvalidModel(format!("duplicate parameter slot id '{id}'")));
            }
            raw.push(RawSlot { id: id.clone(), record });
            let idx = raw.len() - 1;
            id_index.insert(id, idx);
            Ok(idx)
        }

        let mut pending_sections = Vec::with_capacity(definition.sections.len());
        for sec in &definition.sections {
            let resolution_slot = register(format!("{}.R", sec.id), sec.resolution.clone(), &mut raw, &mut id_index)?;

            let mut lines = Vec::with_capacity(sec.lines.len());
            for line in &sec.lines {
                if line.slots.len() != profile_kind.arity() {
                    return Err(ModelError::InvalidModel(format!(
                        "section '{}', line '{}': expected {} parameter slots for this profile, found {}",
                        sec.id,
                        line.id,
                        profile_kind.arity(),
                        line.slots.len()
                    )));
                }
                let mut slot_indices = Vec::with_capacity(line.slots.len());
                for (k, record) in line.slots.iter().enumerate() {
                    let idx = register(format!("{}.{}.{}", sec.id, line.id, k), record.clone(), &mut raw, &mut id_index)?;
                    slot_indices.push(idx);
                }
                lines.push((line.id.clone(), slot_indices));
            }

            pending_sections.push(PendingSection {
                id: sec.id.clone(),
                data_file: sec.data_file.clone(),
                lambda_min: sec.lambda_min,
                lambda_max: sec.lambda_max,
                continuum_order: sec.continuum_order,
                exclusions: sec.exclusion_intervals.clone(),
                resolution_slot,
                lines,
            });
        }

        // Step 2: assign consecutive optimisation indices to free, non-aliased slots.
        let mut slots = Vec::with_capacity(raw.len());
        let mut alias_targets: HashMap<usize, String> = HashMap::new();
        let mut next_index = 0usize;
        for r in &raw {
            match &r.record {
                SlotRecord::Free { value, lower, upper } => {
                    slots.push(Slot {
                        id: r.id.clone(),
                        value: *value,
                        lower: *lower,
                        upper: *upper,
                        free: true,
                        optimization_index: Some(next_index),
                        uncertainty: 0.0,
                    });
                    next_index += 1;
                }
                SlotRecord::Fixed { value } => {
                    slots.push(Slot { id: r.id.clone(), value: *value, lower: 0.0, upper: 0.0, free: false, optimization_index: None, uncertainty: 0.0 });
                }
                SlotRecord::Alias { target } => {
                    alias_targets.insert(slots.len(), target.clone());
                    slots.push(Slot { id: r.id.clone(), value: 0.0, lower: 0.0, upper: 0.0, free: false, optimization_index: None, uncertainty: 0.0 });
                }
            }
        }
        let parameter_count = next_index;

        // Step 3: walk each alias chain to its terminal slot.
        for i in 0..slots.len() {
            if let Some(target) = alias_targets.get(&i).cloned() {
                let mut visited = vec![i];
                let terminal = resolve_alias_chain(&target, &id_index, &alias_targets, &mut visited)?;
                let (value, lower, upper, free, optimization_index) =
                    (slots[terminal].value, slots[terminal].lower, slots[terminal].upper, slots[terminal].free, slots[terminal].optimization_index);
                let s = &mut slots[i];
                s.value = value;
                s.lower = lower;
                s.upper = upper;
                s.free = free;
                s.optimization_index = optimization_index;
            }
        }

        // Build sections now that every slot has its resolved bounds and index.
        let mut sections = Vec::with_capacity(pending_sections.len());
        for p in pending_sections {
            let data_path = match base_dir {
                Some(dir) => dir.join(&p.data_file),
                None => Path::new(&p.data_file).to_path_buf(),
            };
            let data = model_io::load_data_file(&data_path, p.lambda_min, p.lambda_max, &p.exclusions)?;
            let lines = p
                .lines
                .into_iter()
                .map(|(id, slot_indices)| LineSpec { id, kind: profile_kind, slots: slot_indices })
                .collect();
            sections.push(Section::new(p.id, data.wavelength, data.flux, data.uncertainty, data.mask, p.continuum_order, p.resolution_slot, lines)?);
        }

        Ok(ParameterSpace { slots, sections, parameter_count })
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn representative_slots(&self) -> Vec<usize> {
        let mut reps = vec![usize::MAX; self.parameter_count];
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(oi) = slot.optimization_index {
                if reps[oi] == usize::MAX {
                    reps[oi] = i;
                }
            }
        }
        reps
    }

    pub fn initial_values(&self) -> Vec<f64> {
        self.representative_slots().iter().map(|&i| 0.5 * (self.slots[i].lower + self.slots[i].upper)).collect()
    }

    pub fn initial_step_sizes(&self) -> Vec<f64> {
        self.representative_slots().iter().map(|&i| 0.5 * (self.slots[i].upper - self.slots[i].lower)).collect()
    }

    pub fn constraint(&self) -> (Vec<f64>, Vec<f64>) {
        let reps = self.representative_slots();
        let lower = reps.iter().map(|&i| self.slots[i].lower).collect();
        let upper = reps.iter().map(|&i| self.slots[i].upper).collect();
        (lower, upper)
    }

    fn effective_values(&self, x: &[f64]) -> Vec<f64> {
        self.slots.iter().map(|slot| slot.optimization_index.map(|i| x[i]).unwrap_or(slot.value)).collect()
    }

    pub fn cost(&self, x: &[f64]) -> f64 {
        let values = self.effective_values(x);
        self.sections.iter().map(|s| s.cost(&values)).sum()
    }

    /// Substitute `x` for the free slots, apply each section, and store
    /// per-slot uncertainties from `z` (0 for fixed slots).
    pub fn apply(&mut self, x: &[f64], z: &[f64]) {
        let values = self.effective_values(x);
        for section in &mut self.sections {
            section.apply(&values);
        }
        for slot in &mut self.slots {
            slot.uncertainty = slot.optimization_index.map(|i| z[i]).unwrap_or(0.0);
        }
    }
}

fn resolve_alias_chain(name: &str, id_index: &HashMap<String, usize>, alias_targets: &HashMap<usize, String>, visited: &mut Vec<usize>) -> ModelResult<usize> {
    let idx = *id_index.get(name).ok_or_else(|| ModelError::InvalidModel(format!("unresolved parameter reference '{name}'")))?;
    if visited.contains(&idx) {
        return Err(ModelError::InvalidModel(format!("alias cycle detected at '{name}'")));
    }
    visited.push(idx);
    match alias_targets.get(&idx) {
        Some(next) => resolve_alias_chain(next, id_index, alias_targets, visited),
        None => Ok(idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_io::parse_model;

    fn build_with(model_text: &str, dir: &std::path::Path) -> ModelResult<ParameterSpace> {
        let definition = parse_model(model_text, '%', ProfileKind::Doppler.arity()).unwrap();
        ParameterSpace::build(definition, ProfileKind::Doppler, Some(dir))
    }

    fn write_data(dir: &std::path::Path, name: &str) {
        std::fs::write(dir.join(name), "5885 1.0 0.1\n5890 1.0 0.1\n5895 1.0 0.1\n").unwrap();
    }

    #[test]
    fn all_fixed_model_has_zero_free_parameters() {
        let dir = tempfile::tempdir().unwrap();
        write_data(dir.path(), "data.txt");
        let text = "\
{
  s1 data.txt 5880 5900 0
  30.0
  d1
    5889.95
    0.65
    0.0
    0.0
    2.0
    13.0
}
";
        let space = build_with(text, dir.path()).unwrap();
        assert_eq!(space.parameter_count(), 0);
        assert!(space.initial_values().is_empty());
        let cost_a = space.cost(&[]);
        let cost_b: f64 = space.sections().iter().map(|s| s.cost(&space.effective_values(&[]))).sum();
        assert!((cost_a - cost_b).abs() < 1e-12);
    }

    #[test]
    fn alias_chain_shares_optimization_index() {
        let dir = tempfile::tempdir().unwrap();
        write_data(dir.path(), "data.txt");
        let text = "\
{
  s1 data.txt 5880 5900 0
  30.0
  d1
    5889.95 5880.0 5900.0
    0.65
    0.0
    0.0
    2.0
    13.0
  d2
    =s1.d1.0
    0.65
    0.0
    0.0
    2.0
    13.0
}
";
        let space = build_with(text, dir.path()).unwrap();
        assert_eq!(space.parameter_count(), 1);
        let a = space.slots().iter().find(|s| s.id == "s1.d1.0").unwrap();
        let b = space.slots().iter().find(|s| s.id == "s1.d2.0").unwrap();
        assert_eq!(a.optimization_index, b.optimization_index);
        assert_eq!(a.optimization_index, Some(0));
    }

    #[test]
    fn fixed_model_is_idempotent_under_apply() {
        let dir = tempfile::tempdir().unwrap();
        write_data(dir.path(), "data.txt");
        let text = "\
{
  s1 data.txt 5880 5900 0
  30.0
  d1
    5889.95
    0.65
    0.0
    0.0
    2.0
    13.0
}
";
        let mut space = build_with(text, dir.path()).unwrap();
        let values_before: Vec<f64> = space.slots().iter().map(|s| s.value).collect();
        let cost_before = space.cost(&[]);

        space.apply(&[], &[]);

        let values_after: Vec<f64> = space.slots().iter().map(|s| s.value).collect();
        assert_eq!(values_before, values_after);
        assert!((space.cost(&[]) - cost_before).abs() < 1e-12);
        assert!(space.slots().iter().all(|s| s.uncertainty == 0.0));
    }

    #[test]
    fn self_referencing_alias_is_invalid_model() {
        let dir = tempfile::tempdir().unwrap();
        write_data(dir.path(), "data.txt");
        let text = "\
{
  s1 data.txt 5880 5900 0
  =s1.R
  d1
    5889.95
    0.65
    0.0
    0.0
    2.0
    13.0
}
";
        let result = build_with(text, dir.path());
        assert!(matches!(result, Err(ModelError::InvalidModel(_))));
    }
}
