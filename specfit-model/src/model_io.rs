//! Text model definition format: comments, braced sections, parameter-slot
//! records, and the whitespace-column data files a section head points at.

use std::path::Path;

use crate::error::{ModelError, ModelResult};

/// A single parameter-slot record as written in the model file: bounded
/// free value, fixed value, or an alias naming another slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRecord {
    Free { value: f64, lower: f64, upper: f64 },
    Fixed { value: f64 },
    Alias { target: String },
}

#[derive(Debug, Clone)]
pub struct LineRecord {
    pub id: String,
    pub slots: Vec<SlotRecord>,
}

#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub id: String,
    pub data_file: String,
    pub lambda_min: f64,
    pub lambda_max: f64,
    pub continuum_order: usize,
    pub exclusion_intervals: Vec<(f64, f64)>,
    pub resolution: SlotRecord,
    pub lines: Vec<LineRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelDefinition {
    pub sections: Vec<SectionRecord>,
}

/// Strip everything from `mark` to end of line, then split into a stream
/// of non-blank lines, each already split into whitespace-separated
/// fields. `{` and `}` are always their own field even when not
/// surrounded by whitespace in the source.
fn tokenize_lines(text: &str, mark: char) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| match line.find(mark) {
            Some(idx) => &line[..idx],
            None => line,
        })
        .map(|line| line.replace('{', " { ").replace('}', " } "))
        .map(|line| line.split_whitespace().map(str::to_owned).collect::<Vec<_>>())
        .filter(|fields| !fields.is_empty())
        .collect()
}

fn parse_slot_record(fields: &[String], context: &str) -> ModelResult<SlotRecord> {
    if let [single] = fields {
        if let Some(target) = single.strip_prefix('=') {
            return Ok(SlotRecord::Alias { target: target.to_owned() });
        }
    }
    match fields {
        [value] => {
            let value = parse_f64(value, context)?;
            Ok(SlotRecord::Fixed { value })
        }
        [value, lower, upper] => {
            let value = parse_f64(value, context)?;
            let lower = parse_f64(lower, context)?;
            let upper = parse_f64(upper, context)?;
            let (lower, upper) = if lower <= upper { (lower, upper) } else { (upper, lower) };
            Ok(SlotRecord::Free { value, lower, upper })
        }
        _ => Err(ModelError::InvalidModel(format!(
            "{context}: expected a slot record (one value, three values, or '=id'), found {fields:?}"
        ))),
    }
}

fn parse_f64(token: &str, context: &str) -> ModelResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| ModelError::InvalidModel(format!("{context}: '{token}' is not a valid number")))
}

fn parse_usize(token: &str, context: &str) -> ModelResult<usize> {
    token
        .parse::<usize>()
        .map_err(|_| ModelError::InvalidModel(format!("{context}: '{token}' is not a valid non-negative integer")))
}

/// Parse a model definition. `line_arity` is the number of parameter slots
/// each line record carries, fixed by the profile variant the calling
/// binary selected (Doppler, many-multiplet, or Voigt).
pub fn parse_model(text: &str, comment_mark: char, line_arity: usize) -> ModelResult<ModelDefinition> {
    let lines = tokenize_lines(text, comment_mark);
    let mut iter = lines.into_iter().peekable();
    let mut sections = Vec::new();

    while let Some(fields) = iter.next() {
        if fields != ["{"] {
            return Err(ModelError::InvalidModel(format!("expected '{{' to open a section, found {fields:?}")));
        }

        let header = iter
            .next()
            .ok_or_else(|| ModelError::InvalidModel("unexpected end of input: expected section header".into()))?;
        let [id, data_file, lambda_min, lambda_max, m] = header.as_slice() else {
            return Err(ModelError::InvalidModel(format!(
                "section header must have 5 fields: id data-file lambda_min lambda_max m, found {header:?}"
            )));
        };
        let context = format!("section '{id}'");
        let lambda_min = parse_f64(lambda_min, &context)?;
        let lambda_max = parse_f64(lambda_max, &context)?;
        let continuum_order = parse_usize(m, &context)?;

        let mut exclusion_intervals = Vec::new();
        loop {
            let peek = iter.peek().ok_or_else(|| {
                ModelError::InvalidModel(format!("{context}: unexpected end of input while reading mask intervals"))
            })?;
            if peek.len() == 2 && peek.iter().all(|f| f.parse::<f64>().is_ok()) {
                let fields = iter.next().unwrap();
                let a = parse_f64(&fields[0], &context)?;
                let b = parse_f64(&fields[1], &context)?;
                exclusion_intervals.push((a.min(b), a.max(b)));
            } else {
                break;
            }
        }

        let resolution_fields = iter
            .next()
            .ok_or_else(|| ModelError::InvalidModel(format!("{context}: expected a resolution slot record")))?;
        let resolution = parse_slot_record(&resolution_fields, &context)?;

        let mut lines_out = Vec::new();
        loop {
            let peek = iter
                .peek()
                .ok_or_else(|| ModelError::InvalidModel(format!("{context}: unexpected end of input, missing '}}'")))?;
            if peek == ["}"] {
                iter.next();
                break;
            }
            let id_fields = iter.next().unwrap();
            let [line_id] = id_fields.as_slice() else {
                return Err(ModelError::InvalidModel(format!("{context}: expected a single line identifier, found {id_fields:?}")));
            };
            let line_context = format!("{context}, line '{line_id}'");
            let mut slots = Vec::with_capacity(line_arity);
            for _ in 0..line_arity {
                let fields = iter
                    .next()
                    .ok_or_else(|| ModelError::InvalidModel(format!("{line_context}: missing parameter slot record")))?;
                slots.push(parse_slot_record(&fields, &line_context)?);
            }
            lines_out.push(LineRecord { id: line_id.clone(), slots });
        }

        sections.push(SectionRecord {
            id: id.clone(),
            data_file: data_file.clone(),
            lambda_min,
            lambda_max,
            continuum_order,
            exclusion_intervals,
            resolution,
            lines: lines_out,
        });
    }

    Ok(ModelDefinition { sections })
}

/// Loaded, trimmed data for one section: wavelength, flux, uncertainty,
/// and a validity mask combining the file's own mask column (if present)
/// with the section's wavelength window and exclusion intervals.
#[derive(Debug, Clone)]
pub struct SectionData {
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    pub uncertainty: Vec<f64>,
    pub mask: Vec<bool>,
}

/// Read a whitespace-column data file: `lambda flux sigma [mask]` per row.
/// Lines beginning with `#`, `%`, or `!` (after leading whitespace) are
/// comments; the mask column defaults to valid when absent.
pub fn load_data_file(path: impl AsRef<Path>, lambda_min: f64, lambda_max: f64, exclusions: &[(f64, f64)]) -> ModelResult<SectionData> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;

    let mut wavelength = Vec::new();
    let mut flux = Vec::new();
    let mut uncertainty = Vec::new();
    let mut mask = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(['#', '%', '!']) {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(ModelError::InvalidModel(format!(
                "{}:{lineno}: expected at least 3 columns (lambda flux sigma), found {}",
                path.display(),
                fields.len()
            )));
        }
        let context = format!("{}:{lineno}", path.display());
        let l = parse_f64(fields[0], &context)?;
        let f = parse_f64(fields[1], &context)?;
        let s = parse_f64(fields[2], &context)?;
        let column_mask = match fields.get(3) {
            Some(&token) => parse_f64(token, &context)? != 0.0,
            None => true,
        };
        let within_window = l >= lambda_min && l <= lambda_max;
        let excluded = exclusions.iter().any(|&(a, b)| l >= a && l <= b);

        wavelength.push(l);
        flux.push(f);
        uncertainty.push(s.max(f64::MIN_POSITIVE));
        mask.push(column_mask && within_window && !excluded);
    }

    Ok(SectionData { wavelength, flux, uncertainty, mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_doppler_section() {
        let text = "\
% a comment
{
  s1 data.txt 5880 5900 0
  30.0 20.0 100.0
  d1
    5889.95 5889.0 5891.0
    0.65
    0.0
    0.0 -10.0 10.0
    2.0 0.1 10.0
    13.0 10.0 16.0
}
";
        let model = parse_model(text, '%', 6).unwrap();
        assert_eq!(model.sections.len(), 1);
        let section = &model.sections[0];
        assert_eq!(section.id, "s1");
        assert_eq!(section.continuum_order, 0);
        assert_eq!(section.exclusion_intervals, vec![(20.0, 100.0)]);
        assert_eq!(section.resolution, SlotRecord::Free { value: 30.0, lower: 20.0, upper: 100.0 });
        assert_eq!(section.lines.len(), 1);
        assert_eq!(section.lines[0].slots.len(), 6);
    }

    #[test]
    fn alias_record_parses_target_name() {
        let fields = vec!["=s1.d1.0".to_string()];
        let record = parse_slot_record(&fields, "ctx").unwrap();
        assert_eq!(record, SlotRecord::Alias { target: "s1.d1.0".to_string() });
    }

    #[test]
    fn rejects_unterminated_section() {
        let text = "{\n  s1 data.txt 0 1 0\n  30.0\n";
        let result = parse_model(text, '%', 6);
        assert!(result.is_err());
    }

    #[test]
    fn data_file_mask_combines_window_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "# header\n5885 1.0 0.1\n5890 0.9 0.1 0\n5895 0.8 0.1\n5905 0.7 0.1\n").unwrap();

        let data = load_data_file(&path, 5880.0, 5900.0, &[(5892.0, 5896.0)]).unwrap();
        assert_eq!(data.wavelength, vec![5885.0, 5890.0, 5895.0, 5905.0]);
        assert_eq!(data.mask, vec![true, false, false, false]);
    }
}
