//! CSV point files
//!
//! Each data row is `x,y` or `x,y,label`. Every row in a file must have the
//! same number of columns. A first line whose fields are mostly non-numeric
//! is treated as a header; blank lines and lines starting with `#` are
//! skipped.

use crate::core::{Class, LabeledPoint, LearnError, Point2D, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Points loaded from CSV, with their labels when the file has a third column
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    points: Vec<Point2D>,
    labels: Option<Vec<f64>>,
}

impl PointTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse rows from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut points = Vec::new();
        let mut labels = Vec::new();
        let mut width = None;
        let mut seen_data_line = false;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !seen_data_line {
                seen_data_line = true;
                if is_header_line(line) {
                    continue;
                }
            }

            let fields = parse_fields(line, index + 1)?;
            match width {
                None => width = Some(fields.len()),
                Some(w) if w != fields.len() => {
                    return Err(LearnError::ParseError(format!(
                        "line {}: expected {w} columns, found {}",
                        index + 1,
                        fields.len()
                    )))
                }
                Some(_) => {}
            }
            points.push(Point2D::new(fields[0], fields[1]));
            if let Some(&label) = fields.get(2) {
                labels.push(label);
            }
        }

        if points.is_empty() {
            return Err(LearnError::InvalidInput("no data rows found".to_string()));
        }
        let labels = (width == Some(3)).then_some(labels);
        Ok(Self { points, labels })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn labels(&self) -> Option<&[f64]> {
        self.labels.as_deref()
    }

    /// Pair each point with its label converted by `convert`
    pub fn labeled<L, F>(&self, convert: F) -> Result<Vec<LabeledPoint<L>>>
    where
        F: Fn(f64) -> Result<L>,
    {
        let labels = self.labels.as_ref().ok_or_else(|| {
            LearnError::InvalidInput("file has no label column".to_string())
        })?;
        self.points
            .iter()
            .zip(labels)
            .map(|(&point, &label)| {
                Ok(LabeledPoint {
                    point,
                    label: convert(label)?,
                })
            })
            .collect()
    }

    /// Labels as 0/1 for logistic regression (positive values map to 1)
    pub fn binary_labeled(&self) -> Result<Vec<LabeledPoint<u8>>> {
        self.labeled(|l| Ok(u8::from(l > 0.0)))
    }

    /// Labels as ±1 for the SVM (positive values map to +1)
    pub fn signed_labeled(&self) -> Result<Vec<LabeledPoint<f64>>> {
        self.labeled(|l| Ok(if l > 0.0 { 1.0 } else { -1.0 }))
    }

    /// Labels as [`Class`] (positive values map to `B`)
    pub fn class_labeled(&self) -> Result<Vec<LabeledPoint<Class>>> {
        self.labeled(|l| Ok(if l > 0.0 { Class::B } else { Class::A }))
    }
}

/// A line is a header when most of its fields are not numbers
fn is_header_line(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').collect();
    let non_numeric = fields
        .iter()
        .filter(|field| field.trim().parse::<f64>().is_err())
        .count();
    non_numeric * 2 > fields.len()
}

fn parse_fields(line: &str, line_number: usize) -> Result<Vec<f64>> {
    let fields = line
        .split(',')
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|_| {
                LearnError::ParseError(format!("line {line_number}: invalid number '{field}'"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if !(2..=3).contains(&fields.len()) {
        return Err(LearnError::ParseError(format!(
            "line {line_number}: expected 2 or 3 columns, found {}",
            fields.len()
        )));
    }
    Ok(fields)
}
