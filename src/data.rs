//! Datasets of labelled examples.
//!
//! The network consumes [`Example`]s: an attribute vector plus a 1-based class.
//! Text files may encode the class either as a single trailing integer or as a
//! trailing one-hot block; [`LabelEncoding`] selects which, and the loader
//! converts both to the integer form.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One labelled example.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub attributes: Vec<f64>,
    /// 1-based class id.
    pub class: usize,
}

impl Example {
    #[inline]
    pub fn new(attributes: Vec<f64>, class: usize) -> Self {
        Self { attributes, class }
    }
}

/// How the class label trails the attributes on each row of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelEncoding {
    /// A single integer class id in `1..=num_classes`.
    #[default]
    Integer,
    /// `num_classes` fields, exactly one of which is `1`.
    OneHot,
}

impl FromStr for LabelEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(LabelEncoding::Integer),
            "one-hot" | "onehot" | "one_hot" => Ok(LabelEncoding::OneHot),
            other => Err(Error::InvalidConfig(format!(
                "unknown label encoding {other:?} (expected integer or one-hot)"
            ))),
        }
    }
}

impl fmt::Display for LabelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelEncoding::Integer => f.write_str("integer"),
            LabelEncoding::OneHot => f.write_str("one-hot"),
        }
    }
}

/// A validated collection of examples sharing one attribute count and class range.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    examples: Vec<Example>,
    num_features: usize,
    num_classes: usize,
}

impl Dataset {
    /// Wrap examples after checking every attribute count and class id.
    pub fn from_examples(
        examples: Vec<Example>,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if num_features == 0 {
            return Err(Error::InvalidData("num_features must be > 0".to_owned()));
        }
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }
        for (i, example) in examples.iter().enumerate() {
            if example.attributes.len() != num_features {
                return Err(Error::InvalidData(format!(
                    "example {i} has {} attributes, expected {num_features}",
                    example.attributes.len()
                )));
            }
            if example.attributes.iter().any(|x| !x.is_finite()) {
                return Err(Error::InvalidData(format!(
                    "example {i} has a non-finite attribute"
                )));
            }
            if example.class == 0 || example.class > num_classes {
                return Err(Error::InvalidData(format!(
                    "example {i} has class {}, expected 1..={num_classes}",
                    example.class
                )));
            }
        }
        Ok(Self {
            examples,
            num_features,
            num_classes,
        })
    }

    /// Parse whitespace-separated rows.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(
        text: &str,
        num_features: usize,
        num_classes: usize,
        encoding: LabelEncoding,
    ) -> Result<Self> {
        let expected_fields = match encoding {
            LabelEncoding::Integer => num_features + 1,
            LabelEncoding::OneHot => num_features + num_classes,
        };

        let mut examples = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = line_idx + 1;

            let fields = line
                .split_whitespace()
                .map(|tok| match tok.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    Ok(_) => Err(Error::InvalidData(format!(
                        "line {line_no}: value {tok:?} is not finite"
                    ))),
                    Err(e) => Err(Error::InvalidData(format!(
                        "line {line_no}: bad value {tok:?}: {e}"
                    ))),
                })
                .collect::<Result<Vec<f64>>>()?;
            if fields.len() != expected_fields {
                return Err(Error::InvalidData(format!(
                    "line {line_no}: expected {expected_fields} fields ({num_features} attributes + {encoding} label), got {}",
                    fields.len()
                )));
            }

            let (attributes, label) = fields.split_at(num_features);
            let class = match encoding {
                LabelEncoding::Integer => integer_class(label[0], num_classes),
                LabelEncoding::OneHot => one_hot_class(label),
            }
            .map_err(|e| Error::InvalidData(format!("line {line_no}: {e}")))?;

            examples.push(Example::new(attributes.to_vec(), class));
        }

        if examples.is_empty() {
            return Err(Error::InvalidData("dataset contains no examples".to_owned()));
        }
        Self::from_examples(examples, num_features, num_classes)
    }

    /// Read and parse a data file.
    pub fn load<P: AsRef<Path>>(
        path: P,
        num_features: usize,
        num_classes: usize,
        encoding: LabelEncoding,
    ) -> Result<Self> {
        let p = path.as_ref();
        let text = std::fs::read_to_string(p)
            .map_err(|e| Error::Io(format!("failed to read {}: {e}", p.display())))?;
        Self::parse(&text, num_features, num_classes, encoding)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Mutable access, e.g. for in-place shuffling during training.
    #[inline]
    pub fn examples_mut(&mut self) -> &mut [Example] {
        &mut self.examples
    }

    pub fn into_examples(self) -> Vec<Example> {
        self.examples
    }

    /// Number of examples of each class, indexed by `class - 1`.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for example in &self.examples {
            counts[example.class - 1] += 1;
        }
        counts
    }

    /// Scale every attribute to `[0, 1]` with `x' = (x - min) / (max - min)`.
    ///
    /// An attribute with a single distinct value maps to `0`.
    pub fn normalize(&mut self) {
        let mut min = vec![f64::INFINITY; self.num_features];
        let mut max = vec![f64::NEG_INFINITY; self.num_features];
        for example in &self.examples {
            for (j, &x) in example.attributes.iter().enumerate() {
                min[j] = min[j].min(x);
                max[j] = max[j].max(x);
            }
        }

        for example in &mut self.examples {
            for (j, x) in example.attributes.iter_mut().enumerate() {
                let range = max[j] - min[j];
                *x = if range > 0.0 { (*x - min[j]) / range } else { 0.0 };
            }
        }
    }

    /// Split into `(training, testing)` so that the training set covers every
    /// class as evenly as possible.
    ///
    /// Examples are grouped by class and each group is shuffled. The training
    /// set then takes one example from each non-empty group in turn until it
    /// holds `floor(len * training_ratio / 100)` examples; everything left over
    /// goes to the test set.
    pub fn stratified_split<R: Rng + ?Sized>(
        self,
        training_ratio: u32,
        rng: &mut R,
    ) -> Result<(Dataset, Dataset)> {
        if training_ratio > 100 {
            return Err(Error::InvalidConfig(format!(
                "training ratio must be in 0..=100, got {training_ratio}"
            )));
        }

        let total = self.examples.len();
        let num_training = total * training_ratio as usize / 100;

        let mut groups: Vec<Vec<Example>> = vec![Vec::new(); self.num_classes];
        for example in self.examples {
            groups[example.class - 1].push(example);
        }
        let mut groups: Vec<VecDeque<Example>> = groups
            .into_iter()
            .map(|mut g| {
                g.shuffle(rng);
                VecDeque::from(g)
            })
            .collect();

        let mut training = Vec::with_capacity(num_training);
        while training.len() < num_training {
            for group in &mut groups {
                if training.len() == num_training {
                    break;
                }
                if let Some(example) = group.pop_front() {
                    training.push(example);
                }
            }
        }

        let testing: Vec<Example> = groups.into_iter().flatten().collect();
        Ok((
            Dataset {
                examples: training,
                num_features: self.num_features,
                num_classes: self.num_classes,
            },
            Dataset {
                examples: testing,
                num_features: self.num_features,
                num_classes: self.num_classes,
            },
        ))
    }
}

fn integer_class(value: f64, num_classes: usize) -> Result<usize> {
    if value.fract() != 0.0 || value < 1.0 || value > num_classes as f64 {
        return Err(Error::InvalidData(format!(
            "class label {value} is not an integer in 1..={num_classes}"
        )));
    }
    Ok(value as usize)
}

fn one_hot_class(label: &[f64]) -> Result<usize> {
    let mut class = None;
    for (i, &v) in label.iter().enumerate() {
        if v == 1.0 {
            if class.is_some() {
                return Err(Error::InvalidData(
                    "one-hot label has more than one 1".to_owned(),
                ));
            }
            class = Some(i + 1);
        } else if v != 0.0 {
            return Err(Error::InvalidData(format!(
                "one-hot label contains {v}, expected only 0 or 1"
            )));
        }
    }
    class.ok_or_else(|| Error::InvalidData("one-hot label has no 1".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parses_integer_labels() {
        let text = "# x y class\n0.5 1.0 2\n\n-1 3 1\n";
        let ds = Dataset::parse(text, 2, 2, LabelEncoding::Integer).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.examples()[0], Example::new(vec![0.5, 1.0], 2));
        assert_eq!(ds.examples()[1], Example::new(vec![-1.0, 3.0], 1));
    }

    #[test]
    fn parses_one_hot_labels() {
        let text = "1 2 0 0 1\n3 4 1 0 0\n";
        let ds = Dataset::parse(text, 2, 3, LabelEncoding::OneHot).unwrap();
        assert_eq!(ds.examples()[0].class, 3);
        assert_eq!(ds.examples()[1].class, 1);
        assert_eq!(ds.class_counts(), vec![1, 0, 1]);
    }

    #[test]
    fn rejects_malformed_rows() {
        assert!(Dataset::parse("1 2\n", 2, 2, LabelEncoding::Integer).is_err());
        assert!(Dataset::parse("1 2 3\n", 2, 2, LabelEncoding::Integer).is_err());
        assert!(Dataset::parse("1 2 1.5\n", 2, 2, LabelEncoding::Integer).is_err());
        assert!(Dataset::parse("1 x 1\n", 2, 2, LabelEncoding::Integer).is_err());
        assert!(Dataset::parse("1 2 1 1\n", 2, 2, LabelEncoding::OneHot).is_err());
        assert!(Dataset::parse("1 2 0 0\n", 2, 2, LabelEncoding::OneHot).is_err());
        assert!(Dataset::parse("1 2 0.5 0\n", 2, 2, LabelEncoding::OneHot).is_err());
        assert!(Dataset::parse("# only a comment\n", 2, 2, LabelEncoding::Integer).is_err());
    }

    #[test]
    fn rejects_non_finite_attributes() {
        for row in ["nan 1 1\n", "1 inf 2\n", "-inf 0 1\n"] {
            assert!(matches!(
                Dataset::parse(row, 2, 2, LabelEncoding::Integer),
                Err(Error::InvalidData(_))
            ));
        }
        assert!(
            Dataset::from_examples(vec![Example::new(vec![f64::NAN, 0.0], 1)], 2, 1).is_err()
        );
    }

    #[test]
    fn label_encoding_names() {
        assert_eq!("one-hot".parse::<LabelEncoding>().unwrap(), LabelEncoding::OneHot);
        assert_eq!("Integer".parse::<LabelEncoding>().unwrap(), LabelEncoding::Integer);
        assert!("binary".parse::<LabelEncoding>().is_err());
        assert_eq!(LabelEncoding::OneHot.to_string(), "one-hot");
    }

    #[test]
    fn normalize_scales_to_unit_interval() {
        let mut ds = Dataset::from_examples(
            vec![
                Example::new(vec![2.0, 5.0, -1.0], 1),
                Example::new(vec![4.0, 5.0, 1.0], 1),
                Example::new(vec![3.0, 5.0, 0.0], 1),
            ],
            3,
            1,
        )
        .unwrap();
        ds.normalize();
        let rows: Vec<&[f64]> = ds.examples().iter().map(|e| e.attributes.as_slice()).collect();
        assert_eq!(rows[0], &[0.0, 0.0, 0.0]);
        assert_eq!(rows[1], &[1.0, 0.0, 1.0]);
        assert_eq!(rows[2], &[0.5, 0.0, 0.5]);
    }

    #[test]
    fn stratified_split_balances_classes() {
        let mut examples = Vec::new();
        for i in 0..10 {
            examples.push(Example::new(vec![i as f64], 1));
            examples.push(Example::new(vec![i as f64 + 0.5], 2));
        }
        for i in 0..4 {
            examples.push(Example::new(vec![-(i as f64)], 3));
        }
        let ds = Dataset::from_examples(examples, 1, 3).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let (train, test) = ds.stratified_split(50, &mut rng).unwrap();
        assert_eq!(train.len(), 12);
        assert_eq!(test.len(), 12);
        assert_eq!(train.class_counts(), vec![4, 4, 4]);
        assert_eq!(test.class_counts(), vec![6, 6, 0]);
    }

    #[test]
    fn stratified_split_edges() {
        let ds = Dataset::from_examples(
            vec![Example::new(vec![0.0], 1), Example::new(vec![1.0], 2)],
            1,
            2,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let (train, test) = ds.clone().stratified_split(100, &mut rng).unwrap();
        assert_eq!((train.len(), test.len()), (2, 0));
        let (train, test) = ds.clone().stratified_split(0, &mut rng).unwrap();
        assert_eq!((train.len(), test.len()), (0, 2));
        assert!(ds.stratified_split(101, &mut rng).is_err());
    }
}
