//! Data
//!
//! The `Dataset` capability consumed by the tree, and `Frame`, a small
//! columnar implementation of it that can be loaded from CSV.
use crate::errors::WattleError;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// How a column is split on.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AttributeType {
    /// Ordered values, split with a `<=` / `>` threshold.
    Numerical,
    /// Unordered values, split with one branch per observed value.
    Categorical,
}

impl FromStr for AttributeType {
    type Err = WattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numerical" | "numeric" => Ok(AttributeType::Numerical),
            "categorical" => Ok(AttributeType::Categorical),
            _ => Err(WattleError::InvalidArgument(format!(
                "unrecognized attribute type '{}', expected numerical or categorical",
                s
            ))),
        }
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeType::Numerical => write!(f, "numerical"),
            AttributeType::Categorical => write!(f, "categorical"),
        }
    }
}

/// A single cell of a dataset.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// The text form used as a class key. Integral numbers drop their
    /// fractional part, so `1.0` and `"1"` share a key.
    pub fn canonical(&self) -> String {
        match self {
            Value::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                format!("{}", *v as i64)
            }
            Value::Number(v) => format!("{}", v),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Numbers before text, numbers by `total_cmp`, text lexicographically.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            // Debug keeps the decimal point, `70.0` rather than `70`.
            Value::Number(v) => write!(f, "{:?}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Number of records per canonical class value.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct ClassSupports(BTreeMap<String, usize>);

impl ClassSupports {
    pub fn new() -> Self {
        ClassSupports(BTreeMap::new())
    }

    /// Support of one class, zero when the class is absent.
    pub fn get(&self, class: &str) -> usize {
        self.0.get(class).copied().unwrap_or(0)
    }

    pub fn add(&mut self, class: impl Into<String>, count: usize) {
        *self.0.entry(class.into()).or_insert(0) += count;
    }

    /// Sum of all supports.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The class with the largest support. Ties go to the smallest
    /// canonical class value.
    pub fn majority(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (class, count) in self.iter() {
            match best {
                Some((_, c)) if c >= count => {}
                _ => best = Some((class, count)),
            }
        }
        best
    }
}

impl FromIterator<(String, usize)> for ClassSupports {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let mut supports = ClassSupports::new();
        for (class, count) in iter {
            supports.add(class, count);
        }
        supports
    }
}

impl Display for ClassSupports {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let body = self
            .iter()
            .map(|(class, count)| format!("{} : {}", class, count))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", body)
    }
}

/// Read-only tabular data a tree is grown over.
///
/// Nodes never copy records, they hold row indices into a dataset, so every
/// bulk operation here takes the index of the partition it works on.
pub trait Dataset {
    /// Total number of records.
    fn n_rows(&self) -> usize;
    /// Column names, in their original order.
    fn column_names(&self) -> Vec<String>;
    /// Type of a column, `None` if the column does not exist.
    fn attribute_type(&self, column: &str) -> Option<AttributeType>;
    /// A single cell, `None` when the cell is missing or out of range.
    fn value(&self, row: usize, column: &str) -> Option<Value>;

    /// Rows of `index` whose value in `column` satisfies `predicate`.
    fn filter_rows<P>(&self, index: &[usize], column: &str, predicate: P) -> Vec<usize>
    where
        P: Fn(Option<&Value>) -> bool,
    {
        index
            .iter()
            .copied()
            .filter(|&row| predicate(self.value(row, column).as_ref()))
            .collect()
    }

    /// Distinct non-missing values of `column` within `index`, sorted.
    fn unique_values(&self, index: &[usize], column: &str) -> Vec<Value> {
        let mut values: Vec<Value> = index.iter().filter_map(|&row| self.value(row, column)).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values
    }

    /// Counts of each canonical value of `column` within `index`. Missing
    /// cells are counted under the empty label so the counts always sum to
    /// `index.len()`.
    fn value_counts(&self, index: &[usize], column: &str) -> ClassSupports {
        let mut counts = ClassSupports::new();
        for &row in index {
            match self.value(row, column) {
                Some(v) => counts.add(v.canonical(), 1),
                None => counts.add(String::new(), 1),
            }
        }
        counts
    }
}

/// A column of a `Frame`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum Column {
    /// Missing values are stored as `NaN`.
    Numerical(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numerical(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Column::Numerical(_) => AttributeType::Numerical,
            Column::Categorical(_) => AttributeType::Categorical,
        }
    }

    fn get(&self, row: usize) -> Option<Value> {
        match self {
            Column::Numerical(v) => v.get(row).filter(|x| !x.is_nan()).map(|x| Value::Number(*x)),
            Column::Categorical(v) => v.get(row).map(|x| Value::Text(x.clone())),
        }
    }
}

/// Named columns of equal length.
#[derive(Clone, Debug)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    lookup: HashMap<String, usize>,
    rows: usize,
}

impl Frame {
    /// Create a frame from `(name, column)` pairs.
    pub fn new<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self, WattleError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        let mut lookup = HashMap::with_capacity(columns.len());
        let mut rows = None;
        for (name, column) in columns {
            let name = name.into();
            match rows {
                None => rows = Some(column.len()),
                Some(r) if r != column.len() => {
                    return Err(WattleError::InvalidArgument(format!(
                        "column '{}' has {} rows, expected {}",
                        name,
                        column.len(),
                        r
                    )))
                }
                Some(_) => {}
            }
            if lookup.insert(name.clone(), cols.len()).is_some() {
                return Err(WattleError::InvalidArgument(format!("duplicate column '{}'", name)));
            }
            names.push(name);
            cols.push(column);
        }
        Ok(Frame {
            names,
            columns: cols,
            lookup,
            rows: rows.unwrap_or(0),
        })
    }

    /// Read a frame from CSV with a header row. A column is numerical when
    /// every one of its cells parses as a number, categorical otherwise.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, WattleError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| WattleError::UnableToRead(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in csv_reader.records() {
            let record = result.map_err(|e| WattleError::UnableToRead(e.to_string()))?;
            for (i, cells) in raw.iter_mut().enumerate() {
                cells.push(record.get(i).unwrap_or("").trim().to_string());
            }
        }

        let columns: Vec<(String, Column)> = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                let parsed: Option<Vec<f64>> = cells.iter().map(|c| c.parse::<f64>().ok()).collect();
                let column = match parsed {
                    Some(values) if !cells.is_empty() => Column::Numerical(values),
                    _ => Column::Categorical(cells),
                };
                (name, column)
            })
            .collect();
        Frame::new(columns)
    }

    /// Read a frame from a CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, WattleError> {
        let file = File::open(path.as_ref())
            .map_err(|e| WattleError::UnableToRead(format!("{}: {}", path.as_ref().display(), e)))?;
        Frame::from_csv_reader(file)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.lookup.get(name).map(|&i| &self.columns[i])
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

impl Dataset for Frame {
    fn n_rows(&self) -> usize {
        self.rows
    }

    fn column_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn attribute_type(&self, column: &str) -> Option<AttributeType> {
        self.column(column).map(Column::attribute_type)
    }

    fn value(&self, row: usize, column: &str) -> Option<Value> {
        self.column(column).and_then(|c| c.get(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![
            ("LOC", Column::Numerical(vec![50., 80., 90., 60., f64::NAN])),
            (
                "Colour",
                Column::Categorical(vec!["red".into(), "blue".into(), "red".into(), "green".into(), "blue".into()]),
            ),
            ("Defective", Column::Numerical(vec![0., 1., 1., 0., 1.])),
        ])
        .unwrap()
    }

    #[test]
    fn test_attribute_type_parse() {
        assert_eq!("numerical".parse::<AttributeType>().unwrap(), AttributeType::Numerical);
        assert_eq!("Categorical".parse::<AttributeType>().unwrap(), AttributeType::Categorical);
        assert!(matches!(
            "ordinal".parse::<AttributeType>(),
            Err(WattleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_canonical_values() {
        assert_eq!(Value::Number(1.0).canonical(), "1");
        assert_eq!(Value::Number(0.5).canonical(), "0.5");
        assert_eq!(Value::Text("1".into()).canonical(), "1");
        assert_eq!(Value::Number(70.0).to_string(), "70.0");
        assert_eq!(Value::Text("red".into()).to_string(), "red");
    }

    #[test]
    fn test_class_supports() {
        let supports: ClassSupports = vec![("Y".to_string(), 35), ("N".to_string(), 11)].into_iter().collect();
        assert_eq!(supports.to_string(), "{N : 11, Y : 35}");
        assert_eq!(supports.total(), 46);
        assert_eq!(supports.get("Y"), 35);
        assert_eq!(supports.get("maybe"), 0);
        assert_eq!(supports.majority(), Some(("Y", 35)));

        let tied: ClassSupports = vec![("b".to_string(), 2), ("a".to_string(), 2)].into_iter().collect();
        assert_eq!(tied.majority(), Some(("a", 2)));
    }

    #[test]
    fn test_frame_queries() {
        let f = frame();
        let index: Vec<usize> = (0..f.n_rows()).collect();
        assert_eq!(f.n_rows(), 5);
        assert_eq!(f.column_names(), vec!["LOC", "Colour", "Defective"]);
        assert_eq!(f.attribute_type("Colour"), Some(AttributeType::Categorical));
        assert_eq!(f.attribute_type("Nope"), None);
        assert_eq!(f.value(4, "LOC"), None);

        let unique = f.unique_values(&index, "LOC");
        assert_eq!(
            unique,
            vec![Value::Number(50.), Value::Number(60.), Value::Number(80.), Value::Number(90.)]
        );
        let colours = f.unique_values(&[0, 2, 3], "Colour");
        assert_eq!(colours, vec![Value::from("green"), Value::from("red")]);

        let counts = f.value_counts(&index, "Defective");
        assert_eq!(counts.to_string(), "{0 : 2, 1 : 3}");

        let small = f.filter_rows(&index, "LOC", |v| v.and_then(Value::as_f64).map_or(false, |x| x <= 70.));
        assert_eq!(small, vec![0, 3]);
    }

    #[test]
    fn test_frame_rejects_ragged_columns() {
        let f = Frame::new(vec![
            ("a", Column::Numerical(vec![1., 2.])),
            ("b", Column::Numerical(vec![1.])),
        ]);
        assert!(matches!(f, Err(WattleError::InvalidArgument(_))));
        let f = Frame::new(vec![
            ("a", Column::Numerical(vec![1.])),
            ("a", Column::Numerical(vec![1.])),
        ]);
        assert!(matches!(f, Err(WattleError::InvalidArgument(_))));
    }

    #[test]
    fn test_frame_from_csv() {
        let text = "LOC,Colour,Defective\n50,red,0\n80,blue,1\n";
        let f = Frame::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(f.n_rows(), 2);
        assert_eq!(f.attribute_type("LOC"), Some(AttributeType::Numerical));
        assert_eq!(f.attribute_type("Colour"), Some(AttributeType::Categorical));
        assert_eq!(f.value(1, "Defective"), Some(Value::Number(1.)));
    }

    #[test]
    fn test_frame_from_csv_path() {
        let f = Frame::from_csv_path("resources/LOC_SDP.csv").unwrap();
        assert_eq!(f.n_rows(), 20);
        assert_eq!(f.column_names(), vec!["LOC", "Defective"]);
        assert!(matches!(
            Frame::from_csv_path("resources/does_not_exist.csv"),
            Err(WattleError::UnableToRead(_))
        ));
    }
}
