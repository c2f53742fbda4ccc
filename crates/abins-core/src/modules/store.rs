use crate::domain::AbinsError;
use crate::modules::serialization::write_text_artifact;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read store '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write store '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode store entry '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode store entry '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store '{path}' has no group '{group}'")]
    MissingGroup { path: PathBuf, group: String },
    #[error("group '{group}' has no attribute '{name}'")]
    MissingAttribute { group: String, name: String },
    #[error("group '{group}' has no dataset '{name}'")]
    MissingDataset { group: String, name: String },
    #[error("numeric array of shape {shape:?} cannot hold {len} values")]
    Shape { shape: Vec<usize>, len: usize },
}

impl From<StoreError> for AbinsError {
    fn from(error: StoreError) -> Self {
        let placeholder = match &error {
            StoreError::Read { .. } => "IO.STORE_READ",
            StoreError::Parse { .. } => "IO.STORE_PARSE",
            StoreError::Write { .. } => "IO.STORE_WRITE",
            StoreError::Encode { .. } => "INTERNAL.STORE_ENCODE",
            StoreError::Shape { .. } => "INTERNAL.STORE_SHAPE",
            StoreError::Decode { .. } => "IO.STORE_DECODE",
            StoreError::MissingGroup { .. } => "IO.STORE_MISSING_GROUP",
            StoreError::MissingAttribute { .. } => "IO.STORE_MISSING_ATTRIBUTE",
            StoreError::MissingDataset { .. } => "IO.STORE_MISSING_DATASET",
        };
        match error {
            StoreError::Encode { .. } | StoreError::Shape { .. } => {
                AbinsError::internal(placeholder, error.to_string())
            }
            _ => AbinsError::io_system(placeholder, error.to_string()),
        }
    }
}

/// Dense f64 array stored flat in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl NumericArray {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, StoreError> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(StoreError::Shape {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreGroup {
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    structured_datasets: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    numeric_datasets: BTreeMap<String, NumericArray>,
}

/// On-disk layout; groups other than the bound one are kept opaque.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    groups: BTreeMap<String, Value>,
}

/// One named group of a grouped JSON store file.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredStore {
    path: PathBuf,
    group_name: String,
    group: StoreGroup,
}

impl StructuredStore {
    /// An empty group bound to `path`; nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>, group_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group_name: group_name.into(),
            group: StoreGroup::default(),
        }
    }

    pub fn open(path: impl AsRef<Path>, group_name: &str) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut file = read_store_file(path)?.ok_or_else(|| StoreError::MissingGroup {
            path: path.to_path_buf(),
            group: group_name.to_string(),
        })?;
        let raw = file
            .groups
            .remove(group_name)
            .ok_or_else(|| StoreError::MissingGroup {
                path: path.to_path_buf(),
                group: group_name.to_string(),
            })?;
        let group = serde_json::from_value(raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), group = group_name, "opened structured store");
        Ok(Self {
            path: path.to_path_buf(),
            group_name: group_name.to_string(),
            group,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_attribute<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let value = encode(name, value)?;
        self.group.attributes.insert(name.to_string(), value);
        Ok(())
    }

    pub fn add_structured_dataset<T: Serialize>(
        &mut self,
        name: &str,
        records: &[T],
    ) -> Result<(), StoreError> {
        let records = records
            .iter()
            .map(|record| encode(name, record))
            .collect::<Result<Vec<_>, _>>()?;
        self.group
            .structured_datasets
            .insert(name.to_string(), records);
        Ok(())
    }

    pub fn add_numeric_dataset(&mut self, name: &str, array: NumericArray) {
        self.group.numeric_datasets.insert(name.to_string(), array);
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.group.attributes.contains_key(name)
    }

    pub fn attribute<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let value = self
            .group
            .attributes
            .get(name)
            .ok_or_else(|| StoreError::MissingAttribute {
                group: self.group_name.clone(),
                name: name.to_string(),
            })?;
        decode(name, value.clone())
    }

    pub fn structured_dataset<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Vec<T>, StoreError> {
        let records = self
            .group
            .structured_datasets
            .get(name)
            .ok_or_else(|| self.missing_dataset(name))?;
        records
            .iter()
            .map(|record| decode(name, record.clone()))
            .collect()
    }

    pub fn numeric_dataset(&self, name: &str) -> Result<&NumericArray, StoreError> {
        self.group
            .numeric_datasets
            .get(name)
            .ok_or_else(|| self.missing_dataset(name))
    }

    /// Writes this group, leaving every other group of the file untouched.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut file = read_store_file(&self.path)?.unwrap_or_default();
        let group = encode(&self.group_name, &self.group)?;
        file.groups.insert(self.group_name.clone(), group);

        let content = serde_json::to_string_pretty(&file).map_err(|source| StoreError::Encode {
            name: self.group_name.clone(),
            source,
        })?;
        write_text_artifact(&self.path, &content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            group = %self.group_name,
            "saved structured store"
        );
        Ok(())
    }

    fn missing_dataset(&self, name: &str) -> StoreError {
        StoreError::MissingDataset {
            group: self.group_name.clone(),
            name: name.to_string(),
        }
    }
}

fn read_store_file(path: &Path) -> Result<Option<StoreFile>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn encode<T: Serialize + ?Sized>(name: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        name: name.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Decode {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{NumericArray, StoreError, StructuredStore};
    use crate::domain::{AbinsError, AbinsErrorCategory};
    use serde::{Deserialize, Serialize};
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        label: String,
        weight: f64,
    }

    #[test]
    fn saved_group_reads_back_exactly() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("sample.abins.json");

        let mut store = StructuredStore::new(&path, "S");
        store
            .add_attribute("temperature", &10.0_f64)
            .expect("attribute should encode");
        store
            .add_attribute("sample_form", "Powder")
            .expect("attribute should encode");
        let records = vec![
            Record {
                label: "H".to_string(),
                weight: 0.1 + 0.2,
            },
            Record {
                label: "C".to_string(),
                weight: 1.0e-300,
            },
        ];
        store
            .add_structured_dataset("records", &records)
            .expect("records should encode");
        store.add_numeric_dataset("grid", NumericArray::vector(vec![1.0 / 3.0, 2.0 / 7.0]));
        store.save().expect("store should save");

        let reopened = StructuredStore::open(&path, "S").expect("store should reopen");
        assert_eq!(reopened, store);
        assert_eq!(
            reopened.attribute::<f64>("temperature").expect("temperature"),
            10.0
        );
        assert_eq!(
            reopened
                .structured_dataset::<Record>("records")
                .expect("records"),
            records
        );
        assert_eq!(
            reopened.numeric_dataset("grid").expect("grid").data(),
            &[1.0 / 3.0, 2.0 / 7.0]
        );
    }

    #[test]
    fn save_replaces_only_its_own_group() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("shared.abins.json");

        let mut other = StructuredStore::new(&path, "PowderData");
        other
            .add_attribute("filename", "input.json")
            .expect("attribute should encode");
        other.save().expect("other group should save");

        let mut first = StructuredStore::new(&path, "S");
        first.add_attribute("hash", &1_u64).expect("hash");
        first.save().expect("first save");

        let mut second = StructuredStore::new(&path, "S");
        second.add_attribute("hash", &2_u64).expect("hash");
        second.save().expect("second save");

        let s = StructuredStore::open(&path, "S").expect("S should exist");
        assert_eq!(s.attribute::<u64>("hash").expect("hash"), 2);
        let kept = StructuredStore::open(&path, "PowderData").expect("other group kept");
        assert_eq!(
            kept.attribute::<String>("filename").expect("filename"),
            "input.json"
        );

        let bytes = fs::read_to_string(&path).expect("store should be readable");
        assert!(!bytes.contains('\r'));
        assert!(bytes.ends_with('\n'));
    }

    #[test]
    fn missing_entries_are_io_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("absent.abins.json");

        let missing_file = StructuredStore::open(&path, "S").expect_err("no file");
        assert!(matches!(missing_file, StoreError::MissingGroup { .. }));

        let store = StructuredStore::new(&path, "S");
        let attribute = AbinsError::from(
            store
                .attribute::<f64>("temperature")
                .expect_err("no attribute"),
        );
        assert_eq!(attribute.category(), AbinsErrorCategory::IoSystemError);
        assert_eq!(attribute.placeholder(), "IO.STORE_MISSING_ATTRIBUTE");

        let dataset = AbinsError::from(store.numeric_dataset("grid").expect_err("no dataset"));
        assert_eq!(dataset.placeholder(), "IO.STORE_MISSING_DATASET");
    }

    #[test]
    fn corrupt_store_files_fail_to_parse() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("corrupt.abins.json");
        fs::write(&path, "{ not json").expect("fixture should be written");

        let error = AbinsError::from(StructuredStore::open(&path, "S").expect_err("corrupt"));
        assert_eq!(error.category(), AbinsErrorCategory::IoSystemError);
        assert_eq!(error.placeholder(), "IO.STORE_PARSE");
    }

    #[test]
    fn numeric_array_checks_shape_against_data() {
        let matrix = NumericArray::new(vec![2, 3], vec![0.0; 6]).expect("shape fits");
        assert_eq!(matrix.shape(), &[2, 3]);
        assert!(matches!(
            NumericArray::new(vec![2, 2], vec![0.0; 3]),
            Err(StoreError::Shape { len: 3, .. })
        ));
    }
}
