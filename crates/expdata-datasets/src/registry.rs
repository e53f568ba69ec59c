//! The standard `name -> loader` table used by experiment runs.

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::config::DatasetConfig;
use crate::error::{DatasetError, DatasetResult};
use crate::reference::{ReferenceDataset, ReferenceProvider};
use crate::synthetic::{self, Difficulty, SynthSpec};
use crate::tabular::FileDataset;
use crate::LabeledData;

/// Feature counts of the generated `synth-<n>-{easy,hard}` entries.
pub const SYNTH_FEATURE_COUNTS: [usize; 7] = [8, 64, 128, 256, 512, 1024, 2048];

/// A way to produce one `(X, y)` dataset. Loading never mutates the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Loader {
    File {
        dataset: FileDataset,
        data_dir: PathBuf,
    },
    Reference {
        dataset: ReferenceDataset,
        provider: ReferenceProvider,
        /// Two-class variant instead of the full dataset.
        binary: bool,
    },
    Synthetic(SynthSpec),
}

impl Loader {
    pub fn load(&self) -> DatasetResult<LabeledData> {
        match self {
            Loader::File { dataset, data_dir } => dataset.load(data_dir),
            Loader::Reference {
                dataset,
                provider,
                binary: true,
            } => provider.load_binary(*dataset),
            Loader::Reference {
                dataset, provider, ..
            } => provider.load(*dataset),
            Loader::Synthetic(spec) => synthetic::generate(spec),
        }
    }
}

/// Typed name of every standard registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetId {
    Iris2d,
    Wine2d,
    Diabetes,
    Audit,
    Banknotes,
    Ionosphere,
    Sonar,
    Wheat2d,
    Synth(usize, Difficulty),
}

impl DatasetId {
    /// All standard entries: the fixed datasets first, then every synthetic
    /// feature count with its easy and hard variant.
    pub fn standard() -> Vec<DatasetId> {
        let mut ids = vec![
            DatasetId::Iris2d,
            DatasetId::Wine2d,
            DatasetId::Diabetes,
            DatasetId::Audit,
            DatasetId::Banknotes,
            DatasetId::Ionosphere,
            DatasetId::Sonar,
            DatasetId::Wheat2d,
        ];
        for n in SYNTH_FEATURE_COUNTS {
            ids.push(DatasetId::Synth(n, Difficulty::Easy));
            ids.push(DatasetId::Synth(n, Difficulty::Hard));
        }
        ids
    }

    pub fn name(&self) -> String {
        match self {
            DatasetId::Iris2d => "iris-2d".to_string(),
            DatasetId::Wine2d => "wine-2d".to_string(),
            DatasetId::Diabetes => "diabetes".to_string(),
            DatasetId::Audit => "audit".to_string(),
            DatasetId::Banknotes => "banknotes".to_string(),
            DatasetId::Ionosphere => "ionosphere".to_string(),
            DatasetId::Sonar => "sonar".to_string(),
            DatasetId::Wheat2d => "wheat-2d".to_string(),
            DatasetId::Synth(n, d) => format!("synth-{}-{}", n, d),
        }
    }

    /// The loader this id resolves to under `config`.
    pub fn loader(&self, config: &DatasetConfig) -> Loader {
        let file = |dataset| Loader::File {
            dataset,
            data_dir: config.data_dir.clone(),
        };
        let reference = |dataset| Loader::Reference {
            dataset,
            provider: ReferenceProvider::from_config(config),
            binary: true,
        };
        match *self {
            DatasetId::Iris2d => reference(ReferenceDataset::Iris),
            DatasetId::Wine2d => reference(ReferenceDataset::Wine),
            DatasetId::Diabetes => file(FileDataset::Diabetes),
            DatasetId::Audit => file(FileDataset::Audit),
            DatasetId::Banknotes => file(FileDataset::Banknotes),
            DatasetId::Ionosphere => file(FileDataset::Ionosphere),
            DatasetId::Sonar => file(FileDataset::Sonar),
            DatasetId::Wheat2d => file(FileDataset::WheatSeeds),
            DatasetId::Synth(n, d) => Loader::Synthetic(SynthSpec::profile(n, d)),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for DatasetId {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s {
            "iris-2d" => DatasetId::Iris2d,
            "wine-2d" => DatasetId::Wine2d,
            "diabetes" => DatasetId::Diabetes,
            "audit" => DatasetId::Audit,
            "banknotes" => DatasetId::Banknotes,
            "ionosphere" => DatasetId::Ionosphere,
            "sonar" => DatasetId::Sonar,
            "wheat-2d" => DatasetId::Wheat2d,
            other => {
                parse_synth(other).ok_or_else(|| DatasetError::UnknownDataset(s.to_string()))?
            }
        };
        Ok(id)
    }
}

fn parse_synth(name: &str) -> Option<DatasetId> {
    let rest = name.strip_prefix("synth-")?;
    let (n, difficulty) = rest.split_once('-')?;
    let n: usize = n.parse().ok()?;
    if !SYNTH_FEATURE_COUNTS.contains(&n) {
        return None;
    }
    let difficulty = match difficulty {
        "easy" => Difficulty::Easy,
        "hard" => Difficulty::Hard,
        _ => return None,
    };
    Some(DatasetId::Synth(n, difficulty))
}

/// Immutable map from dataset name to [`Loader`].
#[derive(Debug, Clone)]
pub struct Registry {
    loaders: HashMap<String, Loader>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The 22 standard datasets with paths taken from `config`.
    pub fn standard(config: &DatasetConfig) -> DatasetResult<Registry> {
        let mut builder = Registry::builder();
        for id in DatasetId::standard() {
            builder = builder.register(id.name(), id.loader(config))?;
        }
        let registry = builder.build();
        debug!(
            entries = registry.len(),
            data_dir = %config.data_dir.display(),
            "built dataset registry"
        );
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&Loader> {
        self.loaders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Look up `name` and run its loader.
    pub fn load(&self, name: &str) -> DatasetResult<LabeledData> {
        self.get(name)
            .ok_or_else(|| DatasetError::UnknownDataset(name.to_string()))?
            .load()
    }

    pub fn load_id(&self, id: DatasetId) -> DatasetResult<LabeledData> {
        self.load(&id.name())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Loader)> {
        self.loaders.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Collects entries for a [`Registry`], rejecting repeated names.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    loaders: HashMap<String, Loader>,
}

impl RegistryBuilder {
    pub fn register(mut self, name: impl Into<String>, loader: Loader) -> DatasetResult<Self> {
        match self.loaders.entry(name.into()) {
            Entry::Occupied(e) => Err(DatasetError::DuplicateDataset(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(loader);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> Registry {
        Registry {
            loaders: self.loaders,
        }
    }
}

/// Build the standard registry.
pub fn get_registry(config: &DatasetConfig) -> DatasetResult<Registry> {
    Registry::standard(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::scratch_dir;
    use std::fs;

    #[test]
    fn test_standard_keys() {
        let registry = get_registry(&DatasetConfig::default()).unwrap();
        assert_eq!(registry.len(), 22);

        let mut expected: Vec<String> = [
            "iris-2d", "wine-2d", "diabetes", "audit", "banknotes", "ionosphere", "sonar",
            "wheat-2d",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for n in SYNTH_FEATURE_COUNTS {
            expected.push(format!("synth-{}-easy", n));
            expected.push(format!("synth-{}-hard", n));
        }
        expected.sort();
        assert_eq!(registry.names(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_synth_entries_match_profiles() {
        let registry = get_registry(&DatasetConfig::default()).unwrap();
        match registry.get("synth-1024-hard") {
            Some(Loader::Synthetic(spec)) => {
                assert_eq!(spec.n_features, 1024);
                assert_eq!(spec.n_informative, 256);
                assert_eq!(spec.n_redundant, 512);
                assert_eq!(spec.class_sep, 0.01);
                assert_eq!(spec.n_datapoints, 3000);
            }
            other => panic!("unexpected loader {:?}", other),
        }
        match registry.get("synth-8-easy") {
            Some(Loader::Synthetic(spec)) => {
                assert_eq!((spec.n_informative, spec.n_redundant), (8, 0));
                assert_eq!(spec.class_sep, 0.5);
            }
            other => panic!("unexpected loader {:?}", other),
        }
    }

    #[test]
    fn test_paths_come_from_config() {
        let config = DatasetConfig::with_data_dir("/srv/datasets");
        let registry = get_registry(&config).unwrap();
        assert_eq!(
            registry.get("sonar"),
            Some(&Loader::File {
                dataset: FileDataset::Sonar,
                data_dir: PathBuf::from("/srv/datasets"),
            })
        );
    }

    #[test]
    fn test_load_through_registry() {
        let dir = scratch_dir("registry");
        fs::write(dir.join("ionosphere.csv"), "1,0,0.99,1\n1,0,1.0,0\n").unwrap();
        let registry = get_registry(&DatasetConfig::with_data_dir(&dir)).unwrap();

        let (x, y) = registry.load("ionosphere").unwrap();
        assert_eq!(x.shape_vec(), vec![2, 3]);
        assert_eq!(y.data(), &[1.0, 0.0]);

        // Loaders are re-invocable.
        let (x2, _) = registry.load_id(DatasetId::Ionosphere).unwrap();
        assert_eq!(x, x2);
    }

    #[test]
    fn test_reference_entries_load_two_classes() {
        let dir = scratch_dir("registry");
        fs::write(
            dir.join("iris.csv"),
            "6,4,setosa,versicolor,virginica\n5.1,3.5,1.4,0.2,0\n4.9,3.0,1.4,0.2,0\n\
             7.0,3.2,4.7,1.4,1\n6.4,3.2,4.5,1.5,1\n6.3,3.3,6.0,2.5,2\n5.8,2.7,5.1,1.9,2\n",
        )
        .unwrap();
        fs::write(
            dir.join("wine_data.csv"),
            "4,3,class_0,class_1,class_2\n14.23,1.71,2.43,0\n12.37,0.94,1.36,1\n\
             12.86,1.35,2.32,2\n13.2,1.78,2.14,0\n",
        )
        .unwrap();
        let config = DatasetConfig {
            reference_dir: dir,
            download_reference: false,
            ..DatasetConfig::default()
        };
        let registry = get_registry(&config).unwrap();

        let (x, y) = registry.load("iris-2d").unwrap();
        assert_eq!(x.shape_vec(), vec![4, 4]);
        assert_eq!(y.data(), &[0.0, 0.0, 1.0, 1.0]);

        let (x, y) = registry.load_id(DatasetId::Wine2d).unwrap();
        assert_eq!(x.nrows().unwrap(), 3);
        assert!(y.data().iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_synthetic_entry_generates() {
        let registry = get_registry(&DatasetConfig::default()).unwrap();
        let (x, y) = registry.load("synth-8-easy").unwrap();
        assert_eq!(x.shape_vec(), vec![3000, 8]);
        assert_eq!(y.numel(), 3000);

        let small = Registry::builder()
            .register(
                "tiny",
                Loader::Synthetic(SynthSpec::profile(16, Difficulty::Hard).with_datapoints(40)),
            )
            .unwrap()
            .build();
        let (x, _) = small.load("tiny").unwrap();
        assert_eq!(x.shape_vec(), vec![40, 16]);
    }

    #[test]
    fn test_unknown_name() {
        let registry = get_registry(&DatasetConfig::default()).unwrap();
        assert!(registry.get("mnist").is_none());
        assert!(matches!(
            registry.load("synth-9-easy"),
            Err(DatasetError::UnknownDataset(_))
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let spec = SynthSpec::profile(8, Difficulty::Easy);
        let result = Registry::builder()
            .register("a", Loader::Synthetic(spec.clone()))
            .and_then(|b| b.register("a", Loader::Synthetic(spec)));
        assert!(matches!(result, Err(DatasetError::DuplicateDataset(name)) if name == "a"));
    }

    #[test]
    fn test_dataset_id_round_trip_names() {
        for id in DatasetId::standard() {
            assert_eq!(id.name().parse::<DatasetId>().unwrap(), id);
        }
        assert!("synth-64-medium".parse::<DatasetId>().is_err());
        assert!("synth-7-easy".parse::<DatasetId>().is_err());
        assert!("iris-3d".parse::<DatasetId>().is_err());
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
