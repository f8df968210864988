//! The context of a single pipeline run.

use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
    process,
};

use crate::common::*;
use crate::config::Configuration;
use crate::datastore::DatastoreLocator;
use crate::locate::{locate_csv, LocatePolicy};
use crate::scratch::ScratchDir;
use crate::table::Table;

/// Environment variable naming the default datastore.
const DEFAULT_DATASTORE_VAR: &str = "DATASTEP_DEFAULT_DATASTORE";

/// Prefix of environment variables naming input datasets.
const INPUT_VAR_PREFIX: &str = "DATASTEP_INPUT_";

/// Everything a step needs to know about the run it belongs to. This is
/// built once in `main` and passed to each step.
#[derive(Clone, Debug)]
pub(crate) struct RunContext {
    /// An identifier for this run, used in logs.
    run_id: String,
    /// Where `register` downloads from, if configured.
    default_datastore: Option<DatastoreLocator>,
    /// Named input datasets, mapped to dataset locators.
    inputs: BTreeMap<String, String>,
    /// Where to create scratch directories. Defaults to the system temp dir.
    scratch_parent: Option<PathBuf>,
}

impl RunContext {
    /// Create an empty context, with no datastore and no inputs.
    pub(crate) fn new<S: Into<String>>(run_id: S) -> Self {
        Self {
            run_id: run_id.into(),
            default_datastore: None,
            inputs: BTreeMap::new(),
            scratch_parent: None,
        }
    }

    /// Build a context from our configuration file and the process
    /// environment.
    pub(crate) fn from_config(
        config: &Configuration,
        run_id: Option<String>,
    ) -> Result<Self> {
        Self::from_config_and_vars(config, run_id, env::vars())
    }

    /// Build a context from our configuration file, overridden by `vars`.
    fn from_config_and_vars<I>(
        config: &Configuration,
        run_id: Option<String>,
        vars: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let run_id = run_id.unwrap_or_else(|| format!("local-{}", process::id()));
        let mut ctx = Self::new(run_id);
        ctx.scratch_parent = config.scratch_dir()?;
        if let Some(locator) = config.default_datastore()? {
            ctx.set_default_datastore(locator.parse()?);
        }
        ctx.inputs = config.inputs()?;

        for (name, value) in vars {
            if name == DEFAULT_DATASTORE_VAR {
                let locator = value
                    .parse()
                    .with_context(|| format!("error parsing {}", DEFAULT_DATASTORE_VAR))?;
                ctx.set_default_datastore(locator);
            } else if let Some(input) = name.strip_prefix(INPUT_VAR_PREFIX) {
                if !input.is_empty() {
                    ctx.set_input(&input.to_ascii_lowercase(), &value);
                }
            }
        }
        Ok(ctx)
    }

    /// The identifier of this run.
    pub(crate) fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Replace the default datastore.
    pub(crate) fn set_default_datastore(&mut self, locator: DatastoreLocator) {
        self.default_datastore = Some(locator);
    }

    /// Point the input dataset `name` at `locator`.
    pub(crate) fn set_input(&mut self, name: &str, locator: &str) {
        self.inputs.insert(name.to_owned(), locator.to_owned());
    }

    /// Set the directory in which scratch directories are created.
    #[cfg(test)]
    pub(crate) fn set_scratch_parent(&mut self, parent: PathBuf) {
        self.scratch_parent = Some(parent);
    }

    /// The datastore for this run.
    pub(crate) fn default_datastore(&self) -> Result<&DatastoreLocator> {
        self.default_datastore.as_ref().ok_or_else(|| {
            format_err!(
                "no default datastore for run {}; pass --datastore, set {} or run `datastep config set default_datastore LOCATOR`",
                self.run_id,
                DEFAULT_DATASTORE_VAR,
            )
        })
    }

    /// Create a new scratch directory, deleted when dropped.
    pub(crate) fn scratch_dir(&self) -> Result<ScratchDir> {
        ScratchDir::create(self.scratch_parent.as_deref())
    }

    /// Look up the locator of the input dataset `name`.
    pub(crate) fn input_locator(&self, name: &str) -> Result<&str> {
        self.inputs.get(name).map(|s| &s[..]).ok_or_else(|| {
            format_err!(
                "run {} has no input dataset named {:?}; pass --input {}=LOCATOR or set {}{}",
                self.run_id,
                name,
                name,
                INPUT_VAR_PREFIX,
                name.to_ascii_uppercase(),
            )
        })
    }

    /// Load the input dataset `name` into memory.
    ///
    /// A dataset locator may be a CSV file, a local directory containing one
    /// CSV file, or a `gs://` or `s3://` prefix containing one CSV file.
    #[instrument(level = "debug", skip(self), fields(run_id = %self.run_id))]
    pub(crate) async fn load_input(&self, name: &str) -> Result<Table> {
        let locator = self.input_locator(name)?;
        debug!("input {:?} is {}", name, locator);
        let table = match DatastoreLocator::split_object_url(locator)? {
            Some((datastore, prefix)) => {
                let scratch = self.scratch_dir()?;
                let store = datastore.connect().await?;
                store
                    .download_prefix(&prefix, scratch.path())
                    .await
                    .with_context(|| format!("could not download {}", locator))?;
                let root = scratch.path().to_owned();
                let table = spawn_blocking(move || load_local_dataset(&root)).await?;
                scratch.close()?;
                table
            }
            None => {
                let path = PathBuf::from(locator);
                spawn_blocking(move || load_local_dataset(&path)).await?
            }
        };
        info!(
            "loaded input {:?} with {} rows and {} columns",
            name,
            table.row_count(),
            table.column_count(),
        );
        Ok(table)
    }
}

/// Load a CSV file, or the CSV file inside a directory.
fn load_local_dataset(path: &Path) -> Result<Table> {
    if path.is_dir() {
        let csv_path = locate_csv(path, LocatePolicy::FirstMatch)?;
        Table::read_csv_path(&csv_path)
    } else {
        Table::read_csv_path(path)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::fs;

    use super::*;
    use crate::config::Key;
    use crate::locate::LocateError;

    fn empty_config(dir: &Path) -> Configuration {
        Configuration::from_path(&dir.join("datastep.toml")).unwrap()
    }

    #[test]
    fn environment_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = empty_config(dir.path());
        config
            .set_string(&Key::DefaultDatastore, "gs://configured/")
            .unwrap();
        config
            .set_string(&Key::Input("uploaded_data".to_owned()), "/from/config.csv")
            .unwrap();
        config
            .set_string(&Key::Input("other".to_owned()), "/other.csv")
            .unwrap();

        let vars = vec![
            ("DATASTEP_DEFAULT_DATASTORE".to_owned(), "s3://env/".to_owned()),
            ("DATASTEP_INPUT_UPLOADED_DATA".to_owned(), "/from/env.csv".to_owned()),
            ("DATASTEP_INPUT_".to_owned(), "/ignored.csv".to_owned()),
            ("HOME".to_owned(), "/root".to_owned()),
        ];
        let ctx =
            RunContext::from_config_and_vars(&config, Some("run-7".to_owned()), vars)
                .unwrap();
        assert_eq!(ctx.run_id(), "run-7");
        assert_eq!(ctx.default_datastore().unwrap().to_string(), "s3://env/");
        assert_eq!(ctx.input_locator("uploaded_data").unwrap(), "/from/env.csv");
        assert_eq!(ctx.input_locator("other").unwrap(), "/other.csv");
    }

    #[test]
    fn missing_values_are_named_in_errors() {
        let ctx = RunContext::new("run-1");
        let err = ctx.default_datastore().unwrap_err();
        assert!(err.to_string().contains("--datastore"));
        let err = ctx.input_locator("uploaded_data").unwrap_err();
        assert!(err.to_string().contains("DATASTEP_INPUT_UPLOADED_DATA"));
    }

    #[test]
    fn invalid_datastore_in_environment_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = empty_config(dir.path());
        let vars = vec![(
            "DATASTEP_DEFAULT_DATASTORE".to_owned(),
            "ftp://nope/".to_owned(),
        )];
        assert!(RunContext::from_config_and_vars(&config, None, vars).is_err());
    }

    #[tokio::test]
    async fn load_input_from_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("data").join("input.csv");
        fs::create_dir_all(csv_path.parent().unwrap()).unwrap();
        fs::write(&csv_path, "id,value\n1,a\n2,b\n").unwrap();

        let mut ctx = RunContext::new("run-1");
        ctx.set_input("by_file", csv_path.to_str().unwrap());
        ctx.set_input("by_dir", dir.path().to_str().unwrap());

        let by_file = ctx.load_input("by_file").await.unwrap();
        let by_dir = ctx.load_input("by_dir").await.unwrap();
        assert_eq!(by_file, by_dir);
        assert_eq!(by_file.headers(), &["id".to_owned(), "value".to_owned()]);
        assert_eq!(by_file.row_count(), 2);
    }

    #[tokio::test]
    async fn load_input_from_directory_without_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();
        let mut ctx = RunContext::new("run-1");
        ctx.set_input("uploaded_data", dir.path().to_str().unwrap());
        let err = ctx.load_input("uploaded_data").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocateError>(),
            Some(LocateError::NoMatchingFile { .. }),
        ));
    }
}
