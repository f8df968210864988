//! Configuration file support.
use std::{
    collections::BTreeMap,
    env, fmt,
    fs::{create_dir_all, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};
use toml_edit::{value, DocumentMut, Item, Table};

use crate::common::*;

/// Find the path to our configuration directory.
pub(crate) fn config_dir() -> Result<PathBuf> {
    // Use `var_os` instead of `var`, because if it returns a non-Unicode path,
    // we can hand it off directly to `PathBuf`.
    match env::var_os("DATASTEP_CONFIG_DIR") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(dirs::config_dir()
            // AFAIK, this only fails under weird conditions, such as no home
            // directory.
            .ok_or_else(|| format_err!("could not find user config dir"))?
            .join("datastep")),
    }
}

/// Find the path to our configuration file.
pub(crate) fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("datastep.toml"))
}

/// A configuration file key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Key {
    /// The datastore that `register` downloads from by default.
    DefaultDatastore,
    /// Where to create scratch directories.
    ScratchDir,
    /// The locator of a named input dataset.
    Input(String),
}

impl Key {
    /// The name of the table containing input datasets.
    const INPUTS: &'static str = "inputs";
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default_datastore" => Ok(Key::DefaultDatastore),
            "scratch_dir" => Ok(Key::ScratchDir),
            other => match other.strip_prefix("inputs.") {
                Some(name) if !name.is_empty() => Ok(Key::Input(name.to_owned())),
                _ => Err(format_err!("unknown configuration key {:?}", other)),
            },
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::DefaultDatastore => "default_datastore".fmt(f),
            Key::ScratchDir => "scratch_dir".fmt(f),
            Key::Input(name) => write!(f, "{}.{}", Key::INPUTS, name),
        }
    }
}

/// Our `datastep.toml` configuration file.
#[derive(Debug)]
pub(crate) struct Configuration {
    /// The path from which we read this file.
    path: PathBuf,
    /// Our raw configuration data.
    doc: DocumentMut,
}

// We use `toml_edit` so that `datastep config set` can edit a file without
// losing the user's comments or layout.
impl Configuration {
    /// Load our default configuration.
    pub(crate) fn try_default() -> Result<Self> {
        Self::from_path(&config_file()?)
    }

    /// Load the configuration file at `path`. A missing file is treated as an
    /// empty configuration.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(rdr) => Ok(Self::from_reader(path.to_owned(), rdr)
                .with_context(|| format!("could not read file {}", path.display()))?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self {
                path: path.to_owned(),
                doc: DocumentMut::default(),
            }),
            Err(err) => {
                Err(err).context(format!("could not open file {}", path.display()))
            }
        }
    }

    /// Load a configuration file from the specified reader.
    fn from_reader<R>(path: PathBuf, mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;
        let doc = buf.parse::<DocumentMut>()?;
        Ok(Self { path, doc })
    }

    /// Write the configuration file to disk.
    pub(crate) fn write(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            format_err!("cannot find parent directory of {}", self.path.display())
        })?;
        create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
        let data = self.doc.to_string();
        let mut f = File::create(&self.path)
            .with_context(|| format!("cannot create {}", self.path.display()))?;
        f.write_all(data.as_bytes())
            .with_context(|| format!("error writing to {}", self.path.display()))?;
        f.flush()
            .with_context(|| format!("error writing to {}", self.path.display()))?;
        Ok(())
    }

    /// The default datastore locator, if one is configured.
    pub(crate) fn default_datastore(&self) -> Result<Option<String>> {
        self.string(&Key::DefaultDatastore)
    }

    /// The directory in which to create scratch directories, if configured.
    pub(crate) fn scratch_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self.string(&Key::ScratchDir)?.map(PathBuf::from))
    }

    /// All configured input datasets, by name.
    pub(crate) fn inputs(&self) -> Result<BTreeMap<String, String>> {
        let mut inputs = BTreeMap::new();
        if let Some(raw_inputs) = self.doc.as_table().get(Key::INPUTS) {
            let table = raw_inputs.as_table_like().ok_or_else(|| {
                format_err!(
                    "expected table for {}, found {:?} in {}",
                    Key::INPUTS,
                    raw_inputs,
                    self.path.display(),
                )
            })?;
            for (name, raw_value) in table.iter() {
                let locator = raw_value.as_str().ok_or_else(|| {
                    format_err!(
                        "expected string for {}.{}, found {:?} in {}",
                        Key::INPUTS,
                        name,
                        raw_value,
                        self.path.display(),
                    )
                })?;
                inputs.insert(name.to_owned(), locator.to_owned());
            }
        }
        Ok(inputs)
    }

    /// Get the string value of `key`, if present.
    pub(crate) fn string(&self, key: &Key) -> Result<Option<String>> {
        let raw_value = match key {
            Key::Input(name) => return Ok(self.inputs()?.remove(name)),
            _ => self.doc.as_table().get(&key.to_string()),
        };
        match raw_value {
            None => Ok(None),
            Some(raw_value) => match raw_value.as_str() {
                Some(s) => Ok(Some(s.to_owned())),
                None => Err(format_err!(
                    "expected string for {}, found {:?} in {}",
                    key,
                    raw_value,
                    self.path.display(),
                )),
            },
        }
    }

    /// Set `key` to the string `new_value`, replacing any existing value.
    pub(crate) fn set_string(&mut self, key: &Key, new_value: &str) -> Result<()> {
        match key {
            Key::Input(name) => {
                self.inputs_table_mut()?[name.as_str()] = value(new_value);
            }
            _ => {
                self.doc[key.to_string().as_str()] = value(new_value);
            }
        }
        Ok(())
    }

    /// Remove `key`, if present.
    pub(crate) fn remove(&mut self, key: &Key) -> Result<()> {
        match key {
            Key::Input(name) => {
                self.inputs_table_mut()?.remove(name);
            }
            _ => {
                self.doc.as_table_mut().remove(&key.to_string());
            }
        }
        Ok(())
    }

    /// Get our `[inputs]` table in mutable form, creating it if needed.
    fn inputs_table_mut(&mut self) -> Result<&mut Table> {
        let path = self.path.display().to_string();
        let item = self
            .doc
            .as_table_mut()
            .entry(Key::INPUTS)
            .or_insert(Item::Table(Table::new()));
        item.as_table_mut().ok_or_else(|| {
            format_err!("expected table for {} in {}", Key::INPUTS, path)
        })
    }
}
