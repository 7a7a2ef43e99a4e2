use super::parsing::{self, Cfg_Section};
use super::value::Cfg_Value;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::path::Path;

/// Flat table of `section/key` -> value, built from one or more `.cfg` files.
#[derive(Default, Debug)]
pub struct Config {
    cfg_var_table: HashMap<String, Cfg_Value>,
}

impl Config {
    pub fn new_from_dir(dir_path: &Path) -> std::io::Result<Config> {
        let start_t = std::time::Instant::now();
        let sections = parsing::parse_config_dir(dir_path)?;
        let config = Self::new_from_sections(sections);

        lok!(
            "Loaded cfg {:?} ({} vars) in {} ms.",
            dir_path,
            config.cfg_var_table.len(),
            start_t.elapsed().as_secs_f32() * 1000.0,
        );

        Ok(config)
    }

    pub fn new_from_sections(sections: Vec<Cfg_Section>) -> Config {
        let mut cfg_var_table = HashMap::new();
        // Flatten section/entries into paths
        for section in sections.into_iter() {
            for entry in section.entries.into_iter() {
                let name = format!("{}/{}", section.header, entry.key);
                lverbose!("Loading cfg var {} = {:?}", name, entry.value);
                cfg_var_table.insert(name, entry.value);
            }
        }
        Config { cfg_var_table }
    }

    pub fn read_cfg(&self, path: &str) -> Option<&Cfg_Value> {
        self.cfg_var_table.get(path)
    }

    /// Returns None if the var doesn't exist; warns and returns None if it has the wrong type.
    pub fn read<T>(&self, path: &str) -> Option<T>
    where
        T: TryFrom<Cfg_Value>,
    {
        let value = self.read_cfg(path)?;
        match T::try_from(value.clone()) {
            Ok(v) => Some(v),
            Err(_) => {
                lwarn!(
                    "Cfg_Var {} has incompatible value {:?} (expected {})",
                    path,
                    value,
                    std::any::type_name::<T>()
                );
                None
            }
        }
    }

    pub fn read_or<T>(&self, path: &str, default: T) -> T
    where
        T: TryFrom<Cfg_Value>,
    {
        self.read(path).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.cfg_var_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cfg_var_table.is_empty()
    }
}
