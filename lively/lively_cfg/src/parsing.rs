use super::value::Cfg_Value;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;
use std::vec::Vec;

const HEADER_SEPARATOR: char = '/';
const COMMENT_START: char = '#';

#[derive(Debug, Clone, PartialEq)]
pub struct Cfg_Entry {
    pub key: String,
    pub value: Cfg_Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cfg_Section {
    pub header: String,
    pub entries: Vec<Cfg_Entry>,
}

pub(super) fn parse_config_dir(dir_path: &Path) -> std::io::Result<Vec<Cfg_Section>> {
    if dir_path.is_dir() {
        let mut sections = vec![];
        let mut n_parsed = 0;
        let mut paths = fs::read_dir(dir_path)?
            .filter_map(|entry| match entry {
                Ok(e) => Some(e.path()),
                Err(err) => {
                    lwarn!("Failed to read entry of {:?}: {}", dir_path, err);
                    None
                }
            })
            .filter(|path| path.extension() == Some(OsStr::new("cfg")))
            .collect::<Vec<_>>();
        // Later files override earlier ones, so make the order deterministic.
        paths.sort();
        for path in paths {
            n_parsed += 1;
            sections.append(&mut parse_config_file(&path)?);
        }
        lverbose!("Parsed {} cfg files.", n_parsed);
        Ok(sections)
    } else {
        parse_config_file(dir_path)
    }
}

fn parse_config_file(path: &Path) -> std::io::Result<Vec<Cfg_Section>> {
    let file = File::open(path)?;
    let lines = BufReader::new(file).lines().filter_map(|l| l.ok());
    Ok(parse_lines(lines, path))
}

pub(super) fn parse_lines(lines: impl Iterator<Item = String>, path: &Path) -> Vec<Cfg_Section> {
    let mut sections = vec![];
    let mut cur_section = Cfg_Section {
        header: String::from(""),
        entries: vec![],
    };

    let lines = lines.map(|mut line| {
        if let Some(comment_start) = line.find(COMMENT_START) {
            line.truncate(comment_start);
        }
        line
    });

    for (lineno, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(HEADER_SEPARATOR) {
            if !cur_section.header.is_empty() {
                sections.push(cur_section);
                cur_section = Cfg_Section {
                    header: String::from(""),
                    entries: vec![],
                };
            }
            cur_section.header = String::from(header.trim());
        } else if cur_section.header.is_empty() {
            lwarn!(
                "Line {} in file {:?} is outside any section: `{}`",
                lineno + 1,
                path,
                line
            );
        } else {
            let (key, val) = match line.find(char::is_whitespace) {
                Some(idx) => (&line[..idx], &line[idx..]),
                None => (line, ""),
            };
            cur_section.entries.push(Cfg_Entry {
                key: String::from(key),
                value: parse_value(val.trim_start()),
            });
        }
    }
    if !cur_section.header.is_empty() {
        sections.push(cur_section);
    }

    sections
}

pub(super) fn parse_value(raw: &str) -> Cfg_Value {
    if raw.is_empty() {
        Cfg_Value::Nil
    } else if let Ok(v) = raw.parse::<i32>() {
        Cfg_Value::Int(v)
    } else if let Ok(v) = raw.parse::<f32>() {
        Cfg_Value::Float(v)
    } else if let Ok(v) = raw.parse::<bool>() {
        Cfg_Value::Bool(v)
    } else {
        Cfg_Value::String(String::from(raw))
    }
}
