//! Site assembly: conflict detection and atomic publishing.
//!
//! ```text
//! rendered pages ─┐
//! static files  ──┼──► check_conflicts() ──► write into .public.staging/ ──► swap ──► public/
//! content assets ─┘
//! ```
//!
//! Nothing is written before every output path is known to be unique, and the
//! previous output stays in place until the staging tree is complete.
//!
//! Every build records the files it generated in [`MANIFEST`]. Files of the
//! previous output that are neither produced again nor listed in the previous
//! manifest (a `CNAME`, a `.git` directory) are carried into the new tree.

use crate::{
    config::SiteConfig,
    error::{Error, Result},
    log,
    utils::{minify::minify, slug::slugify},
};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::{OsStr, OsString},
    fs, io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Markdown extensions; such files under the content root are pages, not assets.
const MARKDOWN: &[&str] = &["md", "markdown"];

/// Generated files of the last build, relative to the output root.
pub const MANIFEST: &str = ".quire-manifest";

/// What gets written to one output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Html(String),
    /// Copy this file verbatim.
    Copy(PathBuf),
}

/// One file of the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Relative to the output root.
    pub output: PathBuf,
    /// Content file, listing or static file it came from.
    pub source_name: String,
    pub body: Body,
}

impl OutputFile {
    pub fn html(output: PathBuf, source_name: impl Into<String>, html: String) -> Self {
        Self {
            output,
            source_name: source_name.into(),
            body: Body::Html(html),
        }
    }
}

/// Counts of a published build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub pages: usize,
    pub copied: usize,
    /// Files kept from the previous output because this build does not produce them.
    pub carried: usize,
}

/// Files under `[build] static`, copied to the same relative path.
pub fn static_files(config: &SiteConfig) -> Result<Vec<OutputFile>> {
    let root = &config.build.static_dir;
    if !root.is_dir() {
        return Ok(vec![]);
    }
    Ok(walk_files(root, false, |_| true)?
        .into_iter()
        .map(|relative| OutputFile {
            source_name: format!("static/{}", slash_path(&relative)),
            body: Body::Copy(root.join(&relative)),
            output: relative,
        })
        .collect())
}

/// Non-Markdown files under the content root (images next to a post, ...).
///
/// Directory names go through the same slug mode as page URLs, so
/// `posts/hello/index.md` and `posts/hello/cover.png` end up side by side.
pub fn content_assets(config: &SiteConfig) -> Result<Vec<OutputFile>> {
    let root = &config.build.content;
    let mode = config.build.slug.path;
    let files = walk_files(root, false, |path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_none_or(|ext| !MARKDOWN.contains(&ext))
    })?;

    Ok(files
        .into_iter()
        .map(|relative| {
            let mut output: PathBuf = relative
                .parent()
                .into_iter()
                .flat_map(Path::components)
                .map(|dir| slugify(&dir.as_os_str().to_string_lossy(), mode))
                .collect();
            if let Some(name) = relative.file_name() {
                output.push(name);
            }
            OutputFile {
                source_name: slash_path(&relative),
                body: Body::Copy(root.join(&relative)),
                output,
            }
        })
        .collect())
}

/// Fail with `OutputConflict` if two files share an output path.
pub fn check_conflicts(files: &[OutputFile]) -> Result<()> {
    let mut seen: BTreeMap<&Path, &str> = BTreeMap::new();
    for file in files {
        if let Some(first) = seen.insert(&file.output, &file.source_name) {
            return Err(Error::OutputConflict {
                output: file.output.clone(),
                first: first.to_owned(),
                second: file.source_name.clone(),
            });
        }
    }
    Ok(())
}

/// Write `files` into a staging directory and swap it in as the output directory.
///
/// Without `[build] clean`, files of the previous output that this build
/// does not produce are carried over.
pub fn publish(config: &SiteConfig, files: &[OutputFile]) -> Result<PublishReport> {
    check_conflicts(files)?;

    let output = &config.build.output;
    let staging = sibling(output, "staging");
    let retired = sibling(output, "old");

    for dir in [&staging, &retired] {
        remove_dir_if_exists(dir)?;
    }
    fs::create_dir_all(&staging).map_err(|err| Error::io(&staging, err))?;

    let written = files
        .par_iter()
        .try_for_each(|file| write_file(config, &staging, file))
        .and_then(|()| write_manifest(&staging, files));
    if let Err(err) = written {
        let _ = fs::remove_dir_all(&staging);
        return Err(err);
    }

    let carried = if !config.build.clean && output.is_dir() {
        let mut generated = read_manifest(output);
        generated.extend(files.iter().map(|f| f.output.clone()));
        carry_over(output, &staging, &generated)?
    } else {
        0
    };

    swap(&staging, output, &retired)?;

    let pages = files
        .iter()
        .filter(|f| matches!(f.body, Body::Html(_)))
        .count();
    Ok(PublishReport {
        pages,
        copied: files.len() - pages,
        carried,
    })
}

fn write_file(config: &SiteConfig, staging: &Path, file: &OutputFile) -> Result<()> {
    let dest = staging.join(&file.output);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    match &file.body {
        Body::Html(html) => {
            fs::write(&dest, minify(html, config).as_bytes()).map_err(|err| Error::io(&dest, err))
        }
        Body::Copy(source) => fs::copy(source, &dest)
            .map(|_| ())
            .map_err(|err| Error::io(source, err)),
    }
}

/// Record the outputs of this build as a JSON array of `/`-separated paths.
fn write_manifest(staging: &Path, files: &[OutputFile]) -> Result<()> {
    let paths: BTreeSet<String> = files.iter().map(|f| slash_path(&f.output)).collect();
    let path = staging.join(MANIFEST);
    let json = serde_json::to_string_pretty(&paths)
        .map_err(|err| Error::io(&path, io::Error::other(err)))?;
    fs::write(&path, json).map_err(|err| Error::io(&path, err))
}

/// Outputs generated by the previous build; empty when it left no readable manifest.
fn read_manifest(output: &Path) -> BTreeSet<PathBuf> {
    let path = output.join(MANIFEST);
    let Ok(text) = fs::read_to_string(&path) else {
        return BTreeSet::new();
    };
    match serde_json::from_str::<Vec<String>>(&text) {
        Ok(paths) => paths.into_iter().map(PathBuf::from).collect(),
        Err(err) => {
            log!("warn"; "ignoring unreadable {}: {err}", path.display());
            BTreeSet::new()
        }
    }
}

/// Copy files of the old output that no build generated.
fn carry_over(output: &Path, staging: &Path, generated: &BTreeSet<PathBuf>) -> Result<usize> {
    let mut carried = 0;
    for relative in walk_files(output, true, |_| true)? {
        if relative == Path::new(MANIFEST) || generated.contains(&relative) {
            continue;
        }
        let dest = staging.join(&relative);
        if dest.exists() {
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        fs::copy(output.join(&relative), &dest).map_err(|err| Error::io(&dest, err))?;
        carried += 1;
    }
    if carried > 0 {
        log!("build"; "kept {carried} files from previous output");
    }
    Ok(carried)
}

/// Replace `output` with `staging`, restoring the old tree if the swap fails.
fn swap(staging: &Path, output: &Path, retired: &Path) -> Result<()> {
    let had_output = output.exists();
    if had_output {
        fs::rename(output, retired).map_err(|err| Error::io(output, err))?;
    }
    if let Err(err) = fs::rename(staging, output) {
        if had_output {
            let _ = fs::rename(retired, output);
        }
        return Err(Error::io(output, err));
    }
    if had_output {
        remove_dir_if_exists(retired)?;
    }
    Ok(())
}

/// `public` → `.public.<suffix>` next to it.
fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output.file_name().unwrap_or_else(|| OsStr::new("output")));
    name.push(".");
    name.push(suffix);
    output.with_file_name(name)
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(Error::io(dir, err)),
        _ => Ok(()),
    }
}

/// Relative paths of files under `root` accepted by `keep`, sorted.
fn walk_files(root: &Path, hidden: bool, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            hidden
                || entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        });
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            Error::io(path, io::Error::other(err))
        })?;
        if !entry.file_type().is_file() || !keep(entry.path()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
