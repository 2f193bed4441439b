//! Navigation tree for the generated docs.
//!
//! Built in two passes: [`build_nav_tree`] walks a directory of generated
//! HTML fragments into a [`NavFolder`] that mirrors the folder structure, and
//! [`render_nav`] turns that tree into markup:
//!
//! ```text
//! src/                                 (root: no wrapper)
//! ├── homepage.html        →  <a class="link_not_selected" href="src/homepage.html">homepage</a>
//! └── project/             →  <button class="collapsible">project</button>
//!     ├── common.html          <div class="collapsible_content">
//!     └── keywords/              <a ... href="src/project/common.html">common</a>
//!         └── login.html         <button class="collapsible">keywords</button>
//!                                <div class="collapsible_content"> ... </div>
//!                              </div>
//! ```
//!
//! Entries are sorted by file name at every level. Link targets are made
//! relative to a caller-supplied base directory (the folder that holds the
//! TOC page), not to the walked directory.

use maud::{Markup, html};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::path::{Component, Path};
use walkdir::WalkDir;

/// A link to one generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    /// File name without `.html`.
    pub label: String,
    /// Path relative to the link base, `/`-separated.
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEntry {
    Link(NavLink),
    Folder(NavFolder),
}

/// One directory level of the navigation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavFolder {
    pub label: String,
    pub entries: Vec<NavEntry>,
}

impl NavFolder {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Walk down to the nested folder named by `names`, creating missing
    /// levels on the way.
    fn folder_mut<'a>(&mut self, mut names: impl Iterator<Item = &'a str>) -> &mut NavFolder {
        let Some(name) = names.next() else {
            return self;
        };
        let pos = self
            .entries
            .iter()
            .position(|e| matches!(e, NavEntry::Folder(f) if f.label == name));
        let idx = match pos {
            Some(idx) => idx,
            None => {
                self.entries.push(NavEntry::Folder(NavFolder::new(name)));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[idx] {
            NavEntry::Folder(folder) => folder.folder_mut(names),
            NavEntry::Link(_) => unreachable!("index points at a folder"),
        }
    }

    /// Number of links at any depth.
    pub fn link_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e {
                NavEntry::Link(_) => 1,
                NavEntry::Folder(f) => f.link_count(),
            })
            .sum()
    }

    /// Number of folders at any depth, not counting `self`.
    pub fn folder_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e {
                NavEntry::Link(_) => 0,
                NavEntry::Folder(f) => 1 + f.folder_count(),
            })
            .sum()
    }
}

/// Collect every `.html` file below `dir` into a tree, with hrefs relative
/// to `link_base`.
pub fn build_nav_tree(dir: &Path, link_base: &Path) -> Result<NavFolder, walkdir::Error> {
    let label = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut root = NavFolder::new(label);

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy();
        let parents: Vec<String> = relative
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let parents = parents.iter().map(String::as_str);

        if entry.file_type().is_dir() {
            root.folder_mut(parents).folder_mut(std::iter::once(name.as_ref()));
        } else if let Some(stem) = name.strip_suffix(".html") {
            let link = NavLink {
                label: stem.to_string(),
                href: relative_href(entry.path(), link_base),
            };
            root.folder_mut(parents).entries.push(NavEntry::Link(link));
        }
    }

    Ok(root)
}

/// Render the tree. The root folder itself gets no wrapper.
pub fn render_nav(root: &NavFolder) -> Markup {
    render_entries(&root.entries)
}

fn render_entries(entries: &[NavEntry]) -> Markup {
    html! {
        @for entry in entries {
            @match entry {
                NavEntry::Link(link) => {
                    a class="link_not_selected" href=(link.href) target="targetFrame" { (link.label) }
                }
                NavEntry::Folder(folder) => {
                    button class="collapsible" type="button" { (folder.label) }
                    div class="collapsible_content" {
                        (render_entries(&folder.entries))
                    }
                }
            }
        }
    }
}

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// `path` relative to `base` as a `/`-separated URL path, each segment
/// percent-encoded. Both are expected to be absolute.
pub fn relative_href(path: &Path, base: &Path) -> String {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = path
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = base[common..]
        .iter()
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|_| "..".to_string());
    let downs = path[common..]
        .iter()
        .map(|c| utf8_percent_encode(&c.as_os_str().to_string_lossy(), SEGMENT).to_string());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}
