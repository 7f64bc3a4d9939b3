use serde::{Deserialize, Serialize};

/// One decoded unit of streamed text, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    pub title: Option<String>,
    pub body: String,
    pub candidate_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHint {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// An anchor element observed by a rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAnchor {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    pub major: u32,
    pub minor: Option<u32>,
}

/// Group identity in the navigation tree. `CatchAll` sorts after every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Section(u32),
    CatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTree {
    pub groups: Vec<NavGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavGroup {
    pub key: GroupKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<NavEntry>,
    pub entries: Vec<NavEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<u32>,
}

/// Output of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub pages: Vec<PageRecord>,
    pub navigation_tree: NavigationTree,
}
