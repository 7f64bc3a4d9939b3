use std::collections::HashMap;

use crate::formats::ContentFragment;
use crate::fragment::heading_title;

/// Merged pages shorter than this (in characters) are dropped.
pub const MIN_PAGE_CHARS: usize = 100;

/// All fragments sharing one title, merged and cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCandidate {
    pub title: String,
    pub content: String,
    /// First filename candidate seen among the group's fragments.
    pub candidate_filename: Option<String>,
}

#[derive(Debug)]
struct Group {
    title: String,
    bodies: Vec<String>,
    candidate_filename: Option<String>,
}

/// Groups fragments by title in first-encounter order and merges each group.
pub fn aggregate(fragments: impl IntoIterator<Item = ContentFragment>) -> Vec<PageCandidate> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index_by_title: HashMap<String, usize> = HashMap::new();
    let mut untitled = 0usize;

    for fragment in fragments {
        let Some(title) = fragment.title else {
            untitled += 1;
            continue;
        };

        let idx = *index_by_title.entry(title.clone()).or_insert_with(|| {
            groups.push(Group {
                title,
                bodies: Vec::new(),
                candidate_filename: None,
            });
            groups.len() - 1
        });
        let group = &mut groups[idx];
        group.bodies.push(fragment.body);
        if group.candidate_filename.is_none() {
            group.candidate_filename = fragment.candidate_filename;
        }
    }

    if untitled > 0 {
        tracing::debug!(untitled, "discarded fragments without a title");
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let merged = group.bodies.join("\n");
            let content = clean_merged_content(&group.title, &merged);
            if content.chars().count() <= MIN_PAGE_CHARS {
                tracing::debug!(title = %group.title, "dropping page with too little content");
                return None;
            }
            Some(PageCandidate {
                title: group.title,
                content,
                candidate_filename: group.candidate_filename,
            })
        })
        .collect()
}

/// Drops repeated copies of the page heading and raw data lines.
///
/// Lines inside fenced code blocks are kept verbatim.
pub fn clean_merged_content(title: &str, merged: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;
    let mut seen_title = false;

    for line in merged.split('\n') {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line);
            continue;
        }
        if in_code_block {
            lines.push(line);
            continue;
        }

        if heading_title(trimmed) == Some(title) {
            if seen_title {
                continue;
            }
            seen_title = true;
        } else if is_data_noise(trimmed) {
            continue;
        }

        lines.push(line);
    }

    lines.join("\n").trim().to_owned()
}

fn is_data_noise(line: &str) -> bool {
    line.starts_with("{\"")
        || line.starts_with("[\"")
        || line.contains("\"ID\":")
        || (line.matches('"').count() > 6 && line.contains(':'))
}
