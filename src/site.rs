use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use scraper::{Html, Selector};
use url::Url;

use crate::formats::{Conversion, GroupKey, NavEntry, NavigationTree, PageRecord};
use crate::sources::{RepoInfo, rewrite_sources};

/// Suffix the source site appends to every page title.
pub const TITLE_SUFFIX: &str = " | DeepWiki";
pub const DEFAULT_TITLE: &str = "Documentation";
/// Slug of the page written when nothing could be extracted.
pub const PLACEHOLDER_SLUG: &str = "home";

/// Entries that do not make an output directory count as non-empty.
const IGNORED_ENTRIES: &[&str] = &[".DS_Store", "Thumbs.db", ".gitkeep", ".gitignore"];

static TITLE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["title", "h1"]
        .into_iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

/// What the generated site says about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub title: String,
    /// `owner/repo` from the site URL, or a single segment, or empty.
    pub project_name: String,
    pub url: String,
    pub path_parts: Vec<String>,
    pub repo: RepoInfo,
}

impl SiteInfo {
    pub fn from_markup(raw_markup: &str, url: &str) -> Self {
        let document = Html::parse_document(raw_markup);
        let title = TITLE_SELECTORS
            .iter()
            .find_map(|selector| {
                let text = document.select(selector).next()?.text().collect::<String>();
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (!text.is_empty()).then_some(text)
            })
            .map(|title| title.strip_suffix(TITLE_SUFFIX).unwrap_or(&title).to_owned())
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

        let path_parts = Url::parse(url)
            .map(|url| {
                url.path()
                    .split('/')
                    .filter(|part| !part.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let project_name = path_parts
            .iter()
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
            .join("/");

        let repo = RepoInfo::detect(raw_markup, &project_name);
        Self {
            title,
            project_name,
            url: url.to_owned(),
            path_parts,
            repo,
        }
    }

    /// Name shown in the site header and README.
    pub fn display_name(&self) -> &str {
        if self.project_name.is_empty() {
            &self.title
        } else {
            &self.project_name
        }
    }

    /// Directory of page files, relative to the site root.
    pub fn pages_dir(&self) -> String {
        match self.path_parts.as_slice() {
            [owner, repo, ..] => format!("pages/{owner}/{repo}"),
            _ => "pages".to_owned(),
        }
    }
}

/// Fails on a non-empty directory unless `force`, which clears it instead.
///
/// Hidden entries and common desktop/VCS droppings are ignored and never
/// removed.
pub fn prepare_output_dir(out_dir: &Path, force: bool) -> anyhow::Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }

    let existing = visible_entries(out_dir)?;
    if existing.is_empty() {
        return Ok(());
    }
    if !force {
        let names = existing
            .iter()
            .take(5)
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::bail!(
            "output directory is not empty: {} (found {names}); use --force to overwrite",
            out_dir.display()
        );
    }

    tracing::warn!(
        out = %out_dir.display(),
        entries = existing.len(),
        "clearing non-empty output directory"
    );
    for path in existing {
        if path.is_dir() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("remove directory: {}", path.display()))?;
        } else {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove file: {}", path.display()))?;
        }
    }
    Ok(())
}

fn visible_entries(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read directory: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("read directory entry: {}", dir.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || IGNORED_ENTRIES.contains(&name.as_ref()) {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// How [`write_site`] lays out the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Clear a non-empty output directory first.
    pub force: bool,
    /// Write one page tree per entry of [`LANGUAGES`] under its own directory.
    pub multilingual: bool,
}

/// Fixed text of one language's sidebar and README.
#[derive(Debug)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    home: &'static str,
    other_pages: &'static str,
    part: fn(u32) -> String,
    page_count: fn(usize) -> String,
    pages_heading: &'static str,
    links_heading: &'static str,
    source_site: &'static str,
    repository: &'static str,
    preview_heading: &'static str,
    generated: &'static str,
}

pub const ENGLISH: Language = Language {
    code: "en",
    name: "English",
    home: "Home",
    other_pages: "Other Pages",
    part: english_part,
    page_count: english_page_count,
    pages_heading: "Pages",
    links_heading: "Links",
    source_site: "Source site",
    repository: "Repository",
    preview_heading: "Local preview",
    generated: "Generated by wikidocify at",
};

pub const CHINESE: Language = Language {
    code: "zh-cn",
    name: "中文",
    home: "首页",
    other_pages: "其他页面",
    part: chinese_part,
    page_count: chinese_page_count,
    pages_heading: "文档页面",
    links_heading: "链接",
    source_site: "原始页面",
    repository: "源码仓库",
    preview_heading: "本地预览",
    generated: "由 wikidocify 生成于",
};

/// Languages written by a multilingual build, in output order.
pub const LANGUAGES: &[Language] = &[CHINESE, ENGLISH];

fn english_part(major: u32) -> String {
    format!("Part {major}")
}

fn english_page_count(count: usize) -> String {
    format!("This site contains **{count}** pages:")
}

fn chinese_part(major: u32) -> String {
    format!("第 {major} 部分")
}

fn chinese_page_count(count: usize) -> String {
    format!("本文档包含 **{count}** 个页面：")
}

/// Writes the docsify site for one conversion into `out_dir`.
pub fn write_site(
    out_dir: &Path,
    info: &SiteInfo,
    conversion: Conversion,
    options: WriteOptions,
) -> anyhow::Result<()> {
    prepare_output_dir(out_dir, options.force).context("check output directory")?;

    let Conversion {
        mut pages,
        mut navigation_tree,
    } = conversion;
    if pages.is_empty() {
        tracing::warn!(url = %info.url, "no pages extracted; writing placeholder page");
        pages.push(placeholder_page(info));
        navigation_tree = crate::toc::organize(&pages);
    }

    if options.multilingual {
        for language in LANGUAGES {
            let tree = LanguageTree {
                root: Some(language.code),
                language,
            };
            tree.write(out_dir, info, &pages, &navigation_tree)
                .with_context(|| format!("write {} pages", language.code))?;
        }
        write_file(&out_dir.join("_sidebar.md"), &render_language_sidebar())?;
        write_file(&out_dir.join("README.md"), &render_language_selection(info))?;
        write_file(
            &out_dir.join("index.html"),
            &render_multilingual_index_html(info.display_name()),
        )?;
    } else {
        let tree = LanguageTree {
            root: None,
            language: &ENGLISH,
        };
        tree.write(out_dir, info, &pages, &navigation_tree)?;
        write_file(&out_dir.join("index.html"), &render_index_html(info.display_name()))?;
    }
    write_file(&out_dir.join(".nojekyll"), "")?;

    let toc_yaml = serde_yaml::to_string(&navigation_tree).context("serialize navigation tree")?;
    write_file(&out_dir.join("toc.yaml"), &toc_yaml)?;

    tracing::info!(
        pages = pages.len(),
        out = %out_dir.display(),
        multilingual = options.multilingual,
        "wrote docsify site"
    );
    Ok(())
}

/// One set of pages with its sidebar and README, at the site root or under a
/// language directory.
struct LanguageTree<'a> {
    root: Option<&'static str>,
    language: &'a Language,
}

impl LanguageTree<'_> {
    /// Prefix that makes a path under this tree relative to the site root.
    fn href_prefix(&self) -> String {
        self.root.map(|root| format!("{root}/")).unwrap_or_default()
    }

    fn write(
        &self,
        out_dir: &Path,
        info: &SiteInfo,
        pages: &[PageRecord],
        navigation_tree: &NavigationTree,
    ) -> anyhow::Result<()> {
        let tree_dir = match self.root {
            Some(root) => out_dir.join(root),
            None => out_dir.to_path_buf(),
        };
        let pages_rel = info.pages_dir();
        let pages_dir = tree_dir.join(&pages_rel);
        std::fs::create_dir_all(&pages_dir)
            .with_context(|| format!("create pages dir: {}", pages_dir.display()))?;

        for page in pages {
            let path = pages_dir.join(format!("{}.md", page.slug));
            let content = rewrite_sources(&page.content, &info.repo);
            std::fs::write(&path, content)
                .with_context(|| format!("write page: {}", path.display()))?;
            tracing::debug!(title = %page.title, path = %path.display(), "wrote page");
        }

        let prefix = self.href_prefix();
        let links_rel = format!("{prefix}{pages_rel}");
        let sidebar = render_sidebar(
            navigation_tree,
            &format!("{prefix}README.md"),
            &links_rel,
            self.language,
        );
        write_file(&tree_dir.join("_sidebar.md"), &sidebar)?;
        write_file(
            &tree_dir.join("README.md"),
            &render_readme(info, pages, &links_rel, self.language),
        )?;
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn placeholder_page(info: &SiteInfo) -> PageRecord {
    let source = if info.url.is_empty() {
        String::new()
    } else {
        format!("\n\nSource: [{0}]({0})", info.url)
    };
    PageRecord {
        title: info.title.clone(),
        content: format!(
            "# {}\n\nNo pages could be extracted from this site.{source}\n",
            info.title
        ),
        slug: PLACEHOLDER_SLUG.to_owned(),
        original_filename: None,
        order: 0,
    }
}

/// Escapes brackets so a title cannot close the link text early.
fn link_text(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

/// Renders `_sidebar.md`: one block per group, sub-pages indented beneath
/// their heading, unnumbered pages last under the "Other Pages" label.
pub fn render_sidebar(
    tree: &NavigationTree,
    home_href: &str,
    pages_rel: &str,
    language: &Language,
) -> String {
    let link =
        |entry: &NavEntry| format!("[{}]({pages_rel}/{}.md)", link_text(&entry.title), entry.slug);

    let mut md = String::new();
    md.push_str("<!-- _sidebar.md -->\n\n");
    md.push_str(&format!("* [{}]({home_href})\n", language.home));

    for group in &tree.groups {
        md.push('\n');
        match (&group.key, &group.heading) {
            (GroupKey::CatchAll, _) => md.push_str(&format!("* {}\n", language.other_pages)),
            (GroupKey::Section(_), Some(heading)) => {
                md.push_str(&format!("* {}\n", link(heading)));
            }
            (GroupKey::Section(major), None) => {
                md.push_str(&format!("* {}\n", (language.part)(*major)));
            }
        }
        for entry in &group.entries {
            md.push_str(&format!("  * {}\n", link(entry)));
        }
    }
    md
}

fn render_readme(
    info: &SiteInfo,
    pages: &[PageRecord],
    pages_rel: &str,
    language: &Language,
) -> String {
    let mut sorted = pages.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.title.cmp(&b.title));

    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", info.display_name()));
    if info.title != info.display_name() {
        md.push_str(&format!("> {}\n\n", info.title));
    }

    md.push_str(&format!("## {}\n\n", language.pages_heading));
    md.push_str(&format!("{}\n\n", (language.page_count)(pages.len())));
    for page in sorted {
        md.push_str(&format!(
            "- [{}]({pages_rel}/{}.md)\n",
            link_text(&page.title),
            page.slug
        ));
    }

    let mut links = Vec::new();
    if !info.url.is_empty() {
        links.push(format!("- {}: [{1}]({1})", language.source_site, info.url));
    }
    if let Some(repo_url) = &info.repo.repo_url {
        links.push(format!("- {}: [{repo_url}]({repo_url})", language.repository));
    }
    if !links.is_empty() {
        md.push_str(&format!("\n## {}\n\n", language.links_heading));
        md.push_str(&links.join("\n"));
        md.push('\n');
    }

    md.push_str(&format!("\n## {}\n\n", language.preview_heading));
    md.push_str("```bash\nnpx docsify serve .\n```\n");
    md.push_str(&format!(
        "\n---\n\n*{} {}*\n",
        language.generated,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md
}

/// Root sidebar of a multilingual site: one link per language directory.
fn render_language_sidebar() -> String {
    let mut md = String::from("<!-- _sidebar.md -->\n\n");
    for language in LANGUAGES {
        md.push_str(&format!("* [{}]({}/)\n", language.name, language.code));
    }
    md
}

/// Root README of a multilingual site.
fn render_language_selection(info: &SiteInfo) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", info.display_name()));
    md.push_str("> 多语言文档站点 / Multilingual documentation site\n\n");
    md.push_str("## 语言选择 / Language Selection\n\n");
    for language in LANGUAGES {
        md.push_str(&format!("- [{}]({}/)\n", language.name, language.code));
    }

    md.push_str("\n## 项目信息 / Project Information\n\n");
    if !info.url.is_empty() {
        md.push_str(&format!("- 原始页面 / Source site: [{0}]({0})\n", info.url));
    }
    if let Some(repo_url) = &info.repo.repo_url {
        md.push_str(&format!("- 源码仓库 / Repository: [{repo_url}]({repo_url})\n"));
    }
    md.push_str(&format!(
        "\n---\n\n*Generated by wikidocify at {}*\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md
}

fn render_index_html(site_name: &str) -> String {
    let html_name = escape_html(site_name);
    let js_name = site_name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{html_name}</title>
  <meta http-equiv="X-UA-Compatible" content="IE=edge,chrome=1" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0, minimum-scale=1.0">
  <link rel="stylesheet" href="//unpkg.com/docsify@4/lib/themes/vue.css">
  <style>
    .sidebar {{ padding-top: 6px; }}
    .markdown-section {{ max-width: 800px; }}
  </style>
</head>
<body>
  <div id="app">Loading...</div>
  <script>
    window.$docsify = {{
      name: '{js_name}',
      homepage: 'README.md',
      loadSidebar: true,
      autoHeader: true,
      subMaxLevel: 3,
      maxLevel: 4,
      search: {{ paths: 'auto', placeholder: 'Search', depth: 6 }},
      pagination: {{ crossChapter: true, crossChapterText: true }},
      mermaid: {{ theme: 'default' }}
    }}
  </script>
  <script src="//unpkg.com/docsify@4"></script>
  <script src="//unpkg.com/mermaid@9/dist/mermaid.min.js"></script>
  <script>mermaid.initialize({{ theme: 'default', startOnLoad: false }});</script>
  <script src="//unpkg.com/docsify-mermaid@1/dist/docsify-mermaid.js"></script>
  <script src="//unpkg.com/docsify/lib/plugins/search.min.js"></script>
  <script src="//unpkg.com/docsify/lib/plugins/zoom-image.min.js"></script>
  <script src="//unpkg.com/docsify-copy-code@2"></script>
  <script src="//unpkg.com/docsify-pagination@2/dist/docsify-pagination.min.js"></script>
</body>
</html>
"#
    )
}

fn render_multilingual_index_html(site_name: &str) -> String {
    let html_name = escape_html(site_name);
    let js_name = site_name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        r##"<!DOCTYPE html>
<html lang="zh-CN">
<head>
  <meta charset="UTF-8">
  <title>{html_name}</title>
  <meta http-equiv="X-UA-Compatible" content="IE=edge,chrome=1" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0, minimum-scale=1.0">
  <link rel="stylesheet" href="//unpkg.com/docsify@4/lib/themes/vue.css">
  <style>
    .sidebar {{ padding-top: 6px; }}
    .markdown-section {{ max-width: 800px; }}
    .language-switch {{ position: fixed; top: 20px; right: 20px; z-index: 1000; }}
    .language-switch a {{ margin-left: 8px; color: var(--theme-color, #42b983); text-decoration: none; }}
  </style>
</head>
<body>
  <div id="app">Loading...</div>
  <nav class="language-switch">
    <a href="#/zh-cn/">中文</a>
    <a href="#/en/">English</a>
  </nav>
  <script>
    window.$docsify = {{
      name: '{js_name}',
      homepage: 'README.md',
      loadSidebar: true,
      autoHeader: true,
      subMaxLevel: 3,
      maxLevel: 4,
      alias: {{
        '/zh-cn/.*/_sidebar.md': '/zh-cn/_sidebar.md',
        '/en/.*/_sidebar.md': '/en/_sidebar.md'
      }},
      nameLink: {{
        '/zh-cn/': '#/zh-cn/',
        '/en/': '#/en/',
        '/': '#/'
      }},
      search: {{
        paths: 'auto',
        depth: 6,
        placeholder: {{ '/zh-cn/': '搜索文档...', '/en/': 'Search...', '/': 'Search...' }},
        noData: {{ '/zh-cn/': '没有找到结果', '/en/': 'No results found', '/': 'No results found' }}
      }},
      copyCode: {{
        buttonText: {{ '/zh-cn/': '复制代码', '/en/': 'Copy Code', '/': 'Copy Code' }},
        errorText: {{ '/zh-cn/': '复制失败', '/en/': 'Copy failed', '/': 'Copy failed' }},
        successText: {{ '/zh-cn/': '已复制到剪贴板', '/en/': 'Copied', '/': 'Copied' }}
      }},
      pagination: {{
        previousText: {{ '/zh-cn/': '上一页', '/en/': 'Previous', '/': 'Previous' }},
        nextText: {{ '/zh-cn/': '下一页', '/en/': 'Next', '/': 'Next' }},
        crossChapter: true,
        crossChapterText: true
      }},
      mermaid: {{ theme: 'default' }}
    }}
  </script>
  <script src="//unpkg.com/docsify@4"></script>
  <script src="//unpkg.com/mermaid@9/dist/mermaid.min.js"></script>
  <script>mermaid.initialize({{ theme: 'default', startOnLoad: false }});</script>
  <script src="//unpkg.com/docsify-mermaid@1/dist/docsify-mermaid.js"></script>
  <script src="//unpkg.com/docsify/lib/plugins/search.min.js"></script>
  <script src="//unpkg.com/docsify/lib/plugins/zoom-image.min.js"></script>
  <script src="//unpkg.com/docsify-copy-code@2"></script>
  <script src="//unpkg.com/docsify-pagination@2/dist/docsify-pagination.min.js"></script>
</body>
</html>
"##
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
