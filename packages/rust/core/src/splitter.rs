//! Config splitter.
//!
//! Partitions one large source config into focused sub-configs, and adds a
//! router config when more than one sub-skill comes out of it. A split is a
//! pure function of its inputs; nothing touches the filesystem until
//! [`save_configs`] is called, so a dry run and a real run see the same plan.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use skillseeker_shared::{
    OrderedMap, Result, RouterConfig, SkillSeekerError, SourceConfig, UrlPatterns,
    to_pretty_json,
};

use crate::estimate::{CategoryEstimate, estimate_category_pages, round_up_to_ten};
use crate::router;

/// `auto` picks `category` only when every category estimate is at least
/// `target / AUTO_BAND_LOWER_DIVISOR` pages...
const AUTO_BAND_LOWER_DIVISOR: u64 = 10;
/// ...and at most `target * 3 / 2` pages.
const AUTO_BAND_UPPER_NUM: u64 = 3;
const AUTO_BAND_UPPER_DEN: u64 = 2;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How to partition a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Pass the config through unchanged.
    None,
    /// One sub-config per declared category.
    Category,
    /// Pack categories into groups of roughly `target_pages`.
    Size,
    /// Category split that always emits a router.
    Router,
    /// Choose between `none`, `category`, and `size` from the estimates.
    Auto,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Auto,
        Strategy::None,
        Strategy::Category,
        Strategy::Router,
        Strategy::Size,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Category => "category",
            Self::Size => "size",
            Self::Router => "router",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SkillSeekerError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                SkillSeekerError::config(format!(
                    "unknown strategy '{s}': expected one of auto, none, category, router, size"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// SplitPlan
// ---------------------------------------------------------------------------

/// The outcome of a split: sub-configs in order, plus an optional router.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    /// Strategy the caller asked for.
    pub requested: Strategy,
    /// Strategy actually applied (differs from `requested` only for `auto`).
    pub resolved: Strategy,
    pub configs: Vec<SourceConfig>,
    pub router: Option<RouterConfig>,
}

/// One file a plan materializes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDocument {
    pub name: String,
    pub file_name: String,
    pub json: String,
    pub is_router: bool,
}

impl SplitPlan {
    /// Total number of documents, router included.
    pub fn len(&self) -> usize {
        self.configs.len() + usize::from(self.router.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every name the plan will write, sub-configs first.
    pub fn names(&self) -> Vec<&str> {
        self.configs
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.router.as_ref().map(|r| r.name()))
            .collect()
    }

    /// Render each element exactly as [`save_configs`] writes it.
    pub fn documents(&self) -> Result<Vec<PlanDocument>> {
        let mut docs = Vec::with_capacity(self.len());
        for cfg in &self.configs {
            docs.push(PlanDocument {
                name: cfg.name.clone(),
                file_name: format!("{}.json", cfg.name),
                json: to_pretty_json(cfg)?,
                is_router: false,
            });
        }
        if let Some(router) = &self.router {
            docs.push(PlanDocument {
                name: router.name().to_string(),
                file_name: format!("{}.json", router.name()),
                json: to_pretty_json(router)?,
                is_router: true,
            });
        }
        Ok(docs)
    }

    /// SHA-256 over the rendered documents; equal plans have equal fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        for doc in self.documents()? {
            hasher.update(doc.file_name.as_bytes());
            hasher.update(b"\n");
            hasher.update(doc.json.as_bytes());
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// A set of categories (or a slice of one) that becomes one sub-config.
#[derive(Debug)]
struct Group<'a> {
    members: Vec<&'a CategoryEstimate>,
    pages: u32,
    /// `(index, count)` when an oversized category was cut into parts.
    part: Option<(usize, usize)>,
    /// The keyword slice a part covers; `None` means every member's full list.
    keywords: Option<&'a [String]>,
}

impl<'a> Group<'a> {
    fn empty() -> Self {
        Self {
            members: Vec::new(),
            pages: 0,
            part: None,
            keywords: None,
        }
    }

    fn single(est: &'a CategoryEstimate) -> Self {
        Self {
            members: vec![est],
            pages: est.pages,
            part: None,
            keywords: None,
        }
    }

    fn keywords_of<'s>(&'s self, est: &'s CategoryEstimate) -> &'s [String] {
        match self.keywords {
            Some(slice) => slice,
            None => &est.keywords,
        }
    }
}

/// Partition `config` according to `strategy`.
///
/// Fails with a config error for an unusable `target_pages` or category
/// name, and with a name collision when two groups would derive the same
/// sub-config name.
#[instrument(skip_all, fields(name = %config.name, strategy = %strategy, target_pages = target_pages))]
pub fn split(config: &SourceConfig, strategy: Strategy, target_pages: u32) -> Result<SplitPlan> {
    if target_pages == 0 {
        return Err(SkillSeekerError::config("target_pages must be positive"));
    }

    let estimates = estimate_category_pages(config);
    let resolved = match strategy {
        Strategy::Auto => resolve_auto(config, &estimates, target_pages),
        other => other,
    };

    debug!(%resolved, categories = estimates.len(), "resolved split strategy");

    let groups: Vec<Group<'_>> = match resolved {
        Strategy::None => {
            return Ok(SplitPlan {
                requested: strategy,
                resolved,
                configs: vec![config.clone()],
                router: None,
            });
        }
        Strategy::Category | Strategy::Router => {
            if config.categories.is_empty() {
                return Err(SkillSeekerError::config(format!(
                    "config '{}' declares no categories; use strategy 'size' or 'none'",
                    config.name
                )));
            }
            estimates.iter().map(Group::single).collect()
        }
        Strategy::Size => group_by_size(&estimates, target_pages),
        Strategy::Auto => unreachable!("auto is resolved above"),
    };

    // A size split that yields one group has nothing to split.
    if resolved == Strategy::Size && groups.len() == 1 {
        info!("size split produced a single group; passing through");
        return Ok(SplitPlan {
            requested: strategy,
            resolved,
            configs: vec![config.clone()],
            router: None,
        });
    }

    let configs = build_sub_configs(config, &groups)?;

    let router = if resolved == Strategy::Router || configs.len() >= 2 {
        Some(router::synthesize(&configs, Some(&config.name))?)
    } else {
        None
    };

    info!(
        groups = configs.len(),
        router = router.is_some(),
        "split plan ready"
    );

    Ok(SplitPlan {
        requested: strategy,
        resolved,
        configs,
        router,
    })
}

/// Write every plan document to `<configs_dir>/<name>.json`, in plan order.
///
/// Existing files are overwritten. Writes are not transactional: on error the
/// files written so far stay on disk, and the returned list is only complete
/// on success.
#[instrument(skip_all, fields(dir = %configs_dir.display(), count = plan.len()))]
pub fn save_configs(plan: &SplitPlan, configs_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(configs_dir).map_err(|e| SkillSeekerError::io(configs_dir, e))?;

    let mut written = Vec::with_capacity(plan.len());
    for doc in plan.documents()? {
        let path = configs_dir.join(&doc.file_name);
        std::fs::write(&path, &doc.json).map_err(|e| SkillSeekerError::io(&path, e))?;
        debug!(path = %path.display(), router = doc.is_router, "wrote config");
        written.push(path);
    }

    info!(count = written.len(), "saved split configs");
    Ok(written)
}

/// Lower-case, collapse each run of non-alphanumerics to one hyphen, trim hyphens.
pub fn slugify(name: &str) -> String {
    static NON_ALNUM: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));
    NON_ALNUM
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_auto(config: &SourceConfig, estimates: &[CategoryEstimate], target: u32) -> Strategy {
    let target = u64::from(target);

    if u64::from(config.max_pages) <= target {
        return Strategy::None;
    }

    let lower = target / AUTO_BAND_LOWER_DIVISOR;
    let upper = target * AUTO_BAND_UPPER_NUM / AUTO_BAND_UPPER_DEN;
    let in_band = estimates
        .iter()
        .all(|e| (lower..=upper).contains(&u64::from(e.pages)));

    if !config.categories.is_empty() && in_band {
        Strategy::Category
    } else {
        Strategy::Size
    }
}

/// Greedy packing in declaration order. A group is closed before the
/// category that would push it past `target`.
///
/// A category larger than `target` on its own is cut along its keyword list,
/// so every part keeps a disjoint crawl scope. It gets at most one part per
/// keyword; a category with one keyword or none cannot be cut and stays a
/// single oversized group.
fn group_by_size(estimates: &[CategoryEstimate], target: u32) -> Vec<Group<'_>> {
    let mut groups = Vec::new();
    let mut current = Group::empty();

    for est in estimates {
        if est.pages > target {
            if !current.members.is_empty() {
                groups.push(std::mem::replace(&mut current, Group::empty()));
            }
            groups.extend(cut_category(est, target));
            continue;
        }

        if !current.members.is_empty() && current.pages + est.pages > target {
            groups.push(std::mem::replace(&mut current, Group::empty()));
        }
        current.pages += est.pages;
        current.members.push(est);
    }

    if !current.members.is_empty() {
        groups.push(current);
    }
    groups
}

/// Split one oversized category into keyword-disjoint parts of near-equal pages.
fn cut_category(est: &CategoryEstimate, target: u32) -> Vec<Group<'_>> {
    let wanted = est.pages.div_ceil(target) as usize;
    let parts = wanted.min(est.keywords.len());
    if parts < 2 {
        warn!(
            category = %est.name,
            pages = est.pages,
            target_pages = target,
            "category cannot be cut further; keeping it as one oversized group"
        );
        return vec![Group::single(est)];
    }

    let parts_u32 = parts as u32;
    let base_pages = est.pages / parts_u32;
    let extra_pages = est.pages % parts_u32;
    let base_len = est.keywords.len() / parts;
    let extra_len = est.keywords.len() % parts;

    let mut groups = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base_len + usize::from(i < extra_len);
        groups.push(Group {
            members: vec![est],
            pages: base_pages + u32::from((i as u32) < extra_pages),
            part: Some((i + 1, parts)),
            keywords: Some(&est.keywords[start..start + len]),
        });
        start += len;
    }
    groups
}

fn build_sub_configs(parent: &SourceConfig, groups: &[Group<'_>]) -> Result<Vec<SourceConfig>> {
    // name -> human description of what produced it, for collision reports
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut configs = Vec::with_capacity(groups.len());

    for group in groups {
        let mut slugs = Vec::with_capacity(group.members.len());
        for est in &group.members {
            let slug = slugify(&est.name);
            if slug.is_empty() {
                return Err(SkillSeekerError::config(format!(
                    "category '{}' in config '{}' has no letters or digits to name a sub-config",
                    est.name, parent.name
                )));
            }
            slugs.push(slug);
        }

        let mut name = format!("{}-{}", parent.name, slugs.join("-"));
        if let Some((index, _)) = group.part {
            name.push_str(&format!("-{index}"));
        }

        let origin = describe_origin(group);
        if let Some(first) = seen.get(&name) {
            return Err(SkillSeekerError::name_collision(name, first.clone(), origin));
        }
        seen.insert(name.clone(), origin);

        configs.push(sub_config(parent, group, name));
    }

    Ok(configs)
}

fn sub_config(parent: &SourceConfig, group: &Group<'_>, name: String) -> SourceConfig {
    let categories: OrderedMap<Vec<String>> = group
        .members
        .iter()
        .filter(|est| !est.synthetic)
        .map(|est| (est.name.clone(), group.keywords_of(est).to_vec()))
        .collect();

    let include = if parent.url_patterns.include.is_empty() {
        crawl_boundaries(group)
    } else {
        // Inherited unfiltered: sub-skill scope comes from categories, not URLs.
        parent.url_patterns.include.clone()
    };

    SourceConfig {
        name,
        description: sub_description(parent, group),
        base_url: parent.base_url.clone(),
        selectors: parent.selectors.clone(),
        url_patterns: UrlPatterns {
            include,
            exclude: parent.url_patterns.exclude.clone(),
        },
        categories,
        rate_limit: parent.rate_limit,
        max_pages: round_up_to_ten(group.pages),
        extra: parent.extra.clone(),
    }
}

/// One include pattern per category: its first keyword, or its slug. A
/// part of a cut category includes every keyword in its slice.
fn crawl_boundaries(group: &Group<'_>) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();
    for est in group.members.iter().filter(|est| !est.synthetic) {
        let candidates = match group.keywords {
            Some(slice) => slice.to_vec(),
            None => vec![
                est.keywords
                    .first()
                    .cloned()
                    .unwrap_or_else(|| slugify(&est.name)),
            ],
        };
        for pattern in candidates {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}

fn sub_description(parent: &SourceConfig, group: &Group<'_>) -> String {
    let mut scope = group
        .members
        .iter()
        .map(|est| est.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if let Some((index, count)) = group.part {
        scope.push_str(&format!(", part {index} of {count}"));
    }

    let base = parent.description.trim();
    if base.is_empty() {
        format!("{} documentation ({scope})", parent.name)
    } else {
        format!("{base} ({scope})")
    }
}

fn describe_origin(group: &Group<'_>) -> String {
    let names: Vec<String> = group
        .members
        .iter()
        .map(|est| format!("'{}'", est.name))
        .collect();
    let label = if names.len() == 1 { "category" } else { "categories" };
    match group.part {
        Some((index, count)) => format!("{label} {} (part {index} of {count})", names.join(", ")),
        None => format!("{label} {}", names.join(", ")),
    }
}
