//! Router synthesizer.
//!
//! Builds a hub config that points an assistant at the right sub-skill. The
//! router owns no content: classification happens downstream, in whatever
//! consumes the `routes` table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use skillseeker_shared::{
    OrderedMap, Result, RouterConfig, SkillSeekerError, SourceConfig, UrlPatterns,
    load_source_config, validate_config_name, write_config_document,
};

/// Bound on each sub-skill summary in the `routes` table.
pub const SUMMARY_MAX_CHARS: usize = 80;

/// Name used when the sub-configs share no meaningful prefix.
pub const FALLBACK_ROUTER_NAME: &str = "router";

const MIN_DERIVED_NAME_LEN: usize = 3;
const HUB_SUFFIX: &str = "hub";

/// Build a router over `sub_configs`, in input order.
///
/// With no `router_name`, the name is derived from the sub-config names'
/// shared leading segments. A name that collides with a sub-config is
/// suffixed `-hub`, `-hub-2`, ... until unique.
#[instrument(skip_all, fields(count = sub_configs.len()))]
pub fn synthesize(sub_configs: &[SourceConfig], router_name: Option<&str>) -> Result<RouterConfig> {
    let Some(first) = sub_configs.first() else {
        return Err(SkillSeekerError::empty_input(
            "cannot build a router from zero sub-configs",
        ));
    };

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, cfg) in sub_configs.iter().enumerate() {
        if let Some(prev) = seen.insert(cfg.name.as_str(), index) {
            return Err(SkillSeekerError::name_collision(
                cfg.name.clone(),
                format!("sub-config #{}", prev + 1),
                format!("sub-config #{}", index + 1),
            ));
        }
    }

    let base_name = match router_name {
        Some(name) => {
            if !validate_config_name(name) {
                return Err(SkillSeekerError::config(format!(
                    "invalid router name '{name}': use only letters, numbers, hyphens, underscores"
                )));
            }
            name.to_string()
        }
        None => derive_router_name(sub_configs),
    };

    let name = unique_name(&base_name, |candidate| seen.contains_key(candidate));
    if name != base_name {
        warn!(
            requested = %base_name,
            resolved = %name,
            "router name collides with a sub-config; suffixed"
        );
    }

    let topics: Vec<String> = sub_configs.iter().map(topic).collect();
    let routes: OrderedMap<String> = sub_configs
        .iter()
        .map(|cfg| (cfg.name.clone(), route_summary(cfg)))
        .collect();

    debug!(%name, routes = routes.len(), "synthesized router");

    Ok(RouterConfig {
        source: SourceConfig {
            name,
            description: format!(
                "Routes queries about {} to the matching specialized skill.",
                topics.join(", ")
            ),
            base_url: first.base_url.clone(),
            selectors: first.selectors.clone(),
            url_patterns: UrlPatterns::default(),
            categories: OrderedMap::new(),
            rate_limit: first.rate_limit,
            max_pages: first.max_pages,
            extra: serde_json::Map::new(),
        },
        is_router: true,
        routes,
    })
}

/// Load the configs at `config_paths`, synthesize a router, and write it to
/// `<output_dir>/<router>.json`.
///
/// Missing paths are skipped with a warning, as are documents that are
/// themselves routers. Fails with an empty-input error when nothing usable
/// remains.
#[instrument(skip_all, fields(paths = config_paths.len(), dir = %output_dir.display()))]
pub fn generate_router(
    config_paths: &[PathBuf],
    router_name: Option<&str>,
    output_dir: &Path,
) -> Result<(RouterConfig, PathBuf)> {
    let mut configs = Vec::with_capacity(config_paths.len());
    for path in config_paths {
        if !path.exists() {
            warn!(path = %path.display(), "config not found, skipping");
            continue;
        }
        let cfg = load_source_config(path)?;
        if cfg.is_router() {
            warn!(path = %path.display(), "config is already a router, skipping");
            continue;
        }
        configs.push(cfg);
    }

    if configs.is_empty() {
        return Err(SkillSeekerError::empty_input(
            "no valid sub-configs to build a router from",
        ));
    }

    let router = synthesize(&configs, router_name)?;
    let path = output_dir.join(format!("{}.json", router.name()));
    write_config_document(&path, &router)?;

    info!(name = %router.name(), path = %path.display(), "router written");
    Ok((router, path))
}

/// Longest common prefix of the sub-config names with trailing hyphens
/// trimmed, or [`FALLBACK_ROUTER_NAME`] when that is under three characters.
pub fn derive_router_name(sub_configs: &[SourceConfig]) -> String {
    let mut names = sub_configs.iter().map(|cfg| cfg.name.as_str());
    let Some(first) = names.next() else {
        return FALLBACK_ROUTER_NAME.to_string();
    };

    let mut prefix_len = first.len();
    for name in names {
        prefix_len = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, c), _)| i + c.len_utf8())
            .min(prefix_len);
    }

    let candidate = first[..prefix_len].trim_end_matches('-');
    if candidate.chars().count() < MIN_DERIVED_NAME_LEN {
        FALLBACK_ROUTER_NAME.to_string()
    } else {
        candidate.to_string()
    }
}

fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let hub = format!("{base}-{HUB_SUFFIX}");
    if !taken(&hub) {
        return hub;
    }
    (2..)
        .map(|n| format!("{hub}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(hub)
}

/// Truncate to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

fn topic(cfg: &SourceConfig) -> String {
    let desc = truncate(&cfg.description, SUMMARY_MAX_CHARS);
    let desc = desc.trim_end_matches('.');
    if desc.is_empty() {
        cfg.name.clone()
    } else {
        desc.to_string()
    }
}

fn route_summary(cfg: &SourceConfig) -> String {
    let mut summary = truncate(&cfg.description, SUMMARY_MAX_CHARS);
    if summary.is_empty() {
        summary = cfg.name.clone();
    }
    if !cfg.categories.is_empty() {
        summary.push_str(&format!(" [categories: {}]", cfg.category_names().join(", ")));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillseeker_shared::parse_source_config;

    fn sub(name: &str, description: &str, categories: &str) -> SourceConfig {
        parse_source_config(&format!(
            r#"{{"name": "{name}", "description": "{description}", "base_url": "https://{name}.dev/", "max_pages": 200, "categories": {categories}}}"#
        ))
        .expect("valid config")
    }

    #[test]
    fn derives_common_prefix_name() {
        let subs = vec![
            sub("react-hooks", "", "{}"),
            sub("react-router", "", "{}"),
            sub("react-state", "", "{}"),
        ];
        let router = synthesize(&subs, None).unwrap();
        assert_eq!(router.name(), "react");
        assert!(router.is_router);
    }

    #[test]
    fn prefix_is_character_level() {
        let subs = vec![sub("vue-core", "", "{}"), sub("vuex-store", "", "{}")];
        assert_eq!(derive_router_name(&subs), "vue");

        let subs = vec![sub("reactjs-a", "", "{}"), sub("reactnative-b", "", "{}")];
        assert_eq!(derive_router_name(&subs), "react");

        let subs = vec![sub("docs-api", "", "{}"), sub("docs-apps", "", "{}")];
        assert_eq!(derive_router_name(&subs), "docs-ap");
    }

    #[test]
    fn short_or_missing_prefix_falls_back() {
        let subs = vec![sub("vue-core", "", "{}"), sub("svelte-kit", "", "{}")];
        assert_eq!(derive_router_name(&subs), FALLBACK_ROUTER_NAME);

        let subs = vec![sub("go-a", "", "{}"), sub("go-b", "", "{}")];
        assert_eq!(derive_router_name(&subs), FALLBACK_ROUTER_NAME);
    }

    #[test]
    fn self_reference_is_suffixed() {
        // A lone sub-config's prefix is its own name.
        let subs = vec![sub("godot", "", "{}")];
        assert_eq!(synthesize(&subs, None).unwrap().name(), "godot-hub");

        let subs = vec![
            sub("docs", "", "{}"),
            sub("docs-hub", "", "{}"),
            sub("docs-hub-2", "", "{}"),
        ];
        assert_eq!(synthesize(&subs, Some("docs")).unwrap().name(), "docs-hub-3");
    }

    #[test]
    fn routes_cover_every_sub_config_in_order() {
        let subs = vec![
            sub("docs-guides", "Step-by-step guides.", r#"{"guides": ["guide"]}"#),
            sub("docs-api", "API reference", r#"{"api": ["api"], "types": ["type"]}"#),
        ];
        let router = synthesize(&subs, Some("docs")).unwrap();

        let keys: Vec<&str> = router.routes.keys().collect();
        assert_eq!(keys, vec!["docs-guides", "docs-api"]);
        assert_eq!(
            router.routes.get("docs-api").map(String::as_str),
            Some("API reference [categories: api, types]")
        );
        assert_eq!(
            router.source.description,
            "Routes queries about Step-by-step guides, API reference to the matching specialized skill."
        );
    }

    #[test]
    fn router_owns_no_content() {
        let subs = vec![
            sub("docs-api", "API", r#"{"api": ["api"]}"#),
            sub("docs-guides", "Guides", r#"{"guides": ["guide"]}"#),
        ];
        let router = synthesize(&subs, None).unwrap();
        assert!(router.source.categories.is_empty());
        assert_eq!(router.source.base_url, subs[0].base_url);
        assert!(router.source.url_patterns.include.is_empty());
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "word ".repeat(40);
        let subs = vec![sub("docs-long", long.trim(), "{}")];
        let router = synthesize(&subs, Some("docs")).unwrap();
        let summary = router.routes.get("docs-long").unwrap();
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = synthesize(&[], None).unwrap_err();
        assert!(matches!(err, SkillSeekerError::EmptyInput { .. }));
    }

    #[test]
    fn duplicate_sub_configs_are_rejected() {
        let subs = vec![sub("docs-api", "", "{}"), sub("docs-api", "", "{}")];
        let err = synthesize(&subs, None).unwrap_err();
        assert!(matches!(err, SkillSeekerError::NameCollision { .. }));
    }

    #[test]
    fn invalid_explicit_name_is_rejected() {
        let subs = vec![sub("docs-api", "", "{}")];
        assert!(synthesize(&subs, Some("my router")).is_err());
    }

    #[test]
    fn generate_router_skips_missing_paths() {
        let tmp = std::env::temp_dir().join(format!("ss-router-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&tmp).unwrap();

        let a = tmp.join("react-hooks.json");
        let b = tmp.join("react-state.json");
        write_config_document(&a, &sub("react-hooks", "Hooks", "{}")).unwrap();
        write_config_document(&b, &sub("react-state", "State", "{}")).unwrap();

        let paths = vec![a, tmp.join("missing.json"), b];
        let (router, path) = generate_router(&paths, None, &tmp).unwrap();

        assert_eq!(router.name(), "react");
        assert_eq!(path, tmp.join("react.json"));
        let written: RouterConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, router);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn generate_router_needs_at_least_one_config() {
        let tmp = std::env::temp_dir().join(format!("ss-router-test-{}", uuid::Uuid::now_v7()));
        let err = generate_router(&[tmp.join("nope.json")], None, &tmp).unwrap_err();
        assert!(matches!(err, SkillSeekerError::EmptyInput { .. }));
    }
}
