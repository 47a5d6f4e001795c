//! Per-category page estimation.
//!
//! Without a live crawl count, the config's `max_pages` budget is shared out
//! across categories in proportion to keyword-list length. This is a
//! heuristic for sizing sub-skills and is not expected to match what the
//! crawler actually finds.

use skillseeker_shared::SourceConfig;

/// Name of the synthetic group that holds pages of an uncategorized config.
pub const GENERAL_CATEGORY: &str = "general";

/// Estimated share of the page budget for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEstimate {
    pub name: String,
    pub keywords: Vec<String>,
    pub pages: u32,
    /// True for the `general` group invented for configs with no categories.
    pub synthetic: bool,
}

/// Apportion `config.max_pages` across its categories.
///
/// Weights are keyword counts (a keyword-less category weighs 1). Uses
/// largest-remainder rounding so the estimates always sum to `max_pages`;
/// remainder ties go to the earlier-declared category. A config with no
/// categories yields one synthetic [`GENERAL_CATEGORY`] holding everything.
pub fn estimate_category_pages(config: &SourceConfig) -> Vec<CategoryEstimate> {
    let total = u64::from(config.max_pages);

    if config.categories.is_empty() {
        return vec![CategoryEstimate {
            name: GENERAL_CATEGORY.to_string(),
            keywords: Vec::new(),
            pages: config.max_pages,
            synthetic: true,
        }];
    }

    let weights: Vec<u64> = config
        .categories
        .iter()
        .map(|(_, keywords)| keywords.len().max(1) as u64)
        .collect();
    let weight_sum: u64 = weights.iter().sum();

    let mut shares: Vec<u64> = weights.iter().map(|w| total * w / weight_sum).collect();
    let assigned: u64 = shares.iter().sum();
    let mut leftover = total - assigned;

    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = total * weights[a] % weight_sum;
        let rb = total * weights[b] % weight_sum;
        rb.cmp(&ra).then(a.cmp(&b))
    });
    for idx in by_remainder {
        if leftover == 0 {
            break;
        }
        shares[idx] += 1;
        leftover -= 1;
    }

    config
        .categories
        .iter()
        .zip(shares)
        .map(|((name, keywords), pages)| CategoryEstimate {
            name: name.to_string(),
            keywords: keywords.clone(),
            // Each share is bounded by `total`, which came from a u32.
            pages: pages as u32,
            synthetic: false,
        })
        .collect()
}

/// Round a page count up to the next multiple of 10, never below 10.
pub fn round_up_to_ten(pages: u32) -> u32 {
    let rounded = pages.div_ceil(10).saturating_mul(10);
    rounded.max(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillseeker_shared::parse_source_config;

    fn config(max_pages: u32, categories: &str) -> SourceConfig {
        parse_source_config(&format!(
            r#"{{"name": "docs", "base_url": "https://docs.example.com/", "max_pages": {max_pages}, "categories": {categories}}}"#
        ))
        .expect("valid config")
    }

    #[test]
    fn weights_follow_keyword_counts() {
        let cfg = config(300, r#"{"api": ["k1", "k2"], "guides": ["k1"]}"#);
        let est = estimate_category_pages(&cfg);
        assert_eq!(est.len(), 2);
        assert_eq!((est[0].name.as_str(), est[0].pages), ("api", 200));
        assert_eq!((est[1].name.as_str(), est[1].pages), ("guides", 100));
    }

    #[test]
    fn estimates_always_sum_to_budget() {
        let cases = [
            (100, r#"{"a": ["x"], "b": ["y"], "c": ["z"]}"#),
            (7, r#"{"a": ["x", "y", "z"], "b": [], "c": ["z"], "d": ["q", "r"]}"#),
            (1, r#"{"a": ["x"], "b": ["y"]}"#),
            (12345, r#"{"a": ["1", "2", "3", "4", "5"], "b": ["6"], "c": ["7", "8"]}"#),
        ];
        for (max_pages, cats) in cases {
            let est = estimate_category_pages(&config(max_pages, cats));
            let sum: u32 = est.iter().map(|e| e.pages).sum();
            assert_eq!(sum, max_pages, "budget {max_pages} with {cats}");
        }
    }

    #[test]
    fn remainder_ties_go_to_earlier_categories() {
        let est = estimate_category_pages(&config(100, r#"{"a": ["x"], "b": ["y"], "c": ["z"]}"#));
        let pages: Vec<u32> = est.iter().map(|e| e.pages).collect();
        assert_eq!(pages, vec![34, 33, 33]);
    }

    #[test]
    fn empty_keyword_list_counts_as_one() {
        let est = estimate_category_pages(&config(40, r#"{"a": [], "b": ["x", "y", "z"]}"#));
        assert_eq!(est[0].pages, 10);
        assert_eq!(est[1].pages, 30);
    }

    #[test]
    fn uncategorized_config_gets_general_group() {
        let est = estimate_category_pages(&config(250, "{}"));
        assert_eq!(est.len(), 1);
        assert_eq!(est[0].name, GENERAL_CATEGORY);
        assert_eq!(est[0].pages, 250);
        assert!(est[0].synthetic);
    }

    #[test]
    fn rounding_to_ten() {
        assert_eq!(round_up_to_ten(0), 10);
        assert_eq!(round_up_to_ten(1), 10);
        assert_eq!(round_up_to_ten(10), 10);
        assert_eq!(round_up_to_ten(11), 20);
        assert_eq!(round_up_to_ten(200), 200);
    }
}
